//! Tender domain types
//!
//! - **types**: tenders, methods, statuses and order snapshots
//! - **ledger**: backend request/response bodies for the tender endpoints

pub mod ledger;
pub mod types;

pub use ledger::{
    CaptureIntentRequest, CashTenderRequest, CreateIntentRequest, GiftCardBalance,
    GiftCardTenderRequest, LedgerUpdate, PaymentIntent, RefundRequest, SurchargeQuote,
    SurchargeRequest,
};
pub use types::{OrderSnapshot, PaymentRecord, Tender, TenderMethod, TenderStatus};
