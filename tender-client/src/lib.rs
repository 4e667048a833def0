//! Tender Client - HTTP client for the payment backend
//!
//! Provides the [`TenderBackend`] operation contracts (intents, cash,
//! gift cards, surcharge, refunds) and their REST implementation.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;

pub use backend::{HttpTenderBackend, TenderBackend};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, NetworkHttpClient};

// Re-export shared types for convenience
pub use shared::tender::{
    GiftCardBalance, LedgerUpdate, PaymentIntent, PaymentRecord, RefundRequest, SurchargeQuote,
};
