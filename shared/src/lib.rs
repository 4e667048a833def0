//! Shared types for the tendering suite
//!
//! Common types used across the workspace crates: tender records and ledger
//! bodies exchanged with the payment backend, money helpers, and the unified
//! error system.

pub mod error;
pub mod money;
pub mod tender;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
pub use tender::{
    LedgerUpdate, OrderSnapshot, PaymentIntent, PaymentRecord, RefundRequest, Tender,
    TenderMethod, TenderStatus,
};
