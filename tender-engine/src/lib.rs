//! # tender-engine
//!
//! Drives an order from "balance due" to "fully paid" across cash, gift
//! card, card-present and split tenders.
//!
//! - [`session`] - serializable session object, transition table and the
//!   [`TenderOrchestrator`] that owns them
//! - [`adapters`] - one adapter per tender method plus the split delegator
//! - [`refund`] - refund sub-flow with the cash drawer side effect
//! - [`config`] / [`logger`] - environment configuration and tracing setup

pub mod adapters;
pub mod config;
pub mod error;
pub mod logger;
pub mod reader;
pub mod refund;
pub mod session;
pub mod surcharge;

#[cfg(test)]
pub(crate) mod testing;

pub use adapters::{IntentHandle, IntentPhase, TerminalCharge};
pub use config::TenderConfig;
pub use error::{TenderError, TenderResult};
pub use reader::{CardReader, ReaderError};
pub use refund::RefundOutcome;
pub use session::{TenderEvent, TenderOrchestrator, TenderSession, TenderState};
