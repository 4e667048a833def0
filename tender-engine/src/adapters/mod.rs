//! Tender adapters
//!
//! Each adapter runs one method's sub-protocol against the backend and
//! returns the authoritative ledger. Adapters hold no session state.

mod cash;
mod gift_card;
mod split;
mod terminal;

pub use cash::CashAdapter;
pub use gift_card::GiftCardAdapter;
pub use split::SplitDelegator;
pub use terminal::{IntentHandle, IntentPhase, TerminalAdapter, TerminalCharge, cancel_intent};
