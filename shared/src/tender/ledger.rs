//! Request/response bodies for the tender endpoints

use super::types::Tender;
use crate::money::non_negative;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Authoritative ledger returned by every successful tender call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerUpdate {
    pub balance_due: Decimal,
    #[serde(default)]
    pub transactions: Vec<Tender>,
}

impl LedgerUpdate {
    /// Balance clamped at zero
    pub fn balance(&self) -> Decimal {
        non_negative(self.balance_due)
    }
}

/// Terminal payment intent handle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// Create a terminal intent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateIntentRequest {
    /// Base amount (amount due minus tip)
    pub amount: Decimal,
    pub tip: Decimal,
    pub surcharge: Decimal,
}

/// Capture a collected terminal intent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureIntentRequest {
    pub intent_id: String,
}

/// Post a cash tender
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashTenderRequest {
    pub amount: Decimal,
}

/// Post a gift card tender
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiftCardTenderRequest {
    pub code: String,
    pub amount: Decimal,
}

/// Remaining balance on a gift card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiftCardBalance {
    pub code: String,
    pub balance: Decimal,
}

/// Ask the backend for the surcharge on an amount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurchargeRequest {
    pub amount: Decimal,
}

/// Surcharge quote for an amount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SurchargeQuote {
    pub amount: Decimal,
    pub surcharge: Decimal,
}

/// Refund part of a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundRequest {
    pub transaction_id: String,
    pub amount: Decimal,
    pub reason: String,
}
