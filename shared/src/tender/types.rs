//! Tender records and order snapshots

use crate::money::{non_negative, round_money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tender method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderMethod {
    Cash,
    Card,
    GiftCard,
}

impl TenderMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Card => "CARD",
            Self::GiftCard => "GIFT_CARD",
        }
    }
}

impl std::fmt::Display for TenderMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tender status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderStatus {
    #[default]
    Successful,
    Failed,
    Canceled,
    Refunded,
}

/// A single recorded payment against an order
///
/// Created by the backend and immutable afterwards, except for
/// `refunded_amount` and `status` which change through refunds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tender {
    /// Transaction ID (assigned by backend)
    pub id: String,
    pub method: TenderMethod,
    /// Amount applied to the order, excluding tip and surcharge
    pub amount: Decimal,
    #[serde(default)]
    pub tip: Decimal,
    /// Card surcharge billed on top (never part of the order balance)
    #[serde(default)]
    pub surcharge: Decimal,
    #[serde(default)]
    pub status: TenderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(default)]
    pub refunded_amount: Decimal,
    /// Creation time (Unix millis)
    #[serde(default)]
    pub created_at: i64,
}

impl Tender {
    /// Whether this tender counts towards the order
    pub fn is_successful(&self) -> bool {
        self.status == TenderStatus::Successful
    }

    /// Amount settled against the balance (amount + tip)
    pub fn settled_amount(&self) -> Decimal {
        round_money(self.amount + self.tip)
    }

    /// Amount still refundable on this tender
    pub fn refundable_amount(&self) -> Decimal {
        non_negative(self.amount - self.refunded_amount)
    }
}

/// Order snapshot handed to the tender session when tendering starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub grand_total: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    /// Existing transactions on the order
    #[serde(default)]
    pub transactions: Vec<Tender>,
}

impl OrderSnapshot {
    pub fn new(order_id: impl Into<String>, grand_total: Decimal) -> Self {
        Self {
            order_id: order_id.into(),
            grand_total,
            amount_paid: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }

    /// Remaining balance (`grand_total - amount_paid`, never negative)
    pub fn balance_due(&self) -> Decimal {
        non_negative(self.grand_total - self.amount_paid)
    }
}

/// Full payment record of an order, as returned by the refund endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub order_id: String,
    pub transactions: Vec<Tender>,
    #[serde(default)]
    pub refunded_total: Decimal,
}

impl PaymentRecord {
    /// Find a transaction by ID
    pub fn transaction(&self, transaction_id: &str) -> Option<&Tender> {
        self.transactions.iter().find(|t| t.id == transaction_id)
    }

    /// Number of successful (or partially refunded) tenders
    pub fn successful_tender_count(&self) -> usize {
        self.transactions
            .iter()
            .filter(|t| matches!(t.status, TenderStatus::Successful | TenderStatus::Refunded))
            .count()
    }
}
