use super::TenderState;
use crate::adapters::IntentHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::money::{is_settled, non_negative, round_money};
use shared::tender::{LedgerUpdate, OrderSnapshot, Tender, TenderMethod};
use tracing::warn;

/// Serializable tender session
///
/// Only [`TenderOrchestrator`](super::TenderOrchestrator) writes to it; the
/// shell may persist and restore it between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenderSession {
    pub order_id: String,
    pub grand_total: Decimal,
    /// Never negative, only decreases on a confirmed tender
    pub balance_due: Decimal,
    pub tip_amount: Decimal,
    /// Display-only, billed on the card intent
    pub surcharge_amount: Decimal,
    pub payment_method: Option<TenderMethod>,
    /// Non-zero only while a split slice is being paid
    pub partial_amount: Decimal,
    pub current_intent: Option<IntentHandle>,
    pub payment_history: Vec<Tender>,
    /// Change owed to the customer, summed over cash tenders
    pub change_due: Decimal,
    pub state: TenderState,
    pub error: Option<String>,
    pub split_active: bool,
    pub completion_fired: bool,
}

impl TenderSession {
    /// Fresh session for an order snapshot
    pub fn for_order(snapshot: &OrderSnapshot) -> Self {
        Self {
            order_id: snapshot.order_id.clone(),
            grand_total: round_money(snapshot.grand_total),
            balance_due: snapshot.balance_due(),
            payment_history: snapshot.transactions.clone(),
            ..Self::default()
        }
    }

    pub fn current_intent_id(&self) -> Option<&str> {
        self.current_intent.as_ref().map(|i| i.intent_id.as_str())
    }

    /// Amount the next tender settles: the split slice if one is set,
    /// otherwise the whole balance
    pub fn amount_due(&self) -> Decimal {
        if self.partial_amount > Decimal::ZERO {
            self.partial_amount
        } else {
            self.balance_due
        }
    }

    pub fn is_settled(&self) -> bool {
        is_settled(self.balance_due)
    }

    /// Whether the stored intent is collected and can only be captured
    pub fn can_retry_capture(&self) -> bool {
        self.current_intent
            .as_ref()
            .is_some_and(IntentHandle::is_collected)
    }

    /// Sum of `amount + tip` over successful tenders
    pub fn total_tendered(&self) -> Decimal {
        self.payment_history
            .iter()
            .filter(|t| t.is_successful())
            .map(Tender::settled_amount)
            .sum()
    }

    /// Adopt the backend's ledger.
    ///
    /// History is replaced wholesale so a retried capture can't double
    /// count. The balance only ever moves down.
    pub fn apply_ledger(&mut self, ledger: LedgerUpdate) {
        let reported = ledger.balance();
        if reported > self.balance_due {
            warn!(
                order_id = %self.order_id,
                %reported,
                current = %self.balance_due,
                "Backend reported a higher balance, keeping current"
            );
        }
        self.balance_due = non_negative(self.balance_due.min(reported));
        self.payment_history = ledger.transactions;
    }

    /// Clear per-attempt fields after a tender or a step back
    pub(crate) fn clear_attempt(&mut self) {
        self.partial_amount = Decimal::ZERO;
        self.surcharge_amount = Decimal::ZERO;
        self.payment_method = None;
    }
}
