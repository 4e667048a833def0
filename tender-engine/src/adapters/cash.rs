use crate::{TenderError, TenderResult};
use rust_decimal::Decimal;
use shared::money::round_money;
use shared::tender::LedgerUpdate;
use std::sync::Arc;
use tender_client::TenderBackend;
use tracing::{info, instrument};

/// Posts CASH tenders
#[derive(Clone)]
pub struct CashAdapter {
    backend: Arc<dyn TenderBackend>,
}

impl CashAdapter {
    pub fn new(backend: Arc<dyn TenderBackend>) -> Self {
        Self { backend }
    }

    /// Charge `amount` in cash. `amount` is what the order is credited with,
    /// not what the customer handed over.
    #[instrument(skip(self), fields(order_id = %order_id, amount = %amount))]
    pub async fn process(&self, order_id: &str, amount: Decimal) -> TenderResult<LedgerUpdate> {
        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(TenderError::validation("Cash amount must be positive"));
        }

        let ledger = self.backend.process_cash(order_id, amount).await?;
        info!(balance_due = %ledger.balance_due, "Cash tender recorded");
        Ok(ledger)
    }
}
