use crate::{TenderError, TenderResult};
use rust_decimal::Decimal;
use shared::money::round_money;
use shared::tender::LedgerUpdate;
use std::sync::Arc;
use tender_client::TenderBackend;
use tracing::{info, instrument, warn};

/// Posts GIFT_CARD tenders after checking the card balance
#[derive(Clone)]
pub struct GiftCardAdapter {
    backend: Arc<dyn TenderBackend>,
}

impl GiftCardAdapter {
    pub fn new(backend: Arc<dyn TenderBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, code), fields(order_id = %order_id, amount = %amount))]
    pub async fn process(
        &self,
        order_id: &str,
        code: &str,
        amount: Decimal,
    ) -> TenderResult<LedgerUpdate> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TenderError::validation("Gift card code is required"));
        }
        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(TenderError::validation("Gift card amount must be positive"));
        }

        let card = self.backend.gift_card_balance(code).await?;
        if amount > card.balance {
            warn!(available = %card.balance, "Gift card balance too low");
            return Err(TenderError::GiftCardInsufficientBalance {
                requested: amount,
                available: card.balance,
            });
        }

        let ledger = self.backend.process_gift_card(order_id, code, amount).await?;
        info!(balance_due = %ledger.balance_due, "Gift card tender recorded");
        Ok(ledger)
    }
}
