//! Card surcharge lookup

use crate::TenderResult;
use rust_decimal::Decimal;
use shared::money::{non_negative, round_money};
use std::sync::Arc;
use tender_client::TenderBackend;
use tracing::debug;

/// Asks the backend for the surcharge of a card amount.
///
/// The result is display-only on the session and is billed on top of the
/// intent, never folded into the balance.
#[derive(Clone)]
pub struct SurchargeCalculator {
    backend: Arc<dyn TenderBackend>,
}

impl SurchargeCalculator {
    pub fn new(backend: Arc<dyn TenderBackend>) -> Self {
        Self { backend }
    }

    pub async fn calculate(&self, amount: Decimal) -> TenderResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let quote = self.backend.calculate_surcharge(round_money(amount)).await?;
        let surcharge = non_negative(quote.surcharge);
        debug!(%amount, %surcharge, "Surcharge quoted");
        Ok(surcharge)
    }
}
