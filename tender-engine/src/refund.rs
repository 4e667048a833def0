//! Refund sub-flow
//!
//! The requested amount is capped to what is still refundable on the
//! transaction before anything is sent. On success the payment record
//! returned by the backend replaces the caller's copy; on failure the
//! caller's copy is left untouched.
//!
//! A refund is paid out in cash when the original tender was cash or when
//! the payment was split across several tenders. Cash refunds open the
//! drawer once; a drawer failure does not fail the refund.

use crate::{TenderError, TenderResult};
use cash_drawer::CashDrawer;
use rust_decimal::Decimal;
use shared::money::round_money;
use shared::tender::{PaymentRecord, RefundRequest, TenderMethod};
use std::sync::Arc;
use tender_client::TenderBackend;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RefundOutcome {
    /// Amount actually refunded after capping
    pub refunded: Decimal,
    pub method: TenderMethod,
    pub drawer_opened: bool,
}

#[derive(Clone)]
pub struct RefundFlow {
    backend: Arc<dyn TenderBackend>,
    drawer: Option<Arc<dyn CashDrawer>>,
}

impl RefundFlow {
    pub fn new(backend: Arc<dyn TenderBackend>, drawer: Option<Arc<dyn CashDrawer>>) -> Self {
        Self { backend, drawer }
    }

    #[instrument(skip(self, record, request), fields(payment_id = %record.payment_id, transaction_id = %request.transaction_id))]
    pub async fn refund_transaction(
        &self,
        record: &mut PaymentRecord,
        request: RefundRequest,
    ) -> TenderResult<RefundOutcome> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(TenderError::validation("Refund reason is required"));
        }
        let requested = round_money(request.amount);
        if requested <= Decimal::ZERO {
            return Err(TenderError::validation("Refund amount must be positive"));
        }

        let tender = record.transaction(&request.transaction_id).ok_or_else(|| {
            TenderError::validation(format!("Transaction {} not found", request.transaction_id))
        })?;
        let refundable = tender.refundable_amount();
        if refundable <= Decimal::ZERO {
            return Err(TenderError::validation("Transaction is already fully refunded"));
        }

        let amount = requested.min(refundable);
        if amount < requested {
            info!(%requested, %amount, "Refund capped to refundable amount");
        }

        let method = if tender.method == TenderMethod::Cash || record.successful_tender_count() > 1
        {
            TenderMethod::Cash
        } else {
            tender.method
        };

        let updated = self
            .backend
            .refund_transaction(
                &record.payment_id,
                &RefundRequest {
                    transaction_id: request.transaction_id.clone(),
                    amount,
                    reason: reason.to_string(),
                },
            )
            .await
            .map_err(TenderError::Refund)?;
        *record = updated;
        info!(%amount, %method, "Refund recorded");

        let drawer_opened = method == TenderMethod::Cash && self.open_drawer().await;

        Ok(RefundOutcome {
            refunded: amount,
            method,
            drawer_opened,
        })
    }

    async fn open_drawer(&self) -> bool {
        let Some(drawer) = &self.drawer else {
            return false;
        };
        match drawer.open().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Cash drawer did not open for refund");
                false
            }
        }
    }
}
