//! Card-present terminal flow
//!
//! create intent -> collect on reader -> capture
//!
//! The intent handle lives in a slot owned by the session so that every
//! phase is visible to the caller even when a later phase fails. After a
//! successful collect the card holder may already be charged, so a capture
//! failure never leads to a new intent; only capture is retried.

use crate::reader::{CardReader, ReaderError};
use crate::{TenderError, TenderResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::money::round_money;
use shared::tender::{CreateIntentRequest, LedgerUpdate};
use std::sync::Arc;
use tender_client::TenderBackend;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentPhase {
    /// Created on the backend, not yet presented to a card
    Created,
    /// Card collected, awaiting capture
    Collected,
}

/// Live (non-terminal) payment intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentHandle {
    pub intent_id: String,
    pub client_secret: String,
    /// Amount due covered by this intent (tip included, surcharge excluded)
    pub amount: Decimal,
    pub tip: Decimal,
    pub surcharge: Decimal,
    pub phase: IntentPhase,
}

impl IntentHandle {
    pub fn is_collected(&self) -> bool {
        self.phase == IntentPhase::Collected
    }

    fn matches(&self, charge: &TerminalCharge) -> bool {
        self.amount == charge.amount && self.tip == charge.tip && self.surcharge == charge.surcharge
    }
}

/// What to charge on the terminal
///
/// `amount` is the balance (or split slice) being settled. The tip is carved
/// out of it, so the intent is created for `amount - tip` plus `tip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalCharge {
    pub amount: Decimal,
    pub tip: Decimal,
    pub surcharge: Decimal,
}

impl TerminalCharge {
    pub fn new(amount: Decimal, tip: Decimal, surcharge: Decimal) -> Self {
        Self {
            amount: round_money(amount),
            tip: round_money(tip),
            surcharge: round_money(surcharge),
        }
    }

    pub fn base_amount(&self) -> Decimal {
        self.amount - self.tip
    }

    fn validate(&self) -> TenderResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(TenderError::validation("Card amount must be positive"));
        }
        if self.tip < Decimal::ZERO {
            return Err(TenderError::validation("Tip cannot be negative"));
        }
        if self.base_amount() <= Decimal::ZERO {
            return Err(TenderError::validation("Tip must be less than the amount due"));
        }
        if self.surcharge < Decimal::ZERO {
            return Err(TenderError::validation("Surcharge cannot be negative"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct TerminalAdapter {
    backend: Arc<dyn TenderBackend>,
    reader: Arc<dyn CardReader>,
}

impl TerminalAdapter {
    pub fn new(backend: Arc<dyn TenderBackend>, reader: Arc<dyn CardReader>) -> Self {
        Self { backend, reader }
    }

    pub fn reader(&self) -> &Arc<dyn CardReader> {
        &self.reader
    }

    /// Run the full create/collect/capture flow.
    ///
    /// `intent` is the session's intent slot: it is filled as soon as the
    /// intent exists and cleared only after a confirmed capture.
    #[instrument(skip(self, intent, cancel), fields(order_id = %order_id, amount = %charge.amount, tip = %charge.tip))]
    pub async fn process(
        &self,
        order_id: &str,
        charge: TerminalCharge,
        intent: &mut Option<IntentHandle>,
        cancel: &CancellationToken,
    ) -> TenderResult<LedgerUpdate> {
        charge.validate()?;

        if !self.reader.is_connected() {
            return Err(TenderError::HardwareNotConnected);
        }

        if let Some(existing) = intent.as_ref() {
            if existing.is_collected() {
                return Err(TenderError::ReconciliationHazard {
                    intent_id: existing.intent_id.clone(),
                    reason: "a collected intent must be captured or canceled first".into(),
                });
            }
            if !existing.matches(&charge) {
                info!(intent_id = %existing.intent_id, "Dropping stale intent");
                cancel_intent(self.backend.as_ref(), &existing.intent_id).await;
                *intent = None;
            }
        }

        if intent.is_none() {
            let created = self
                .backend
                .create_intent(
                    order_id,
                    &CreateIntentRequest {
                        amount: charge.base_amount(),
                        tip: charge.tip,
                        surcharge: charge.surcharge,
                    },
                )
                .await?;
            info!(intent_id = %created.intent_id, "Intent created");
            *intent = Some(IntentHandle {
                intent_id: created.intent_id,
                client_secret: created.client_secret,
                amount: charge.amount,
                tip: charge.tip,
                surcharge: charge.surcharge,
                phase: IntentPhase::Created,
            });
        }

        let Some(handle) = intent.as_mut() else {
            return Err(TenderError::validation("No intent to collect"));
        };

        let collected = tokio::select! {
            _ = cancel.cancelled() => Err(ReaderError::Canceled),
            result = self.reader.collect(&handle.client_secret) => result,
        };
        if let Err(e) = collected {
            warn!(intent_id = %handle.intent_id, error = %e, "Collect failed");
            return Err(TenderError::Hardware {
                message: e.to_string(),
                intent_id: Some(handle.intent_id.clone()),
            });
        }
        handle.phase = IntentPhase::Collected;
        info!(intent_id = %handle.intent_id, "Card collected");

        self.capture(order_id, intent).await
    }

    /// Capture the collected intent in the slot again. Never creates an intent.
    #[instrument(skip(self, intent), fields(order_id = %order_id))]
    pub async fn retry_capture(
        &self,
        order_id: &str,
        intent: &mut Option<IntentHandle>,
    ) -> TenderResult<LedgerUpdate> {
        match intent.as_ref().map(IntentHandle::is_collected) {
            Some(true) => self.capture(order_id, intent).await,
            Some(false) => Err(TenderError::validation(
                "Intent was not collected; charge the card again instead",
            )),
            None => Err(TenderError::validation("No intent to capture")),
        }
    }

    async fn capture(
        &self,
        order_id: &str,
        intent: &mut Option<IntentHandle>,
    ) -> TenderResult<LedgerUpdate> {
        let Some(handle) = intent.as_mut() else {
            return Err(TenderError::validation("No intent to capture"));
        };

        let intent_id = handle.intent_id.clone();

        match self.backend.capture_intent(order_id, &intent_id).await {
            Ok(ledger) => {
                info!(%intent_id, balance_due = %ledger.balance_due, "Intent captured");
                *intent = None;
                Ok(ledger)
            }
            Err(e) if e.api_code() == Some(ErrorCode::PaymentIntentNotCollected) => {
                // Backend says nothing was charged: safe to collect again
                warn!(%intent_id, "Capture rejected, intent not collected");
                handle.phase = IntentPhase::Created;
                Err(TenderError::Hardware {
                    message: e.to_string(),
                    intent_id: Some(intent_id),
                })
            }
            Err(e) => {
                warn!(%intent_id, error = %e, "Capture failed after collect");
                Err(TenderError::ReconciliationHazard {
                    intent_id,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Cancel an intent, logging the outcome. No-op on an empty ID; never fails.
pub async fn cancel_intent(backend: &dyn TenderBackend, intent_id: &str) {
    if intent_id.is_empty() {
        return;
    }
    match backend.cancel_intent(intent_id).await {
        Ok(()) => info!(intent_id, "Intent canceled"),
        Err(e) => warn!(intent_id, error = %e, "Intent cancel failed"),
    }
}
