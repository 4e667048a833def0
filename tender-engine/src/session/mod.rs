//! Tender session orchestration
//!
//! `TenderOrchestrator` is the single writer of a [`TenderSession`]. Every
//! operation checks the transition table first, then validates input, then
//! runs the adapter. Validation failures never change the state; adapter
//! failures move the session to `PaymentError`.
//!
//! While a collected intent waits for capture, no other tender is taken and
//! `PaymentError` can only be left through `retry_capture`, `close_tender`,
//! `reset_tender` or a new `start_tender`.
//!
//! ```text
//! Idle -> AwaitingPaymentMethod -> AwaitingCashAmount ----------.
//!                               -> AwaitingGiftCard ------------+-> ProcessingPayment
//!                               -> InitializingTerminal -> AwaitingTip -'      |
//!                               -> SplittingPayment (per slice)       Complete | SplittingPayment | PaymentError
//! ```

mod model;
mod state;

pub use model::TenderSession;
pub use state::{TenderEvent, TenderState, transition};

use crate::adapters::{
    CashAdapter, GiftCardAdapter, SplitDelegator, TerminalAdapter, TerminalCharge, cancel_intent,
};
use crate::reader::CardReader;
use crate::refund::{RefundFlow, RefundOutcome};
use crate::surcharge::SurchargeCalculator;
use crate::{TenderError, TenderResult};
use cash_drawer::CashDrawer;
use rust_decimal::Decimal;
use shared::money::{non_negative, round_money};
use shared::tender::{LedgerUpdate, OrderSnapshot, PaymentRecord, RefundRequest, TenderMethod};
use std::sync::Arc;
use tender_client::TenderBackend;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct TenderOrchestrator {
    session: TenderSession,
    backend: Arc<dyn TenderBackend>,
    cash: CashAdapter,
    gift_card: GiftCardAdapter,
    terminal: TerminalAdapter,
    split: SplitDelegator,
    surcharge: SurchargeCalculator,
    refunds: RefundFlow,
    drawer: Option<Arc<dyn CashDrawer>>,
    open_drawer_on_complete: bool,
    collect_cancel: CancellationToken,
}

impl TenderOrchestrator {
    pub fn new(
        backend: Arc<dyn TenderBackend>,
        reader: Arc<dyn CardReader>,
        drawer: Option<Arc<dyn CashDrawer>>,
    ) -> Self {
        let cash = CashAdapter::new(backend.clone());
        let terminal = TerminalAdapter::new(backend.clone(), reader);
        Self {
            session: TenderSession::default(),
            gift_card: GiftCardAdapter::new(backend.clone()),
            split: SplitDelegator::new(cash.clone(), terminal.clone()),
            surcharge: SurchargeCalculator::new(backend.clone()),
            refunds: RefundFlow::new(backend.clone(), drawer.clone()),
            cash,
            terminal,
            backend,
            drawer,
            open_drawer_on_complete: true,
            collect_cancel: CancellationToken::new(),
        }
    }

    pub fn with_open_drawer_on_complete(mut self, enabled: bool) -> Self {
        self.open_drawer_on_complete = enabled;
        self
    }

    pub fn session(&self) -> &TenderSession {
        &self.session
    }

    pub fn state(&self) -> TenderState {
        self.session.state
    }

    /// Resume a persisted session
    pub fn restore(&mut self, session: TenderSession) {
        info!(order_id = %session.order_id, state = %session.state, "Restoring tender session");
        self.session = session;
    }

    /// Token that aborts the card collection of the next terminal payment.
    /// Grab it before starting the payment; once used it is replaced.
    pub fn cancel_token(&self) -> CancellationToken {
        self.collect_cancel.clone()
    }

    // ========== Session lifecycle ==========

    pub fn start_tender(&mut self, snapshot: &OrderSnapshot) -> TenderResult<()> {
        if snapshot.order_id.trim().is_empty() {
            return Err(TenderError::validation("Order ID is required"));
        }
        if snapshot.grand_total < Decimal::ZERO {
            return Err(TenderError::validation("Grand total cannot be negative"));
        }

        // A previous order's intent must not outlive its session
        self.spawn_cancel_current_intent();

        self.session = TenderSession::for_order(snapshot);
        self.advance(TenderEvent::Start)?;
        info!(
            order_id = %self.session.order_id,
            balance_due = %self.session.balance_due,
            "Tender started"
        );
        Ok(())
    }

    /// Dismiss the tender. Balance and history are kept; a live intent is
    /// canceled in the background.
    pub fn close_tender(&mut self) -> TenderResult<Option<JoinHandle<()>>> {
        self.advance(TenderEvent::Close)?;
        let handle = self.spawn_cancel_current_intent();
        self.session.clear_attempt();
        self.session.error = None;
        info!(order_id = %self.session.order_id, "Tender closed");
        Ok(handle)
    }

    /// Wipe the session. A live intent is canceled in the background.
    pub fn reset_tender(&mut self) -> Option<JoinHandle<()>> {
        let handle = self.spawn_cancel_current_intent();
        self.session = TenderSession::default();
        debug!("Tender reset");
        handle
    }

    // ========== Method selection ==========

    pub async fn select_payment_method(&mut self, method: TenderMethod) -> TenderResult<()> {
        let event = match method {
            TenderMethod::Cash => TenderEvent::SelectCash,
            TenderMethod::GiftCard => TenderEvent::SelectGiftCard,
            TenderMethod::Card => TenderEvent::SelectCard {
                reader_connected: self.terminal.reader().is_connected(),
            },
        };
        self.ensure(event)?;
        self.ensure_balance_due()?;

        // Surcharge is quoted before any hardware is touched
        if method == TenderMethod::Card {
            self.session.surcharge_amount =
                self.surcharge.calculate(self.session.amount_due()).await?;
        }
        self.advance(event)?;
        self.session.payment_method = Some(method);
        self.session.split_active = false;
        self.session.error = None;
        Ok(())
    }

    pub fn begin_split(&mut self) -> TenderResult<()> {
        self.ensure(TenderEvent::BeginSplit)?;
        self.ensure_balance_due()?;
        self.advance(TenderEvent::BeginSplit)?;
        self.session.split_active = true;
        info!(order_id = %self.session.order_id, "Split payment started");
        Ok(())
    }

    /// Pick method and amount of the next split slice
    pub async fn select_split_slice(
        &mut self,
        method: TenderMethod,
        amount: Decimal,
    ) -> TenderResult<()> {
        SplitDelegator::ensure_supported(method)?;
        let event = if method == TenderMethod::Card {
            TenderEvent::SliceCard {
                reader_connected: self.terminal.reader().is_connected(),
            }
        } else {
            TenderEvent::SliceCash
        };
        self.ensure(event)?;

        let amount = round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(TenderError::validation("Split amount must be positive"));
        }
        if amount > self.session.balance_due {
            return Err(TenderError::validation(format!(
                "Split amount {} exceeds balance due {}",
                amount, self.session.balance_due
            )));
        }

        if method == TenderMethod::Card {
            self.session.surcharge_amount = self.surcharge.calculate(amount).await?;
        }
        self.advance(event)?;
        self.session.partial_amount = amount;
        self.session.payment_method = Some(method);
        self.session.error = None;
        debug!(%method, %amount, "Split slice selected");
        Ok(())
    }

    // ========== Tendering ==========

    /// Take `tendered` in cash. Returns the change for this payment.
    pub async fn apply_cash_payment(&mut self, tendered: Decimal) -> TenderResult<Decimal> {
        self.ensure_submit_from(TenderState::AwaitingCashAmount)?;
        let tendered = round_money(tendered);
        if tendered <= Decimal::ZERO {
            return Err(TenderError::validation("Tendered amount must be positive"));
        }

        let target = self.session.amount_due();
        let charged = tendered.min(target);
        self.advance(TenderEvent::Submit)?;

        let order_id = self.session.order_id.clone();
        let result = if self.in_split_slice() {
            self.split
                .process(
                    TenderMethod::Cash,
                    &order_id,
                    TerminalCharge::new(charged, Decimal::ZERO, Decimal::ZERO),
                    &mut self.session.current_intent,
                    &self.collect_cancel,
                )
                .await
        } else {
            self.cash.process(&order_id, charged).await
        };

        let ledger = result.map_err(|e| self.fail(e))?;
        let change = non_negative(tendered - charged);
        self.session.change_due += change;
        info!(%tendered, %charged, %change, "Cash payment applied");
        self.record_success(ledger).await?;
        Ok(change)
    }

    /// Pay with a gift card; `amount` defaults to the slice or balance
    pub async fn apply_gift_card_payment(
        &mut self,
        code: &str,
        amount: Option<Decimal>,
    ) -> TenderResult<()> {
        self.ensure_submit_from(TenderState::AwaitingGiftCard)?;
        let due = self.session.amount_due();
        let amount = round_money(amount.unwrap_or(due));
        if amount <= Decimal::ZERO {
            return Err(TenderError::validation("Gift card amount must be positive"));
        }
        if amount > due {
            return Err(TenderError::validation(format!(
                "Gift card amount {} exceeds amount due {}",
                amount, due
            )));
        }
        self.advance(TenderEvent::Submit)?;

        let order_id = self.session.order_id.clone();
        let result = self.gift_card.process(&order_id, code, amount).await;
        let ledger = result.map_err(|e| self.fail(e))?;
        self.record_success(ledger).await
    }

    /// Connect the card reader (InitializingTerminal -> AwaitingTip)
    pub async fn connect_terminal(&mut self) -> TenderResult<()> {
        self.ensure(TenderEvent::ReaderConnected)?;
        let connected = self.terminal.reader().connect().await;
        match connected {
            Ok(()) => {
                self.advance(TenderEvent::ReaderConnected)?;
                info!("Card reader connected");
                Ok(())
            }
            Err(e) => {
                let intent_id = self.session.current_intent_id().map(str::to_string);
                Err(self.fail(TenderError::Hardware {
                    message: e.to_string(),
                    intent_id,
                }))
            }
        }
    }

    pub async fn apply_tip_and_process_terminal_payment(&mut self, tip: Decimal) -> TenderResult<()> {
        self.ensure_submit_from(TenderState::AwaitingTip)?;
        let tip = round_money(tip);
        let charge = TerminalCharge::new(self.session.amount_due(), tip, self.session.surcharge_amount);
        if tip < Decimal::ZERO || charge.base_amount() <= Decimal::ZERO {
            return Err(TenderError::validation("Tip must be between zero and the amount due"));
        }

        self.session.tip_amount = tip;
        self.advance(TenderEvent::Submit)?;
        if self.collect_cancel.is_cancelled() {
            self.collect_cancel = CancellationToken::new();
        }

        let order_id = self.session.order_id.clone();
        let result = if self.in_split_slice() {
            self.split
                .process(
                    TenderMethod::Card,
                    &order_id,
                    charge,
                    &mut self.session.current_intent,
                    &self.collect_cancel,
                )
                .await
        } else {
            self.terminal
                .process(
                    &order_id,
                    charge,
                    &mut self.session.current_intent,
                    &self.collect_cancel,
                )
                .await
        };
        if self.collect_cancel.is_cancelled() {
            self.collect_cancel = CancellationToken::new();
        }

        let ledger = result.map_err(|e| self.fail(e))?;
        self.record_success(ledger).await
    }

    /// Capture the collected intent again after a capture failure
    pub async fn retry_capture(&mut self) -> TenderResult<()> {
        self.ensure(TenderEvent::RetryCapture)?;
        if !self.session.can_retry_capture() {
            return Err(TenderError::validation("No collected intent to capture"));
        }
        self.advance(TenderEvent::RetryCapture)?;

        let order_id = self.session.order_id.clone();
        let result = self
            .terminal
            .retry_capture(&order_id, &mut self.session.current_intent)
            .await;
        let ledger = result.map_err(|e| self.fail(e))?;
        self.record_success(ledger).await
    }

    // ========== Navigation ==========

    /// Back to method selection, leaving split mode. The current intent is
    /// kept.
    pub fn go_back(&mut self) -> TenderResult<()> {
        self.advance(TenderEvent::GoBack)?;
        self.session.clear_attempt();
        self.session.split_active = false;
        Ok(())
    }

    /// Leave `PaymentError` for method selection, dropping the reader link
    pub async fn retry_failed_payment(&mut self) -> TenderResult<()> {
        self.ensure(TenderEvent::Retry)?;
        self.ensure_no_pending_capture()?;
        if let Err(e) = self.terminal.reader().disconnect().await {
            warn!(error = %e, "Reader disconnect failed");
        }
        self.advance(TenderEvent::Retry)?;
        self.session.clear_attempt();
        self.session.split_active = false;
        self.session.error = None;
        Ok(())
    }

    // ========== Refunds ==========

    pub async fn refund_transaction(
        &self,
        record: &mut PaymentRecord,
        request: RefundRequest,
    ) -> TenderResult<RefundOutcome> {
        self.refunds.refund_transaction(record, request).await
    }

    // ========== Internals ==========

    fn in_split_slice(&self) -> bool {
        self.session.split_active && self.session.partial_amount > Decimal::ZERO
    }

    fn invalid(&self, event: TenderEvent) -> TenderError {
        TenderError::InvalidTransition {
            state: self.session.state,
            event: event.name(),
        }
    }

    fn ensure(&self, event: TenderEvent) -> TenderResult<TenderState> {
        transition(self.session.state, event).ok_or_else(|| self.invalid(event))
    }

    fn advance(&mut self, event: TenderEvent) -> TenderResult<TenderState> {
        let next = self.ensure(event)?;
        debug!(from = %self.session.state, to = %next, event = event.name(), "Tender transition");
        self.session.state = next;
        Ok(next)
    }

    fn ensure_submit_from(&self, entry: TenderState) -> TenderResult<()> {
        if self.session.state != entry {
            return Err(self.invalid(TenderEvent::Submit));
        }
        self.ensure(TenderEvent::Submit)?;
        self.ensure_no_pending_capture()
    }

    /// A collected card must be captured or the tender dismissed before
    /// anything else is charged
    fn ensure_no_pending_capture(&self) -> TenderResult<()> {
        match &self.session.current_intent {
            Some(intent) if intent.is_collected() => Err(TenderError::ReconciliationHazard {
                intent_id: intent.intent_id.clone(),
                reason: "collected card must be captured before another tender".into(),
            }),
            _ => Ok(()),
        }
    }

    fn ensure_balance_due(&self) -> TenderResult<()> {
        if self.session.balance_due <= Decimal::ZERO {
            return Err(TenderError::validation("Nothing left to pay"));
        }
        Ok(())
    }

    /// Move to `PaymentError` and hand the error back
    fn fail(&mut self, err: TenderError) -> TenderError {
        warn!(
            order_id = %self.session.order_id,
            state = %self.session.state,
            intent_id = ?self.session.current_intent_id(),
            error = %err,
            "Payment failed"
        );
        if let Some(next) = transition(self.session.state, TenderEvent::Failed) {
            self.session.state = next;
        }
        self.session.error = Some(err.to_string());
        err
    }

    async fn record_success(&mut self, ledger: LedgerUpdate) -> TenderResult<()> {
        self.session.apply_ledger(ledger);
        self.session.clear_attempt();
        self.session.error = None;

        let settled = self.session.is_settled();
        if settled {
            self.session.balance_due = Decimal::ZERO;
        }
        let next = self.advance(TenderEvent::Succeeded {
            settled,
            split: self.session.split_active,
        })?;
        info!(
            order_id = %self.session.order_id,
            balance_due = %self.session.balance_due,
            state = %next,
            "Payment recorded"
        );

        if next == TenderState::Complete {
            self.complete().await;
        }
        Ok(())
    }

    /// One-time completion effects
    async fn complete(&mut self) {
        if self.session.completion_fired {
            return;
        }
        self.session.completion_fired = true;
        self.session.split_active = false;
        info!(
            order_id = %self.session.order_id,
            total = %self.session.total_tendered(),
            change_due = %self.session.change_due,
            "Tender complete"
        );

        if !self.open_drawer_on_complete {
            return;
        }
        if let Some(drawer) = &self.drawer
            && let Err(e) = drawer.open().await
        {
            warn!(error = %e, "Cash drawer did not open on completion");
        }
    }

    fn spawn_cancel_current_intent(&mut self) -> Option<JoinHandle<()>> {
        let intent = self.session.current_intent.take()?;
        if intent.is_collected() {
            warn!(intent_id = %intent.intent_id, "Abandoning a collected intent");
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(intent_id = %intent.intent_id, "No runtime, intent left for reconciliation");
            return None;
        };
        let backend = self.backend.clone();
        Some(runtime.spawn(async move {
            cancel_intent(backend.as_ref(), &intent.intent_id).await;
        }))
    }
}

#[cfg(test)]
mod tests;
