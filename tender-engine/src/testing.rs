//! In-memory backend, reader and drawer for tests

use crate::reader::{CardReader, ReaderError};
use async_trait::async_trait;
use cash_drawer::{CashDrawer, DrawerError, DrawerResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shared::error::ErrorCode;
use shared::money::{non_negative, round_money};
use shared::tender::{
    CreateIntentRequest, GiftCardBalance, LedgerUpdate, PaymentIntent, PaymentRecord,
    RefundRequest, SurchargeQuote, Tender, TenderMethod, TenderStatus,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tender_client::{ClientError, ClientResult, TenderBackend};

pub fn tender(id: &str, method: TenderMethod, amount: Decimal) -> Tender {
    Tender {
        id: id.to_string(),
        method,
        amount,
        tip: Decimal::ZERO,
        surcharge: Decimal::ZERO,
        status: TenderStatus::Successful,
        card_brand: None,
        last4: None,
        refunded_amount: Decimal::ZERO,
        created_at: 0,
    }
}

fn api_error(code: ErrorCode) -> ClientError {
    ClientError::Api {
        code: code.code(),
        message: code.message().to_string(),
        details: None,
    }
}

/// Backend call, as recorded by [`MockBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateIntent {
        order_id: String,
        request: CreateIntentRequest,
    },
    CaptureIntent {
        order_id: String,
        intent_id: String,
    },
    CancelIntent {
        intent_id: String,
    },
    ProcessCash {
        order_id: String,
        amount: Decimal,
    },
    GiftCardBalance {
        code: String,
    },
    ProcessGiftCard {
        order_id: String,
        code: String,
        amount: Decimal,
    },
    CalculateSurcharge {
        amount: Decimal,
    },
    Refund {
        payment_id: String,
        request: RefundRequest,
    },
}

impl Call {
    pub fn op(&self) -> &'static str {
        match self {
            Self::CreateIntent { .. } => "create_intent",
            Self::CaptureIntent { .. } => "capture_intent",
            Self::CancelIntent { .. } => "cancel_intent",
            Self::ProcessCash { .. } => "process_cash",
            Self::GiftCardBalance { .. } => "gift_card_balance",
            Self::ProcessGiftCard { .. } => "process_gift_card",
            Self::CalculateSurcharge { .. } => "calculate_surcharge",
            Self::Refund { .. } => "refund_transaction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntentStatus {
    Open,
    Captured,
    Canceled,
}

#[derive(Debug, Clone)]
struct MockIntent {
    order_id: String,
    request: CreateIntentRequest,
    status: IntentStatus,
}

#[derive(Debug, Default)]
struct MockOrder {
    grand_total: Decimal,
    transactions: Vec<Tender>,
}

impl MockOrder {
    fn ledger(&self) -> LedgerUpdate {
        let paid: Decimal = self
            .transactions
            .iter()
            .filter(|t| t.is_successful())
            .map(Tender::settled_amount)
            .sum();
        LedgerUpdate {
            balance_due: non_negative(self.grand_total - paid),
            transactions: self.transactions.clone(),
        }
    }
}

#[derive(Default)]
struct BackendState {
    orders: HashMap<String, MockOrder>,
    intents: HashMap<String, MockIntent>,
    gift_cards: HashMap<String, Decimal>,
    records: HashMap<String, PaymentRecord>,
    failures: HashMap<&'static str, VecDeque<ClientError>>,
    calls: Vec<Call>,
    next_id: u32,
}

impl BackendState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn take_failure(&mut self, op: &'static str) -> Option<ClientError> {
        self.failures.get_mut(op).and_then(VecDeque::pop_front)
    }

    fn push_tender(
        &mut self,
        order_id: &str,
        method: TenderMethod,
        amount: Decimal,
    ) -> ClientResult<Tender> {
        let id = format!("t-{}", self.next_id());
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| api_error(ErrorCode::OrderNotFound))?;
        let t = tender(&id, method, amount);
        order.transactions.push(t.clone());
        Ok(t)
    }
}

/// Scriptable in-memory payment backend that records every call
pub struct MockBackend {
    state: Mutex<BackendState>,
    surcharge_rate: Decimal,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BackendState::default()),
            surcharge_rate: dec!(0.03),
        }
    }

    pub fn with_order(self, order_id: &str, grand_total: Decimal) -> Self {
        self.lock().orders.insert(
            order_id.to_string(),
            MockOrder {
                grand_total,
                transactions: Vec::new(),
            },
        );
        self
    }

    pub fn with_gift_card(self, code: &str, balance: Decimal) -> Self {
        self.lock().gift_cards.insert(code.to_string(), balance);
        self
    }

    pub fn with_surcharge_rate(mut self, rate: Decimal) -> Self {
        self.surcharge_rate = rate;
        self
    }

    pub fn with_payment_record(self, record: PaymentRecord) -> Self {
        self.lock().records.insert(record.payment_id.clone(), record);
        self
    }

    /// Fail the next call of `op` with `err`
    pub fn fail_next(&self, op: &'static str, err: ClientError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn created_intents(&self) -> Vec<CreateIntentRequest> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateIntent { request, .. } => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn canceled_intents(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::CancelIntent { intent_id } => Some(intent_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn surcharge_requests(&self) -> Vec<Decimal> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::CalculateSurcharge { amount } => Some(*amount),
                _ => None,
            })
            .collect()
    }

    pub fn refund_amounts(&self) -> Vec<Decimal> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Refund { request, .. } => Some(request.amount),
                _ => None,
            })
            .collect()
    }

    pub fn gift_card(&self, code: &str) -> Option<Decimal> {
        self.lock().gift_cards.get(code).copied()
    }

    /// Tenders the backend holds for an order
    pub fn transactions(&self, order_id: &str) -> Vec<Tender> {
        self.lock()
            .orders
            .get(order_id)
            .map(|o| o.transactions.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl TenderBackend for MockBackend {
    async fn create_intent(
        &self,
        order_id: &str,
        request: &CreateIntentRequest,
    ) -> ClientResult<PaymentIntent> {
        let mut state = self.lock();
        state.calls.push(Call::CreateIntent {
            order_id: order_id.to_string(),
            request: request.clone(),
        });
        if let Some(err) = state.take_failure("create_intent") {
            return Err(err);
        }
        let intent_id = format!("pi_{}", state.next_id());
        state.intents.insert(
            intent_id.clone(),
            MockIntent {
                order_id: order_id.to_string(),
                request: request.clone(),
                status: IntentStatus::Open,
            },
        );
        Ok(PaymentIntent {
            client_secret: format!("{}_secret", intent_id),
            intent_id,
        })
    }

    async fn capture_intent(&self, order_id: &str, intent_id: &str) -> ClientResult<LedgerUpdate> {
        let mut state = self.lock();
        state.calls.push(Call::CaptureIntent {
            order_id: order_id.to_string(),
            intent_id: intent_id.to_string(),
        });
        if let Some(err) = state.take_failure("capture_intent") {
            return Err(err);
        }
        let intent = state
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| api_error(ErrorCode::NotFound))?;

        match intent.status {
            IntentStatus::Canceled => return Err(api_error(ErrorCode::PaymentFailed)),
            IntentStatus::Captured => {}
            IntentStatus::Open => {
                let id = format!("t-{}", state.next_id());
                let order = state
                    .orders
                    .get_mut(&intent.order_id)
                    .ok_or_else(|| api_error(ErrorCode::OrderNotFound))?;
                let mut t = tender(&id, TenderMethod::Card, intent.request.amount);
                t.tip = intent.request.tip;
                t.surcharge = intent.request.surcharge;
                t.card_brand = Some("VISA".into());
                t.last4 = Some("4242".into());
                order.transactions.push(t);
                if let Some(i) = state.intents.get_mut(intent_id) {
                    i.status = IntentStatus::Captured;
                }
            }
        }

        state
            .orders
            .get(order_id)
            .map(MockOrder::ledger)
            .ok_or_else(|| api_error(ErrorCode::OrderNotFound))
    }

    async fn cancel_intent(&self, intent_id: &str) -> ClientResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::CancelIntent {
            intent_id: intent_id.to_string(),
        });
        if let Some(err) = state.take_failure("cancel_intent") {
            return Err(err);
        }
        if let Some(intent) = state.intents.get_mut(intent_id)
            && intent.status == IntentStatus::Open
        {
            intent.status = IntentStatus::Canceled;
        }
        Ok(())
    }

    async fn process_cash(&self, order_id: &str, amount: Decimal) -> ClientResult<LedgerUpdate> {
        let mut state = self.lock();
        state.calls.push(Call::ProcessCash {
            order_id: order_id.to_string(),
            amount,
        });
        if let Some(err) = state.take_failure("process_cash") {
            return Err(err);
        }
        state.push_tender(order_id, TenderMethod::Cash, amount)?;
        Ok(state.orders[order_id].ledger())
    }

    async fn gift_card_balance(&self, code: &str) -> ClientResult<GiftCardBalance> {
        let mut state = self.lock();
        state.calls.push(Call::GiftCardBalance {
            code: code.to_string(),
        });
        if let Some(err) = state.take_failure("gift_card_balance") {
            return Err(err);
        }
        state
            .gift_cards
            .get(code)
            .map(|balance| GiftCardBalance {
                code: code.to_string(),
                balance: *balance,
            })
            .ok_or_else(|| api_error(ErrorCode::GiftCardNotFound))
    }

    async fn process_gift_card(
        &self,
        order_id: &str,
        code: &str,
        amount: Decimal,
    ) -> ClientResult<LedgerUpdate> {
        let mut state = self.lock();
        state.calls.push(Call::ProcessGiftCard {
            order_id: order_id.to_string(),
            code: code.to_string(),
            amount,
        });
        if let Some(err) = state.take_failure("process_gift_card") {
            return Err(err);
        }
        let balance = state
            .gift_cards
            .get_mut(code)
            .ok_or_else(|| api_error(ErrorCode::GiftCardNotFound))?;
        if amount > *balance {
            return Err(api_error(ErrorCode::GiftCardInsufficientBalance));
        }
        *balance -= amount;
        state.push_tender(order_id, TenderMethod::GiftCard, amount)?;
        Ok(state.orders[order_id].ledger())
    }

    async fn calculate_surcharge(&self, amount: Decimal) -> ClientResult<SurchargeQuote> {
        let mut state = self.lock();
        state.calls.push(Call::CalculateSurcharge { amount });
        if let Some(err) = state.take_failure("calculate_surcharge") {
            return Err(err);
        }
        Ok(SurchargeQuote {
            amount,
            surcharge: round_money(amount * self.surcharge_rate),
        })
    }

    async fn refund_transaction(
        &self,
        payment_id: &str,
        request: &RefundRequest,
    ) -> ClientResult<PaymentRecord> {
        let mut state = self.lock();
        state.calls.push(Call::Refund {
            payment_id: payment_id.to_string(),
            request: request.clone(),
        });
        if let Some(err) = state.take_failure("refund_transaction") {
            return Err(err);
        }
        let record = state
            .records
            .get_mut(payment_id)
            .ok_or_else(|| api_error(ErrorCode::NotFound))?;
        let t = record
            .transactions
            .iter_mut()
            .find(|t| t.id == request.transaction_id)
            .ok_or_else(|| api_error(ErrorCode::NotFound))?;
        if request.amount > t.refundable_amount() {
            return Err(api_error(ErrorCode::PaymentRefundExceedsAmount));
        }
        t.refunded_amount += request.amount;
        if t.refundable_amount() == Decimal::ZERO {
            t.status = TenderStatus::Refunded;
        }
        record.refunded_total += request.amount;
        Ok(record.clone())
    }
}

/// Card reader double
pub struct MockReader {
    connected: AtomicBool,
    hang: AtomicBool,
    fail_connect: AtomicBool,
    fail_disconnect: AtomicBool,
    collect_results: Mutex<VecDeque<Result<(), ReaderError>>>,
    collects: AtomicUsize,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl MockReader {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
            hang: AtomicBool::new(false),
            fail_connect: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            collect_results: Mutex::new(VecDeque::new()),
            collects: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }

    /// Result of the next collect (default: success)
    pub fn push_collect_result(&self, result: Result<(), ReaderError>) {
        self.collect_results.lock().unwrap().push_back(result);
    }

    /// Collect never completes until canceled
    pub fn hang_on_collect(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn fail_connect(&self) {
        self.fail_connect.store(true, Ordering::SeqCst);
    }

    pub fn fail_disconnect(&self) {
        self.fail_disconnect.store(true, Ordering::SeqCst);
    }

    pub fn collect_count(&self) -> usize {
        self.collects.load(Ordering::SeqCst)
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardReader for MockReader {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), ReaderError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ReaderError::Device("reader not found".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ReaderError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(ReaderError::Device("reader busy".into()));
        }
        Ok(())
    }

    async fn collect(&self, _client_secret: &str) -> Result<(), ReaderError> {
        self.collects.fetch_add(1, Ordering::SeqCst);
        if !self.is_connected() {
            return Err(ReaderError::NotConnected);
        }
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.collect_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Cash drawer double
pub struct MockDrawer {
    opens: AtomicUsize,
    fail: bool,
}

impl MockDrawer {
    pub fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CashDrawer for MockDrawer {
    async fn open(&self) -> DrawerResult<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DrawerError::Offline("drawer unplugged".into()));
        }
        Ok(())
    }
}
