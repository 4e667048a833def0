use super::*;
use crate::testing::{MockBackend, MockDrawer, MockReader};
use rust_decimal_macros::dec;

const ORDER_ID: &str = "order-1";

struct Harness {
    orchestrator: TenderOrchestrator,
    backend: Arc<MockBackend>,
    reader: Arc<MockReader>,
    drawer: Arc<MockDrawer>,
}

impl Harness {
    fn session(&self) -> &TenderSession {
        self.orchestrator.session()
    }

    fn state(&self) -> TenderState {
        self.orchestrator.state()
    }

    fn balance(&self) -> Decimal {
        self.orchestrator.session().balance_due
    }
}

fn harness(grand_total: Decimal) -> Harness {
    harness_with(MockBackend::new().with_order(ORDER_ID, grand_total), grand_total, true)
}

fn harness_with(backend: MockBackend, grand_total: Decimal, reader_connected: bool) -> Harness {
    let backend = Arc::new(backend);
    let reader = Arc::new(MockReader::new(reader_connected));
    let drawer = Arc::new(MockDrawer::new());
    let mut orchestrator =
        TenderOrchestrator::new(backend.clone(), reader.clone(), Some(drawer.clone()));
    orchestrator
        .start_tender(&OrderSnapshot::new(ORDER_ID, grand_total))
        .unwrap();
    Harness {
        orchestrator,
        backend,
        reader,
        drawer,
    }
}

// ========================================================================
// Helper: completed-session invariants
// ========================================================================

fn assert_settled(h: &Harness, grand_total: Decimal) {
    assert_eq!(h.state(), TenderState::Complete);
    assert_eq!(h.balance(), Decimal::ZERO);

    let settled: Decimal = h
        .session()
        .payment_history
        .iter()
        .filter(|t| t.is_successful())
        .map(|t| t.amount + t.tip)
        .sum();
    assert_eq!(settled, grand_total, "sum(amount) + sum(tip) must equal grand total");
}

/// Pay the whole balance by card from `AwaitingPaymentMethod`
async fn pay_by_card(h: &mut Harness, tip: Decimal) -> TenderResult<()> {
    h.orchestrator
        .select_payment_method(TenderMethod::Card)
        .await?;
    if h.state() == TenderState::InitializingTerminal {
        h.orchestrator.connect_terminal().await?;
    }
    h.orchestrator
        .apply_tip_and_process_terminal_payment(tip)
        .await
}
