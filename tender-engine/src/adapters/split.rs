use super::{CashAdapter, IntentHandle, TerminalAdapter, TerminalCharge};
use crate::{TenderError, TenderResult};
use shared::tender::{LedgerUpdate, TenderMethod};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs one split slice through the cash or terminal adapter as if the
/// slice were the whole balance. Keeps no aggregate state.
#[derive(Clone)]
pub struct SplitDelegator {
    cash: CashAdapter,
    terminal: TerminalAdapter,
}

impl SplitDelegator {
    pub fn new(cash: CashAdapter, terminal: TerminalAdapter) -> Self {
        Self { cash, terminal }
    }

    /// Methods a slice may use
    pub fn supports(method: TenderMethod) -> bool {
        matches!(method, TenderMethod::Cash | TenderMethod::Card)
    }

    pub fn ensure_supported(method: TenderMethod) -> TenderResult<()> {
        if Self::supports(method) {
            Ok(())
        } else {
            Err(TenderError::UnsupportedSplitMethod(method))
        }
    }

    /// Process a slice. For cash only `charge.amount` is used.
    pub async fn process(
        &self,
        method: TenderMethod,
        order_id: &str,
        charge: TerminalCharge,
        intent: &mut Option<IntentHandle>,
        cancel: &CancellationToken,
    ) -> TenderResult<LedgerUpdate> {
        Self::ensure_supported(method)?;
        debug!(order_id, %method, amount = %charge.amount, "Split slice");

        match method {
            TenderMethod::Cash => self.cash.process(order_id, charge.amount).await,
            TenderMethod::Card => {
                self.terminal
                    .process(order_id, charge, intent, cancel)
                    .await
            }
            other => Err(TenderError::UnsupportedSplitMethod(other)),
        }
    }
}
