//! Tender states and the transition table
//!
//! `transition` is pure: it only answers "where does `event` lead from
//! `state`". The orchestrator performs side effects around it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderState {
    #[default]
    Idle,
    AwaitingPaymentMethod,
    AwaitingCashAmount,
    AwaitingGiftCard,
    InitializingTerminal,
    AwaitingTip,
    SplittingPayment,
    ProcessingPayment,
    PaymentError,
    Complete,
    /// Dismissed with `close_tender`; balance and history are kept
    Closed,
}

impl TenderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::AwaitingPaymentMethod => "AWAITING_PAYMENT_METHOD",
            Self::AwaitingCashAmount => "AWAITING_CASH_AMOUNT",
            Self::AwaitingGiftCard => "AWAITING_GIFT_CARD",
            Self::InitializingTerminal => "INITIALIZING_TERMINAL",
            Self::AwaitingTip => "AWAITING_TIP",
            Self::SplittingPayment => "SPLITTING_PAYMENT",
            Self::ProcessingPayment => "PROCESSING_PAYMENT",
            Self::PaymentError => "PAYMENT_ERROR",
            Self::Complete => "COMPLETE",
            Self::Closed => "CLOSED",
        }
    }

    /// No further tendering happens from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Closed | Self::Idle)
    }
}

impl fmt::Display for TenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenderEvent {
    Start,
    SelectCash,
    SelectGiftCard,
    SelectCard { reader_connected: bool },
    BeginSplit,
    SliceCash,
    SliceCard { reader_connected: bool },
    ReaderConnected,
    Submit,
    RetryCapture,
    /// A tender was recorded. `settled`: balance reached zero.
    Succeeded { settled: bool, split: bool },
    Failed,
    GoBack,
    Retry,
    Close,
    Reset,
}

impl TenderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start tender",
            Self::SelectCash => "select cash",
            Self::SelectGiftCard => "select gift card",
            Self::SelectCard { .. } => "select card",
            Self::BeginSplit => "begin split",
            Self::SliceCash => "select cash slice",
            Self::SliceCard { .. } => "select card slice",
            Self::ReaderConnected => "connect terminal",
            Self::Submit => "submit payment",
            Self::RetryCapture => "retry capture",
            Self::Succeeded { .. } => "record payment",
            Self::Failed => "fail payment",
            Self::GoBack => "go back",
            Self::Retry => "retry payment",
            Self::Close => "close tender",
            Self::Reset => "reset tender",
        }
    }
}

fn card_entry(reader_connected: bool) -> TenderState {
    if reader_connected {
        TenderState::AwaitingTip
    } else {
        TenderState::InitializingTerminal
    }
}

/// Next state for `event` in `state`, or `None` if the event is not allowed
pub fn transition(state: TenderState, event: TenderEvent) -> Option<TenderState> {
    use TenderEvent as E;
    use TenderState as S;

    match (state, event) {
        // Session lifecycle
        (_, E::Start) => Some(S::AwaitingPaymentMethod),
        (_, E::Reset) => Some(S::Idle),
        (S::Idle | S::ProcessingPayment, E::Close) => None,
        (_, E::Close) => Some(S::Closed),

        // Method selection
        (S::AwaitingPaymentMethod, E::SelectCash) => Some(S::AwaitingCashAmount),
        (S::AwaitingPaymentMethod, E::SelectGiftCard) => Some(S::AwaitingGiftCard),
        (S::AwaitingPaymentMethod, E::SelectCard { reader_connected }) => {
            Some(card_entry(reader_connected))
        }
        (S::AwaitingPaymentMethod, E::BeginSplit) => Some(S::SplittingPayment),

        // Split slices
        (S::SplittingPayment, E::SliceCash) => Some(S::AwaitingCashAmount),
        (S::SplittingPayment, E::SliceCard { reader_connected }) => {
            Some(card_entry(reader_connected))
        }

        (S::InitializingTerminal, E::ReaderConnected) => Some(S::AwaitingTip),
        (S::InitializingTerminal, E::Failed) => Some(S::PaymentError),

        (S::AwaitingCashAmount | S::AwaitingGiftCard | S::AwaitingTip, E::Submit) => {
            Some(S::ProcessingPayment)
        }
        (S::PaymentError, E::RetryCapture) => Some(S::ProcessingPayment),

        // Outcome
        (S::ProcessingPayment, E::Succeeded { settled: true, .. }) => Some(S::Complete),
        (S::ProcessingPayment, E::Succeeded { split: true, .. }) => Some(S::SplittingPayment),
        (S::ProcessingPayment, E::Succeeded { .. }) => Some(S::AwaitingPaymentMethod),
        (S::ProcessingPayment, E::Failed) => Some(S::PaymentError),

        // Navigation
        (
            S::AwaitingCashAmount
            | S::AwaitingGiftCard
            | S::InitializingTerminal
            | S::AwaitingTip
            | S::SplittingPayment,
            E::GoBack,
        ) => Some(S::AwaitingPaymentMethod),
        (S::PaymentError, E::Retry) => Some(S::AwaitingPaymentMethod),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TenderEvent as E;
    use TenderState as S;

    #[test]
    fn test_card_entry_depends_on_reader() {
        assert_eq!(
            transition(S::AwaitingPaymentMethod, E::SelectCard { reader_connected: false }),
            Some(S::InitializingTerminal)
        );
        assert_eq!(
            transition(S::AwaitingPaymentMethod, E::SelectCard { reader_connected: true }),
            Some(S::AwaitingTip)
        );
        assert_eq!(
            transition(S::SplittingPayment, E::SliceCard { reader_connected: false }),
            Some(S::InitializingTerminal)
        );
        assert_eq!(
            transition(S::InitializingTerminal, E::ReaderConnected),
            Some(S::AwaitingTip)
        );
    }

    #[test]
    fn test_processing_blocks_selection() {
        for event in [
            E::SelectCash,
            E::SelectGiftCard,
            E::SelectCard { reader_connected: true },
            E::BeginSplit,
            E::Submit,
            E::GoBack,
            E::Close,
        ] {
            assert_eq!(transition(S::ProcessingPayment, event), None, "{:?}", event);
        }
    }

    #[test]
    fn test_success_outcomes() {
        let settled = E::Succeeded {
            settled: true,
            split: true,
        };
        assert_eq!(transition(S::ProcessingPayment, settled), Some(S::Complete));

        let slice_done = E::Succeeded {
            settled: false,
            split: true,
        };
        assert_eq!(
            transition(S::ProcessingPayment, slice_done),
            Some(S::SplittingPayment)
        );

        let partial = E::Succeeded {
            settled: false,
            split: false,
        };
        assert_eq!(
            transition(S::ProcessingPayment, partial),
            Some(S::AwaitingPaymentMethod)
        );
    }

    #[test]
    fn test_error_recovery_paths() {
        assert_eq!(
            transition(S::ProcessingPayment, E::Failed),
            Some(S::PaymentError)
        );
        assert_eq!(
            transition(S::PaymentError, E::Retry),
            Some(S::AwaitingPaymentMethod)
        );
        assert_eq!(
            transition(S::PaymentError, E::RetryCapture),
            Some(S::ProcessingPayment)
        );
        assert_eq!(transition(S::PaymentError, E::Submit), None);
        assert_eq!(transition(S::PaymentError, E::GoBack), None);
    }

    #[test]
    fn test_complete_only_restarts_or_closes() {
        assert_eq!(transition(S::Complete, E::SelectCash), None);
        assert_eq!(transition(S::Complete, E::Submit), None);
        assert_eq!(transition(S::Complete, E::Close), Some(S::Closed));
        assert_eq!(transition(S::Complete, E::Reset), Some(S::Idle));
        assert_eq!(
            transition(S::Complete, E::Start),
            Some(S::AwaitingPaymentMethod)
        );
    }

    #[test]
    fn test_close_needs_a_started_session() {
        assert_eq!(transition(S::Idle, E::Close), None);
        assert_eq!(transition(S::PaymentError, E::Close), Some(S::Closed));
        assert_eq!(
            transition(S::AwaitingPaymentMethod, E::Close),
            Some(S::Closed)
        );
    }

    #[test]
    fn test_state_wire_name() {
        let json = serde_json::to_string(&S::AwaitingPaymentMethod).unwrap();
        assert_eq!(json, "\"AWAITING_PAYMENT_METHOD\"");
        assert_eq!(S::PaymentError.to_string(), "PAYMENT_ERROR");
    }
}
