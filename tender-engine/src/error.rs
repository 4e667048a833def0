//! Tender engine errors
//!
//! | Variant | Session effect |
//! |---|---|
//! | `Validation` | rejected before any network/hardware call, no transition |
//! | `HardwareNotConnected` / `Hardware` | `PaymentError`, intent preserved |
//! | `Backend` | `PaymentError` (transient or not) |
//! | `ReconciliationHazard` | `PaymentError`, only retry-capture is offered |
//! | `Refund` | surfaced, local payment record untouched |

use crate::session::TenderState;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::tender::TenderMethod;
use tender_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenderError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Card reader not connected")]
    HardwareNotConnected,

    /// Reader failure (declined, canceled, device error). The intent, if
    /// one was created, stays capturable-or-cancelable.
    #[error("Hardware error: {message}")]
    Hardware {
        message: String,
        intent_id: Option<String>,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] ClientError),

    /// Card was collected but capture did not confirm. `intent_id` is the
    /// only recovery key; never charge again with a fresh intent.
    #[error("Reconciliation required for intent {intent_id}: {reason}")]
    ReconciliationHazard { intent_id: String, reason: String },

    #[error("Gift card balance {available} is below requested {requested}")]
    GiftCardInsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Refund failed: {0}")]
    Refund(#[source] ClientError),

    #[error("Cannot {event} while {state}")]
    InvalidTransition {
        state: TenderState,
        event: &'static str,
    },

    #[error("Split payments do not support {0}")]
    UnsupportedSplitMethod(TenderMethod),
}

impl TenderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Intent ID to keep for recovery, if the error carries one
    pub fn intent_id(&self) -> Option<&str> {
        match self {
            Self::Hardware { intent_id, .. } => intent_id.as_deref(),
            Self::ReconciliationHazard { intent_id, .. } => Some(intent_id),
            _ => None,
        }
    }

    /// Whether the backend may simply not have been reached
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether the failure needs to be reconciled rather than retried
    pub fn is_reconciliation_hazard(&self) -> bool {
        matches!(self, Self::ReconciliationHazard { .. })
    }
}

fn client_error_to_app(e: &ClientError, fallback: ErrorCode) -> AppError {
    match e.api_code() {
        Some(code) => AppError::with_message(code, e.to_string()),
        None if e.is_transient() => AppError::with_message(ErrorCode::NetworkError, e.to_string()),
        None => AppError::with_message(fallback, e.to_string()),
    }
}

impl From<&TenderError> for AppError {
    fn from(err: &TenderError) -> Self {
        match err {
            TenderError::Validation(msg) => AppError::validation(msg.clone()),
            TenderError::HardwareNotConnected => AppError::new(ErrorCode::TerminalNotConnected),
            TenderError::Hardware { message, intent_id } => {
                let app = AppError::payment_failed(message.clone());
                match intent_id {
                    Some(id) => app.with_detail("intent_id", id.clone()),
                    None => app,
                }
            }
            TenderError::Backend(e) => client_error_to_app(e, ErrorCode::PaymentFailed),
            TenderError::ReconciliationHazard { intent_id, reason } => {
                AppError::with_message(ErrorCode::ReconciliationRequired, reason.clone())
                    .with_detail("intent_id", intent_id.clone())
            }
            TenderError::GiftCardInsufficientBalance {
                requested,
                available,
            } => AppError::new(ErrorCode::GiftCardInsufficientBalance)
                .with_detail("requested", requested.to_string())
                .with_detail("available", available.to_string()),
            TenderError::Refund(e) => client_error_to_app(e, ErrorCode::PaymentFailed),
            TenderError::InvalidTransition { .. } => {
                AppError::with_message(ErrorCode::InvalidRequest, err.to_string())
            }
            TenderError::UnsupportedSplitMethod(method) => {
                AppError::with_message(ErrorCode::PaymentInvalidMethod, err.to_string())
                    .with_detail("method", method.as_str())
            }
        }
    }
}

impl From<TenderError> for AppError {
    fn from(err: TenderError) -> Self {
        AppError::from(&err)
    }
}

pub type TenderResult<T> = Result<T, TenderError>;
