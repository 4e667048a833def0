//! Card reader boundary
//!
//! The reader SDK is driven by the host application; the engine only needs
//! connection management and a single `collect` step for a client secret.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Reader not connected")]
    NotConnected,

    #[error("Card declined: {0}")]
    Declined(String),

    #[error("Collection canceled")]
    Canceled,

    #[error("Reader error: {0}")]
    Device(String),
}

/// Physical card-present reader
#[async_trait]
pub trait CardReader: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn connect(&self) -> Result<(), ReaderError>;

    async fn disconnect(&self) -> Result<(), ReaderError>;

    /// Present the intent to the card holder and wait for a payment method.
    ///
    /// No timeout is applied here; callers cancel through the collect token.
    async fn collect(&self, client_secret: &str) -> Result<(), ReaderError>;
}
