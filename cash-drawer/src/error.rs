//! Error types for the cash drawer driver

use thiserror::Error;

/// Cash drawer error types
#[derive(Debug, Error)]
pub enum DrawerError {
    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error while sending the pulse
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Drawer (or the printer it hangs off) is unreachable
    #[error("Drawer offline: {0}")]
    Offline(String),

    /// Timeout connecting to the drawer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid drawer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for drawer operations
pub type DrawerResult<T> = Result<T, DrawerError>;
