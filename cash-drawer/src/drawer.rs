//! Drawer adapters

use crate::error::{DrawerError, DrawerResult};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

/// `ESC p m t1 t2` pulse on connector pin 2 (m = 0)
pub const PULSE_PIN_2: [u8; 5] = [0x1B, b'p', 0, 25, 250];
/// `ESC p m t1 t2` pulse on connector pin 5 (m = 1)
pub const PULSE_PIN_5: [u8; 5] = [0x1B, b'p', 1, 25, 250];

/// A cash drawer that can be kicked open
#[async_trait]
pub trait CashDrawer: Send + Sync {
    /// Open the drawer
    async fn open(&self) -> DrawerResult<()>;
}

/// Drawer attached to a network receipt printer
#[derive(Debug, Clone)]
pub struct NetworkCashDrawer {
    addr: SocketAddr,
    timeout: Duration,
}

impl NetworkCashDrawer {
    pub fn new(host: &str, port: u16) -> DrawerResult<Self> {
        Self::from_addr(&format!("{}:{}", host, port))
    }

    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> DrawerResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| DrawerError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn send(&self, data: &[u8]) -> DrawerResult<()> {
        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| DrawerError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| DrawerError::Connection(format!("{}: {}", self.addr, e)))?;

        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl CashDrawer for NetworkCashDrawer {
    /// Tries pin 2 first, then pin 5 if that fails.
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&self) -> DrawerResult<()> {
        if self.send(&PULSE_PIN_2).await.is_ok() {
            info!("Cash drawer opened");
            return Ok(());
        }

        warn!("Cash drawer pin 2 failed, trying pin 5");
        self.send(&PULSE_PIN_5).await?;
        info!("Cash drawer opened (pin 5)");
        Ok(())
    }
}
