use crate::TenderOrchestrator;
use crate::reader::CardReader;
use anyhow::Context;
use cash_drawer::{CashDrawer, NetworkCashDrawer};
use std::sync::Arc;
use std::time::Duration;
use tender_client::{ClientConfig, HttpTenderBackend};

/// Tender engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | TENDER_BACKEND_URL | http://localhost:3000 | Payment backend base URL |
/// | TENDER_BACKEND_TOKEN | - | Bearer token for the backend |
/// | TENDER_REQUEST_TIMEOUT_SECS | 30 | Backend request timeout |
/// | CASH_DRAWER_ADDR | - | Drawer printer `host:port`; no drawer if unset |
/// | CASH_DRAWER_TIMEOUT_MS | 5000 | Drawer connect timeout |
/// | OPEN_DRAWER_ON_COMPLETE | true | Kick the drawer when an order is paid |
/// | LOG_LEVEL | info | Log level |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | - | Directory for daily rolling log files |
///
/// Values from a `.env` file are loaded first.
#[derive(Debug, Clone)]
pub struct TenderConfig {
    pub backend_url: String,
    pub backend_token: Option<String>,
    pub request_timeout_secs: u64,
    pub cash_drawer_addr: Option<String>,
    pub cash_drawer_timeout_ms: u64,
    pub open_drawer_on_complete: bool,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl TenderConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            backend_url: non_empty("TENDER_BACKEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            backend_token: non_empty("TENDER_BACKEND_TOKEN"),
            request_timeout_secs: lookup("TENDER_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            cash_drawer_addr: non_empty("CASH_DRAWER_ADDR"),
            cash_drawer_timeout_ms: lookup("CASH_DRAWER_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            open_drawer_on_complete: lookup("OPEN_DRAWER_ON_COMPLETE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: lookup("LOG_JSON")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: non_empty("LOG_DIR"),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        let config =
            ClientConfig::new(self.backend_url.clone()).with_timeout(self.request_timeout_secs);
        match &self.backend_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }

    /// Network drawer, if one is configured
    pub fn cash_drawer(&self) -> anyhow::Result<Option<Arc<dyn CashDrawer>>> {
        let Some(addr) = &self.cash_drawer_addr else {
            return Ok(None);
        };
        let drawer = NetworkCashDrawer::from_addr(addr)
            .with_context(|| format!("CASH_DRAWER_ADDR={}", addr))?
            .with_timeout(Duration::from_millis(self.cash_drawer_timeout_ms));
        Ok(Some(Arc::new(drawer)))
    }

    /// Wire the HTTP backend, the configured drawer and `reader` together
    pub fn build_orchestrator(
        &self,
        reader: Arc<dyn CardReader>,
    ) -> anyhow::Result<TenderOrchestrator> {
        let http = self
            .client_config()
            .build_http_client()
            .context("Failed to build backend HTTP client")?;
        let backend = Arc::new(HttpTenderBackend::new(http));
        let orchestrator = TenderOrchestrator::new(backend, reader, self.cash_drawer()?)
            .with_open_drawer_on_complete(self.open_drawer_on_complete);
        Ok(orchestrator)
    }

    /// Initialize logging from `LOG_*`
    pub fn init_logging(&self) -> anyhow::Result<()> {
        crate::logger::init_logger_with_file(
            &self.log_level,
            self.log_json,
            self.log_dir.as_deref(),
        )
    }
}

impl Default for TenderConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
