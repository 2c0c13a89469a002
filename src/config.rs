//! Client configuration
//!
//! Built in code with the `with_*` methods, or loaded from environment
//! variables (a `.env` file in the working directory is honoured):
//!
//! - `BINANCE_API_KEY` / `BINANCE_SECRET_KEY`: credentials, both or neither
//! - `BINANCE_FUTURES_BASE_URL`: base URL override
//! - `BINANCE_USE_TESTNET`: `1` or `true` selects the futures testnet
//! - `BINANCE_HTTP_TIMEOUT_SECS`: request timeout (default 30)
//! - `BINANCE_RECV_WINDOW`: default receive window for signed requests (ms)

use std::time::Duration;

use crate::binance::Credentials;
use crate::error::{Error, Result};

/// Base URL for the USD-M futures API
pub const FUTURES_BASE_URL: &str = "https://fapi.binance.com";

/// Base URL for the USD-M futures testnet
pub const FUTURES_TESTNET_BASE_URL: &str = "https://testnet.binancefuture.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Required only for keyed and signed endpoints
    pub credentials: Option<Credentials>,
    /// Request timeout, enforced by the HTTP client
    pub timeout: Duration,
    /// Default `recvWindow` for signed requests
    pub recv_window: Option<i64>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: FUTURES_BASE_URL.to_string(),
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            recv_window: None,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment and `.env`
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if lookup("BINANCE_USE_TESTNET").is_some_and(|v| is_truthy(&v)) {
            config = config.testnet();
        }
        if let Some(url) = lookup("BINANCE_FUTURES_BASE_URL").filter(|v| !v.is_empty()) {
            config = config.with_base_url(url);
        }

        match (lookup("BINANCE_API_KEY"), lookup("BINANCE_SECRET_KEY")) {
            (Some(key), Some(secret)) => config = config.with_credentials(key, secret),
            (None, None) => {}
            _ => {
                return Err(Error::Config(
                    "BINANCE_API_KEY and BINANCE_SECRET_KEY must be set together".to_string(),
                ))
            }
        }

        if let Some(raw) = lookup("BINANCE_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("BINANCE_HTTP_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup("BINANCE_RECV_WINDOW") {
            let window: i64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("BINANCE_RECV_WINDOW is not a number: {}", raw))
            })?;
            config = config.with_recv_window(window);
        }

        Ok(config)
    }

    /// Point at the futures testnet
    pub fn testnet(self) -> Self {
        self.with_base_url(FUTURES_TESTNET_BASE_URL)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(api_key, secret_key));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_recv_window(mut self, recv_window: i64) -> Self {
        self.recv_window = Some(recv_window);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
