//! Shared Binance futures API client
//!
//! Every endpoint service builds a [`Request`] and hands it to
//! [`Client::call_api`], which resolves the URL, applies per-call
//! [`RequestOption`]s, signs when required, and races the HTTP call against the
//! caller's [`Context`].
//!
//! # Example
//! ```no_run
//! use futures_klines::binance::Client;
//! use futures_klines::context::Context;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::from_env()?;
//!     let klines = client
//!         .new_market_klines_service()
//!         .symbol("BTCUSDT")
//!         .interval("1h")
//!         .limit(100)
//!         .execute(&Context::background(), &[])
//!         .await?;
//!     println!("Fetched {} klines", klines.len());
//!     Ok(())
//! }
//! ```

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use tracing::{debug, warn};

use super::auth::{Credentials, API_KEY_HEADER};
use super::types::ApiErrorPayload;
use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{Error, Result};

/// How a request authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityType {
    /// Public endpoint
    #[default]
    None,
    /// API key header only
    ApiKey,
    /// API key header plus `timestamp` and HMAC `signature` parameters
    Signed,
}

/// One API call: method, endpoint path, ordered query parameters and headers
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub endpoint: String,
    pub security: SecurityType,
    params: Vec<(String, String)>,
    headers: HeaderMap,
    recv_window: Option<i64>,
}

impl Request {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            security: SecurityType::None,
            params: Vec::new(),
            headers: HeaderMap::new(),
            recv_window: None,
        }
    }

    pub fn with_security(mut self, security: SecurityType) -> Self {
        self.security = security;
        self
    }

    /// Set a query parameter, replacing any earlier value for `key`
    pub fn set_param(&mut self, key: &str, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key.to_string(), value)),
        }
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn recv_window(&self) -> Option<i64> {
        self.recv_window
    }
}

/// Per-call overrides forwarded to the transport
#[derive(Debug, Clone)]
pub enum RequestOption {
    /// `recvWindow` for signed requests, overriding the client default
    RecvWindow(i64),
    Header(HeaderName, HeaderValue),
    Headers(HeaderMap),
}

impl RequestOption {
    pub fn apply(&self, request: &mut Request) {
        match self {
            Self::RecvWindow(window) => request.recv_window = Some(*window),
            Self::Header(name, value) => {
                request.headers.insert(name.clone(), value.clone());
            }
            Self::Headers(headers) => {
                for (name, value) in headers {
                    request.headers.insert(name.clone(), value.clone());
                }
            }
        }
    }
}

/// Binance USD-M futures API client
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
    recv_window: Option<i64>,
}

impl Client {
    /// Create a client from configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
            recv_window: config.recv_window,
        })
    }

    /// Create a client from environment variables (see [`ClientConfig::from_env`])
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create an unauthenticated client against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::default().with_base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Send `request` and return the raw response body.
    ///
    /// Fails with [`Error::Cancelled`] or [`Error::DeadlineExceeded`] if `ctx`
    /// ends first; an already-ended context never sends. Statuses of 400 and
    /// above map to [`Error::Api`] or [`Error::Http`].
    pub async fn call_api(
        &self,
        ctx: &Context,
        mut request: Request,
        opts: &[RequestOption],
    ) -> Result<Vec<u8>> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        for opt in opts {
            opt.apply(&mut request);
        }

        let (url, headers) = self.prepare(&request)?;
        debug!(
            "{} {} params={:?}",
            request.method,
            request.endpoint,
            request.params()
        );

        let send = async {
            let response = self
                .http
                .request(request.method.clone(), url)
                .headers(headers)
                .send()
                .await?;

            let status = response.status();
            let body = response.bytes().await?;

            if status.is_client_error() || status.is_server_error() {
                let err = error_from_response(status, &body);
                warn!("{} {} failed: {}", request.method, request.endpoint, err);
                return Err(err);
            }

            debug!("{} {} -> {} ({} bytes)", request.method, request.endpoint, status, body.len());
            Ok::<_, Error>(body.to_vec())
        };

        tokio::select! {
            biased;
            err = ctx.done() => {
                debug!("{} {} aborted: {}", request.method, request.endpoint, err);
                Err(err)
            }
            result = send => result,
        }
    }

    /// Resolve the final URL and headers, adding auth and signature when required
    fn prepare(&self, request: &Request) -> Result<(Url, HeaderMap)> {
        let raw = format!("{}{}", self.base_url, request.endpoint);
        let mut url = Url::parse(&raw).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))?;
        let mut headers = request.headers.clone();
        let mut params = request.params.clone();

        let credentials = match request.security {
            SecurityType::None => None,
            SecurityType::ApiKey | SecurityType::Signed => {
                let credentials = self.credentials.as_ref().ok_or(Error::MissingCredentials)?;
                let key = HeaderValue::from_str(credentials.api_key())
                    .map_err(|_| Error::Config("API key is not a valid header value".to_string()))?;
                headers.insert(API_KEY_HEADER, key);
                Some(credentials)
            }
        };

        if request.security == SecurityType::Signed {
            if let Some(window) = request.recv_window.or(self.recv_window) {
                params.push(("recvWindow".to_string(), window.to_string()));
            }
            params.push((
                "timestamp".to_string(),
                chrono::Utc::now().timestamp_millis().to_string(),
            ));
        }

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }

        if let (SecurityType::Signed, Some(credentials)) = (request.security, credentials) {
            let signature = credentials.sign(url.query().unwrap_or_default());
            url.query_pairs_mut().append_pair("signature", &signature);
        }

        Ok((url, headers))
    }
}

fn error_from_response(status: StatusCode, body: &[u8]) -> Error {
    match serde_json::from_slice::<ApiErrorPayload>(body) {
        Ok(payload) => Error::Api {
            status,
            code: payload.code,
            msg: payload.msg,
        },
        Err(_) => Error::Http {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}
