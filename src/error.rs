//! Error types for the futures API client

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by [`Client`](crate::binance::Client) calls and the services built on it.
#[derive(Debug, Error)]
pub enum Error {
    /// Network failure, timeout or body read error from the HTTP layer
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status without a recognizable API error payload
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// Non-success status carrying a Binance `{code, msg}` payload
    #[error("API error {code} (HTTP {status}): {msg}")]
    Api {
        status: StatusCode,
        code: i64,
        msg: String,
    },

    /// Response body is not JSON, or not the expected top-level shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A kline element has fewer positional fields than required
    #[error("invalid kline response: element {index} has {fields} fields, expected at least {min}", min = crate::binance::types::KLINE_MIN_FIELDS)]
    InvalidKlineResponse { index: usize, fields: usize },

    /// A kline field holds the wrong JSON type
    #[error("invalid kline response: element {index} position {position} is not {expected}")]
    InvalidKlineField {
        index: usize,
        position: usize,
        expected: &'static str,
    },

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Keyed or signed request issued by a client without credentials
    #[error("API key and secret are required for this request")]
    MissingCredentials,

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for responses that arrived but did not have the kline shape
    pub fn is_invalid_response(&self) -> bool {
        matches!(
            self,
            Self::InvalidKlineResponse { .. } | Self::InvalidKlineField { .. }
        )
    }

    /// True when the caller's context ended the call
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_response_display() {
        let err = Error::InvalidKlineResponse {
            index: 2,
            fields: 7,
        };
        assert_eq!(
            err.to_string(),
            "invalid kline response: element 2 has 7 fields, expected at least 11"
        );
        assert!(err.is_invalid_response());
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_api_error_display() {
        let err = Error::Api {
            status: StatusCode::BAD_REQUEST,
            code: -1121,
            msg: "Invalid symbol.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error -1121 (HTTP 400 Bad Request): Invalid symbol."
        );
        assert!(!err.is_invalid_response());
    }

    #[test]
    fn test_cancellation_kinds() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(Error::DeadlineExceeded.is_cancellation());
        assert!(!Error::MissingCredentials.is_cancellation());
    }
}
