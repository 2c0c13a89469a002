//! Binance USD-M futures API client
//!
//! The shared [`Client`] performs public, keyed and signed calls; endpoint
//! services such as [`MarketKlinesService`] build on it.

pub mod auth;
pub mod client;
pub mod klines;
pub mod types;

pub use auth::Credentials;
pub use client::{Client, Request, RequestOption, SecurityType};
pub use klines::{MarketKlinesService, MARKET_KLINES_ENDPOINT};
pub use types::{MarketKline, KLINE_MIN_FIELDS};
