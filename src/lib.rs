//! Binance USD-M futures market klines
//!
//! A typed client for `GET /fapi/v1/marketKlines`, built on a small shared API
//! client that also handles keyed and HMAC-signed requests.
//!
//! ```no_run
//! use std::time::Duration;
//! use futures_klines::binance::Client;
//! use futures_klines::context::Context;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::from_env()?;
//!     let ctx = Context::background().with_timeout(Duration::from_secs(10));
//!
//!     let klines = client
//!         .new_market_klines_service()
//!         .symbol("BTCUSDT")
//!         .interval("1h")
//!         .start_time(1620000000000)
//!         .limit(24)
//!         .execute(&ctx, &[])
//!         .await?;
//!
//!     for kline in &klines {
//!         println!("{} close={}", kline.open_time, kline.close);
//!     }
//!     Ok(())
//! }
//! ```

pub mod binance;
pub mod config;
pub mod context;
pub mod error;

pub use binance::{Client, MarketKline, MarketKlinesService};
pub use config::ClientConfig;
pub use context::{CancelHandle, Context};
pub use error::{Error, Result};
