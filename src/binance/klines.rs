//! Market klines service (`GET /fapi/v1/marketKlines`)

use reqwest::Method;
use tracing::debug;

use super::client::{Client, Request, RequestOption};
use super::types::{parse_klines, MarketKline};
use crate::context::Context;
use crate::error::Result;

pub const MARKET_KLINES_ENDPOINT: &str = "/fapi/v1/marketKlines";

/// Builder and executor for one market klines query.
///
/// `symbol` and `interval` are always sent, even when empty; the optional
/// parameters are sent only when set, zero included.
#[derive(Debug)]
pub struct MarketKlinesService<'a> {
    client: &'a Client,
    symbol: String,
    interval: String,
    limit: Option<u32>,
    start_time: Option<i64>,
    end_time: Option<i64>,
}

impl Client {
    pub fn new_market_klines_service(&self) -> MarketKlinesService<'_> {
        MarketKlinesService::new(self)
    }
}

impl<'a> MarketKlinesService<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            symbol: String::new(),
            interval: String::new(),
            limit: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn symbol(&mut self, symbol: impl Into<String>) -> &mut Self {
        self.symbol = symbol.into();
        self
    }

    pub fn interval(&mut self, interval: impl Into<String>) -> &mut Self {
        self.interval = interval.into();
        self
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Window start, epoch milliseconds
    pub fn start_time(&mut self, start_time: i64) -> &mut Self {
        self.start_time = Some(start_time);
        self
    }

    /// Window end, epoch milliseconds
    pub fn end_time(&mut self, end_time: i64) -> &mut Self {
        self.end_time = Some(end_time);
        self
    }

    /// The request this service would send
    pub fn request(&self) -> Request {
        let mut request = Request::new(Method::GET, MARKET_KLINES_ENDPOINT);
        request
            .set_param("symbol", &self.symbol)
            .set_param("interval", &self.interval);

        if let Some(limit) = self.limit {
            request.set_param("limit", limit);
        }
        if let Some(start_time) = self.start_time {
            request.set_param("startTime", start_time);
        }
        if let Some(end_time) = self.end_time {
            request.set_param("endTime", end_time);
        }
        request
    }

    /// Fetch and decode the klines, in the order the API returned them.
    ///
    /// Any transport, status or decode error is returned as is. A response
    /// element that is not a well-formed kline fails the whole call.
    pub async fn execute(&self, ctx: &Context, opts: &[RequestOption]) -> Result<Vec<MarketKline>> {
        debug!(
            "Fetching market klines: symbol={}, interval={}, limit={:?}, start={:?}, end={:?}",
            self.symbol, self.interval, self.limit, self.start_time, self.end_time
        );

        let body = self.client.call_api(ctx, self.request(), opts).await?;
        let klines = parse_klines(&body)?;

        debug!("Decoded {} market klines for {}", klines.len(), self.symbol);
        Ok(klines)
    }
}
