//! Klines command - fetch futures market klines and write JSON or CSV

use anyhow::{Context as _, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};
use clap::ValueEnum;
use futures_klines::{Client, ClientConfig, Context, MarketKline};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug)]
pub struct KlinesArgs {
    pub symbol: String,
    pub interval: String,
    pub limit: Option<u32>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub testnet: bool,
    pub timeout: Option<u64>,
}

pub fn run(args: KlinesArgs) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fetch_and_write(args))
}

async fn fetch_and_write(args: KlinesArgs) -> Result<()> {
    let start = args.start.as_deref().map(parse_time).transpose()?;
    let end = args.end.as_deref().map(parse_time).transpose()?;

    let mut config = ClientConfig::from_env().context("Failed to load client configuration")?;
    if args.testnet {
        config = config.testnet();
    }
    info!("Using {}", config.base_url);
    let client = Client::new(config).context("Failed to create API client")?;

    let (ctx, cancel) = Context::with_cancel();
    let ctx = match args.timeout {
        Some(secs) => ctx.with_timeout(Duration::from_secs(secs)),
        None => ctx,
    };

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, cancelling request...");
                cancel.cancel();
            }
            Err(e) => warn!("Error setting up signal handler: {}", e),
        }
    });

    let mut service = client.new_market_klines_service();
    service.symbol(&args.symbol).interval(&args.interval);
    if let Some(limit) = args.limit {
        service.limit(limit);
    }
    if let Some(start) = start {
        service.start_time(start);
    }
    if let Some(end) = end {
        service.end_time(end);
    }

    let klines = service
        .execute(&ctx, &[])
        .await
        .with_context(|| format!("Failed to fetch klines for {} {}", args.symbol, args.interval))?;

    info!(
        "Fetched {} klines for {} {}",
        klines.len(),
        args.symbol,
        args.interval
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_klines(&klines, args.format, BufWriter::new(file))?;
            info!("Saved {} rows to {}", klines.len(), path.display());
        }
        None => write_klines(&klines, args.format, std::io::stdout().lock())?,
    }

    Ok(())
}

/// Write klines in the requested format
pub fn write_klines<W: Write>(klines: &[MarketKline], format: OutputFormat, mut writer: W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, klines)?;
            writeln!(writer)?;
            writer.flush()?;
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for kline in klines {
                csv_writer.serialize(kline)?;
            }
            csv_writer.flush()?;
        }
    }
    Ok(())
}

/// Parse a time argument into epoch milliseconds.
///
/// Accepts raw milliseconds, RFC 3339, or a `YYYY-MM-DD` date (UTC midnight).
pub fn parse_time(input: &str) -> Result<i64> {
    let input = input.trim();

    if let Ok(ms) = input.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
    }

    anyhow::bail!(
        "Invalid time '{}': expected epoch milliseconds, RFC 3339, or YYYY-MM-DD",
        input
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MarketKline {
        MarketKline {
            open_time: 1620000000000,
            open: "100.0".to_string(),
            high: "105.0".to_string(),
            low: "99.0".to_string(),
            close: "102.0".to_string(),
            volume: "1500.5".to_string(),
            close_time: 1620003599999,
            quote_asset_volume: "153075.75".to_string(),
            trade_num: 42,
        }
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("1620000000000").unwrap(), 1620000000000);
        assert_eq!(parse_time("0").unwrap(), 0);
        assert_eq!(parse_time("2021-05-03").unwrap(), 1620000000000);
        assert_eq!(
            parse_time("2021-05-03T00:00:00Z").unwrap(),
            1620000000000
        );
        assert_eq!(
            parse_time("2021-05-03T02:00:00+02:00").unwrap(),
            1620000000000
        );
        assert!(parse_time("yesterday").is_err());
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_klines(&[sample()], OutputFormat::Csv, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "openTime,open,high,low,close,volume,closeTime,quoteAssetVolume,tradeNum"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1620000000000,100.0,105.0,99.0,102.0,1500.5,1620003599999,153075.75,42"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_klines(&[sample()], OutputFormat::Json, &mut out).unwrap();
        let parsed: Vec<MarketKline> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, vec![sample()]);
    }
}
