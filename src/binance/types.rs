//! Market kline record and its positional wire format

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Minimum number of positional fields in one kline element
pub const KLINE_MIN_FIELDS: usize = 11;

/// Futures market kline
///
/// The API returns each kline as an array:
/// `[open_time, open, high, low, close, volume, close_time,
///   quote_asset_volume, trades, taker_buy_base, taker_buy_quote, ...]`.
/// Prices and volumes stay as decimal strings. The two taker-buy volumes at
/// positions 9 and 10 are not kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketKline {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub close_time: i64,
    pub quote_asset_volume: String,
    pub trade_num: i64,
}

impl MarketKline {
    /// Parse element `index` of a kline response.
    ///
    /// Fails if the element is not an array of at least [`KLINE_MIN_FIELDS`]
    /// values, or if any captured position has the wrong JSON type.
    pub fn from_raw(index: usize, raw: &Value) -> Result<Self> {
        let fields = match raw.as_array() {
            Some(fields) if fields.len() >= KLINE_MIN_FIELDS => fields,
            Some(fields) => {
                return Err(Error::InvalidKlineResponse {
                    index,
                    fields: fields.len(),
                })
            }
            None => return Err(Error::InvalidKlineResponse { index, fields: 0 }),
        };

        let int_at = |position: usize| -> Result<i64> {
            fields[position]
                .as_i64()
                .ok_or(Error::InvalidKlineField {
                    index,
                    position,
                    expected: "an integer",
                })
        };
        let str_at = |position: usize| -> Result<String> {
            fields[position]
                .as_str()
                .map(str::to_owned)
                .ok_or(Error::InvalidKlineField {
                    index,
                    position,
                    expected: "a string",
                })
        };

        Ok(MarketKline {
            open_time: int_at(0)?,
            open: str_at(1)?,
            high: str_at(2)?,
            low: str_at(3)?,
            close: str_at(4)?,
            volume: str_at(5)?,
            close_time: int_at(6)?,
            quote_asset_volume: str_at(7)?,
            trade_num: int_at(8)?,
        })
    }
}

/// Decode a full kline response body, preserving element order.
///
/// The first malformed element aborts the decode; no partial result is returned.
pub fn parse_klines(body: &[u8]) -> Result<Vec<MarketKline>> {
    let rows: Vec<Value> = serde_json::from_slice(body)?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| MarketKline::from_raw(index, row))
        .collect()
}

/// Binance error payload returned with non-success statuses, e.g.
/// `{ "code": -1121, "msg": "Invalid symbol." }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorPayload {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"[[1620000000000,"100.0","105.0","99.0","102.0","1500.5",1620003599999,"153075.75",42,"0","0"]]"#;

    #[test]
    fn test_parse_sample_response() {
        let klines = parse_klines(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            klines,
            vec![MarketKline {
                open_time: 1620000000000,
                open: "100.0".to_string(),
                high: "105.0".to_string(),
                low: "99.0".to_string(),
                close: "102.0".to_string(),
                volume: "1500.5".to_string(),
                close_time: 1620003599999,
                quote_asset_volume: "153075.75".to_string(),
                trade_num: 42,
            }]
        );
    }

    #[test]
    fn test_extra_trailing_fields_accepted() {
        let raw = json!([1, "1", "2", "0.5", "1.5", "10", 2, "15", 3, "4", "5", "0"]);
        let kline = MarketKline::from_raw(0, &raw).unwrap();
        assert_eq!(kline.open_time, 1);
        assert_eq!(kline.trade_num, 3);
    }

    #[test]
    fn test_short_element_rejected() {
        let raw = json!([1, "1", "2", "0.5", "1.5", "10", 2, "15", 3, "4"]);
        let err = MarketKline::from_raw(4, &raw).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKlineResponse {
                index: 4,
                fields: 10
            }
        ));
    }

    #[test]
    fn test_non_array_element_rejected() {
        let err = MarketKline::from_raw(0, &json!({"openTime": 1})).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKlineResponse { index: 0, fields: 0 }
        ));
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        // open price sent as a number
        let raw = json!([1, 100.0, "2", "0.5", "1.5", "10", 2, "15", 3, "4", "5"]);
        let err = MarketKline::from_raw(0, &raw).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKlineField {
                index: 0,
                position: 1,
                expected: "a string"
            }
        ));

        // trade count sent as a string
        let raw = json!([1, "1", "2", "0.5", "1.5", "10", 2, "15", "3", "4", "5"]);
        let err = MarketKline::from_raw(0, &raw).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKlineField { position: 8, .. }
        ));
    }

    #[test]
    fn test_malformed_element_discards_earlier_rows() {
        let body = json!([
            [1, "1", "2", "0.5", "1.5", "10", 2, "15", 3, "4", "5"],
            [2, "1", "2", "0.5", "1.5", "10", 3, "15", 3, "4", "5"],
            [3, "1", "2"]
        ])
        .to_string();
        let err = parse_klines(body.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKlineResponse { index: 2, fields: 3 }
        ));
    }

    #[test]
    fn test_non_array_body_is_decode_error() {
        let err = parse_klines(br#"{"code":0}"#).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));

        let err = parse_klines(b"not json").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_empty_array() {
        assert!(parse_klines(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let kline = parse_klines(SAMPLE.as_bytes()).unwrap().remove(0);
        let value = serde_json::to_value(&kline).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for key in [
            "openTime",
            "open",
            "high",
            "low",
            "close",
            "volume",
            "closeTime",
            "quoteAssetVolume",
            "tradeNum",
        ] {
            assert!(keys.contains(&key), "missing {}", key);
        }
        assert_eq!(keys.len(), 9);
        assert_eq!(value["tradeNum"], json!(42));
    }
}
