//! Binance spot REST client for daily candles.
//!
//! `GET /api/v3/klines?symbol=<TICKER>&interval=1d&limit=2` returns yesterday's and
//! today's UTC daily candles, which is exactly one completed race and one running race.
//! Older races are looked up one day at a time with `startTime`/`endTime` bounds.

use super::{
    PriceFeed, TodayQuote, YesterdayQuote, percent_change, unavailable_today,
    unavailable_yesterday,
};
use crate::core::coin::{COINS, Coin};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Open and close of one daily candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyCandle {
    /// Open price
    pub open: f64,
    /// Close price (last traded price for the running candle)
    pub close: f64,
}

const DAY_MILLIS: i64 = 86_400_000;

/// Price feed backed by the Binance public market data API.
#[derive(Clone)]
pub struct BinanceFeed {
    http: Client,
    base_url: String,
}

impl BinanceFeed {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    /// Returns `Error::Http` if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches (yesterday, today) candles for one coin.
    pub async fn fetch_daily_candles(&self, coin: &Coin) -> Result<(DailyCandle, DailyCandle)> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval=1d&limit=2",
            self.base_url, coin.ticker
        );
        let raw = self.get_klines(&url).await?;
        parse_klines(&raw)
    }

    /// Fetches the daily candle of the UTC day `date` for one coin.
    pub async fn fetch_candle_for(&self, coin: &Coin, date: NaiveDate) -> Result<DailyCandle> {
        let start = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval=1d&startTime={}&endTime={}&limit=1",
            self.base_url,
            coin.ticker,
            start,
            start + DAY_MILLIS - 1
        );
        let raw = self.get_klines(&url).await?;
        parse_single_kline(&raw, start)
    }

    async fn get_klines(&self, url: &str) -> Result<serde_json::Value> {
        debug!("Fetching daily candles: {}", url);

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::PriceFeed {
                message: format!("{url} returned {status}: {body}"),
            });
        }

        Ok(resp.json().await?)
    }

    async fn fetch_all(&self) -> Result<Vec<(&'static Coin, DailyCandle, DailyCandle)>> {
        let mut rows = Vec::with_capacity(COINS.len());
        for coin in &COINS {
            let (yesterday, today) = self.fetch_daily_candles(coin).await?;
            rows.push((coin, yesterday, today));
        }
        Ok(rows)
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    async fn today_quotes(&self) -> Vec<TodayQuote> {
        match self.fetch_all().await {
            Ok(rows) => rows
                .into_iter()
                .map(|(coin, _, today)| TodayQuote {
                    coin_id: coin.id,
                    open_price: today.open,
                    current_price: today.close,
                    percent_change: percent_change(today.open, today.close),
                })
                .collect(),
            Err(e) => {
                warn!("Binance today quotes unavailable: {}", e);
                unavailable_today()
            }
        }
    }

    async fn yesterday_quotes(&self) -> Vec<YesterdayQuote> {
        match self.fetch_all().await {
            Ok(rows) => rows
                .into_iter()
                .map(|(coin, yesterday, _)| YesterdayQuote {
                    coin_id: coin.id,
                    open_price: yesterday.open,
                    close_price: yesterday.close,
                    percent_change: percent_change(yesterday.open, yesterday.close),
                })
                .collect(),
            Err(e) => {
                warn!("Binance yesterday quotes unavailable: {}", e);
                unavailable_yesterday()
            }
        }
    }

    async fn closing_quotes(&self, race_date: NaiveDate) -> Vec<YesterdayQuote> {
        let mut quotes = Vec::with_capacity(COINS.len());
        for coin in &COINS {
            match self.fetch_candle_for(coin, race_date).await {
                Ok(candle) => quotes.push(YesterdayQuote {
                    coin_id: coin.id,
                    open_price: candle.open,
                    close_price: candle.close,
                    percent_change: percent_change(candle.open, candle.close),
                }),
                Err(e) => {
                    warn!(race_date = %race_date, "Binance closing quotes unavailable: {}", e);
                    return unavailable_yesterday();
                }
            }
        }
        quotes
    }

    fn name(&self) -> &str {
        "binance"
    }
}

/// Parses a two-candle klines response into (yesterday, today).
///
/// Each kline is an array whose elements 1 and 4 are the open and close prices as strings.
pub fn parse_klines(raw: &serde_json::Value) -> Result<(DailyCandle, DailyCandle)> {
    let klines = raw.as_array().ok_or_else(|| Error::PriceFeed {
        message: "klines response is not an array".to_string(),
    })?;

    let [yesterday, today] = klines.as_slice() else {
        return Err(Error::PriceFeed {
            message: format!("expected 2 daily candles, got {}", klines.len()),
        });
    };

    Ok((parse_candle(yesterday)?, parse_candle(today)?))
}

/// Parses a one-candle klines response for the day opening at `open_time_ms`.
///
/// An empty array or a candle for another day means the exchange has no data for it.
pub fn parse_single_kline(raw: &serde_json::Value, open_time_ms: i64) -> Result<DailyCandle> {
    let klines = raw.as_array().ok_or_else(|| Error::PriceFeed {
        message: "klines response is not an array".to_string(),
    })?;

    let [kline] = klines.as_slice() else {
        return Err(Error::PriceFeed {
            message: format!("expected 1 daily candle, got {}", klines.len()),
        });
    };

    let opened_at = kline.get(0).and_then(serde_json::Value::as_i64);
    if opened_at != Some(open_time_ms) {
        return Err(Error::PriceFeed {
            message: format!("candle opened at {opened_at:?}, expected {open_time_ms}"),
        });
    }

    parse_candle(kline)
}

fn parse_candle(kline: &serde_json::Value) -> Result<DailyCandle> {
    let price_at = |index: usize| -> Result<f64> {
        kline
            .get(index)
            .and_then(|v| match v {
                serde_json::Value::String(s) => s.parse::<f64>().ok(),
                other => other.as_f64(),
            })
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| Error::PriceFeed {
                message: format!("missing or invalid price at index {index}"),
            })
    };

    Ok(DailyCandle {
        open: price_at(1)?,
        close: price_at(4)?,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_klines() {
        let raw = json!([
            [1_710_028_800_000_i64, "68000.00", "69000.00", "67000.00", "68500.00", "1000", 1_710_115_199_999_i64],
            [1_710_115_200_000_i64, "68500.00", "70000.00", "68000.00", "69850.00", "500", 1_710_201_599_999_i64]
        ]);

        let (yesterday, today) = parse_klines(&raw).unwrap();
        assert!((yesterday.open - 68000.0).abs() < 1e-9);
        assert!((yesterday.close - 68500.0).abs() < 1e-9);
        assert!((today.open - 68500.0).abs() < 1e-9);
        assert!((today.close - 69850.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_klines_rejects_bad_shapes() {
        assert!(parse_klines(&json!({"code": -1121, "msg": "Invalid symbol."})).is_err());
        assert!(parse_klines(&json!([[0, "1.0", "1", "1", "1.0"]])).is_err());
        assert!(parse_klines(&json!([[0, "abc"], [0, "1.0", "1", "1", "1.0"]])).is_err());
        assert!(parse_klines(&json!([[0, "0", "1", "1", "1.0"], [0, "1.0", "1", "1", "1.0"]])).is_err());
    }

    #[test]
    fn test_parse_single_kline_checks_the_day() {
        let raw = json!([
            [1_710_028_800_000_i64, "68000.00", "69000.00", "67000.00", "68500.00", "1000", 1_710_115_199_999_i64]
        ]);

        let candle = parse_single_kline(&raw, 1_710_028_800_000).unwrap();
        assert!((candle.open - 68000.0).abs() < 1e-9);
        assert!((candle.close - 68500.0).abs() < 1e-9);

        assert!(parse_single_kline(&raw, 1_710_115_200_000).is_err());
        assert!(parse_single_kline(&json!([]), 1_710_028_800_000).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_upstream_degrades_to_placeholders() {
        // Nothing listens on port 9 locally; the request fails fast
        let feed = BinanceFeed::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let today = feed.today_quotes().await;
        assert_eq!(today.len(), COINS.len());
        assert!(today.iter().all(|q| !q.is_available()));

        let yesterday = feed.yesterday_quotes().await;
        assert!(yesterday.iter().all(|q| !q.is_available()));

        let older = feed
            .closing_quotes(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
            .await;
        assert_eq!(older.len(), COINS.len());
        assert!(older.iter().all(|q| !q.is_available()));
    }
}
