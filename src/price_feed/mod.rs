//! Price feed adapter - daily open/last/close prices for the race coins.
//!
//! Implementations never fail: on any upstream error they log and return zeroed rows
//! of the usual shape. A zero open price therefore means "no data", never "no change",
//! and callers must not settle a race from it.

pub mod binance;

use crate::core::coin::COINS;
use async_trait::async_trait;
use chrono::NaiveDate;

pub use binance::BinanceFeed;

/// Today's (racing) prices for one coin.
#[derive(Debug, Clone, PartialEq)]
pub struct TodayQuote {
    /// Race coin id
    pub coin_id: &'static str,
    /// Price at today's UTC open
    pub open_price: f64,
    /// Latest traded price
    pub current_price: f64,
    /// Change since open, in percent
    pub percent_change: f64,
}

/// Yesterday's (completed) prices for one coin.
#[derive(Debug, Clone, PartialEq)]
pub struct YesterdayQuote {
    /// Race coin id
    pub coin_id: &'static str,
    /// Price at yesterday's UTC open
    pub open_price: f64,
    /// Price at yesterday's UTC close
    pub close_price: f64,
    /// Change over the day, in percent
    pub percent_change: f64,
}

impl TodayQuote {
    /// Zeroed row reported when the upstream is unavailable.
    #[must_use]
    pub const fn unavailable(coin_id: &'static str) -> Self {
        Self {
            coin_id,
            open_price: 0.0,
            current_price: 0.0,
            percent_change: 0.0,
        }
    }

    /// Whether this row carries real data.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.open_price > 0.0
    }
}

impl YesterdayQuote {
    /// Zeroed row reported when the upstream is unavailable.
    #[must_use]
    pub const fn unavailable(coin_id: &'static str) -> Self {
        Self {
            coin_id,
            open_price: 0.0,
            close_price: 0.0,
            percent_change: 0.0,
        }
    }

    /// Whether this row carries real data.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.open_price > 0.0 && self.close_price > 0.0
    }
}

/// Source of daily race prices.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// One row per race coin, in [`COINS`] order.
    async fn today_quotes(&self) -> Vec<TodayQuote>;

    /// One row per race coin, in [`COINS`] order.
    async fn yesterday_quotes(&self) -> Vec<YesterdayQuote>;

    /// Open and close of the UTC day `race_date`, one row per race coin in [`COINS`] order.
    ///
    /// Used to settle races older than yesterday, e.g. after an outage that spanned
    /// a UTC midnight.
    async fn closing_quotes(&self, race_date: NaiveDate) -> Vec<YesterdayQuote>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Placeholder rows for every coin, used when today's prices cannot be fetched.
#[must_use]
pub fn unavailable_today() -> Vec<TodayQuote> {
    COINS
        .iter()
        .map(|c| TodayQuote::unavailable(c.id))
        .collect()
}

/// Placeholder rows for every coin, used when yesterday's prices cannot be fetched.
#[must_use]
pub fn unavailable_yesterday() -> Vec<YesterdayQuote> {
    COINS
        .iter()
        .map(|c| YesterdayQuote::unavailable(c.id))
        .collect()
}

/// Percent change from `open` to `close`; zero when `open` is not positive.
#[must_use]
pub fn percent_change(open: f64, close: f64) -> f64 {
    if open > 0.0 {
        (close - open) / open * 100.0
    } else {
        0.0
    }
}
