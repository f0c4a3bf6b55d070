//! Race bookkeeping - race rows, per-coin prices and the three-race overview.

use crate::{
    core::{
        bet, clock,
        clock::RaceState,
        coin::{COINS, Coin},
    },
    entities::{BetModel, Race, RaceCoin, race, race_coin},
    errors::Result,
    price_feed::TodayQuote,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::info;

/// One coin's line in a race summary.
#[derive(Debug, Clone)]
pub struct CoinLine {
    /// The coin
    pub coin: &'static Coin,
    /// Open price at race start
    pub start_price: Option<f64>,
    /// Live price while racing, close price once completed
    pub last_price: Option<f64>,
    /// Percent change since start
    pub percent_change: Option<f64>,
}

/// Snapshot of one race as shown to a user.
#[derive(Debug, Clone)]
pub struct RaceSummary {
    /// UTC race date
    pub race_date: NaiveDate,
    /// Calendar-derived state
    pub state: RaceState,
    /// One line per race coin, in feed order
    pub coins: Vec<CoinLine>,
    /// Winning coin once settled
    pub winner: Option<&'static Coin>,
    /// Whether settlement has run
    pub settled: bool,
    /// The viewing user's bet on this race
    pub my_bet: Option<BetModel>,
}

/// Upcoming, racing and last completed race.
#[derive(Debug, Clone)]
pub struct RaceOverview {
    /// Tomorrow's race (betting open)
    pub upcoming: RaceSummary,
    /// Today's race
    pub racing: RaceSummary,
    /// Yesterday's race
    pub completed: RaceSummary,
}

/// Returns the race row for `race_key`, inserting an empty one if missing.
pub async fn ensure_race<C>(db: &C, race_key: &str) -> Result<race::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = Race::find_by_id(race_key.to_string()).one(db).await? {
        return Ok(existing);
    }

    let row = race::ActiveModel {
        race_date: Set(race_key.to_string()),
        winner_coin_id: Set(None),
        started_at: Set(None),
        settled_at: Set(None),
    };
    row.insert(db).await.map_err(Into::into)
}

/// Prices to write for one coin; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinPrices {
    /// Open price at race start
    pub start_price: Option<f64>,
    /// Close price at settlement
    pub end_price: Option<f64>,
    /// Percent change at settlement
    pub percent_change: Option<f64>,
}

/// Inserts or updates the price row of one coin in one race.
pub async fn upsert_race_coin<C>(
    db: &C,
    race_key: &str,
    coin_id: &str,
    prices: CoinPrices,
) -> Result<race_coin::Model>
where
    C: ConnectionTrait,
{
    let existing = RaceCoin::find()
        .filter(race_coin::Column::RaceDate.eq(race_key))
        .filter(race_coin::Column::CoinId.eq(coin_id))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active: race_coin::ActiveModel = row.into();
        if let Some(start) = prices.start_price {
            active.start_price = Set(Some(start));
        }
        if let Some(end) = prices.end_price {
            active.end_price = Set(Some(end));
        }
        if let Some(change) = prices.percent_change {
            active.percent_change = Set(Some(change));
        }
        return active.update(db).await.map_err(Into::into);
    }

    let row = race_coin::ActiveModel {
        race_date: Set(race_key.to_string()),
        coin_id: Set(coin_id.to_string()),
        start_price: Set(prices.start_price),
        end_price: Set(prices.end_price),
        percent_change: Set(prices.percent_change),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Whether start prices have been recorded for `race_date`.
pub async fn is_race_started(db: &DatabaseConnection, race_date: NaiveDate) -> Result<bool> {
    Ok(Race::find_by_id(clock::format_race_date(race_date))
        .one(db)
        .await?
        .is_some_and(|r| r.started_at.is_some()))
}

/// Records the start (open) prices of today's race.
///
/// Runs once per race: returns `false` without writing if the race already has a
/// start, or if the feed had no usable rows.
pub async fn record_race_start(
    db: &DatabaseConnection,
    race_date: NaiveDate,
    quotes: &[TodayQuote],
    now: DateTime<Utc>,
) -> Result<bool> {
    let available: Vec<&TodayQuote> = quotes.iter().filter(|q| q.is_available()).collect();
    if available.is_empty() {
        return Ok(false);
    }

    let race_key = clock::format_race_date(race_date);
    let txn = db.begin().await?;

    let race_row = ensure_race(&txn, &race_key).await?;
    if race_row.started_at.is_some() {
        return Ok(false);
    }

    for quote in &available {
        upsert_race_coin(
            &txn,
            &race_key,
            quote.coin_id,
            CoinPrices {
                start_price: Some(quote.open_price),
                ..CoinPrices::default()
            },
        )
        .await?;
    }

    let mut active: race::ActiveModel = race_row.into();
    active.started_at = Set(Some(now));
    active.update(&txn).await?;

    txn.commit().await?;
    info!(race_date = %race_key, coins = available.len(), "Race start prices recorded");
    Ok(true)
}

async fn summarize(
    db: &DatabaseConnection,
    race_date: NaiveDate,
    now: DateTime<Utc>,
    user_id: Option<i64>,
    live: Option<&[TodayQuote]>,
) -> Result<RaceSummary> {
    let race_key = clock::format_race_date(race_date);
    let race_row = Race::find_by_id(race_key.clone()).one(db).await?;
    let rows = RaceCoin::find()
        .filter(race_coin::Column::RaceDate.eq(race_key.as_str()))
        .all(db)
        .await?;

    let coins = COINS
        .iter()
        .map(|coin| {
            let stored = rows.iter().find(|r| r.coin_id == coin.id);
            let quote = live
                .and_then(|quotes| quotes.iter().find(|q| q.coin_id == coin.id))
                .filter(|q| q.is_available());
            match quote {
                Some(q) => CoinLine {
                    coin,
                    start_price: stored.and_then(|r| r.start_price).or(Some(q.open_price)),
                    last_price: Some(q.current_price),
                    percent_change: Some(q.percent_change),
                },
                None => CoinLine {
                    coin,
                    start_price: stored.and_then(|r| r.start_price),
                    last_price: stored.and_then(|r| r.end_price),
                    percent_change: stored.and_then(|r| r.percent_change),
                },
            }
        })
        .collect();

    let winner = race_row
        .as_ref()
        .and_then(|r| r.winner_coin_id.as_deref())
        .and_then(crate::core::coin::find_coin);
    let settled = race_row.as_ref().is_some_and(|r| r.settled_at.is_some());

    let my_bet = match user_id {
        Some(id) => bet::get_bet_for_race(db, id, race_date).await?,
        None => None,
    };

    Ok(RaceSummary {
        race_date,
        state: clock::race_state(race_date, now),
        coins,
        winner,
        settled,
        my_bet,
    })
}

/// Builds the upcoming / racing / completed view, using `live` quotes for today's race.
pub async fn race_overview(
    db: &DatabaseConnection,
    user_id: Option<i64>,
    live: &[TodayQuote],
    now: DateTime<Utc>,
) -> Result<RaceOverview> {
    Ok(RaceOverview {
        upcoming: summarize(db, clock::upcoming_race_date(now), now, user_id, None).await?,
        racing: summarize(db, clock::today_race_date(now), now, user_id, Some(live)).await?,
        completed: summarize(db, clock::completed_race_date(now), now, user_id, None).await?,
    })
}
