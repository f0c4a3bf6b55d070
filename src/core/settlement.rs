//! Race settlement - decides the winner of a finished race and pays out its bets.
//!
//! Settlement is all-or-nothing: every pending bet of the race, the ledger credits,
//! the closing prices and the race's `settled_at` marker are written in one
//! transaction. A race whose marker is set is never settled again, so re-running
//! settlement for the same date is a no-op.

use crate::{
    core::{
        bet::payout_for,
        clock,
        coin::{self, Coin},
        ledger,
        race::{self, CoinPrices},
    },
    entities::{Bet, BetStatus, Race, bet},
    errors::{Error, Result},
    price_feed::YesterdayQuote,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Summary of one settlement run.
#[derive(Debug, Clone)]
pub struct SettlementResult {
    /// Race that was settled
    pub race_date: NaiveDate,
    /// Winning coin
    pub winner: &'static Coin,
    /// Number of pending bets visited
    pub bets_settled: usize,
    /// Bets that picked the winner
    pub winning_bets: usize,
    /// Bets that picked another coin
    pub losing_bets: usize,
    /// Points credited across all winners
    pub total_payout: i64,
}

/// Picks the coin with the highest percent change among rows that carry data.
///
/// Ties go to the first row in feed order. Returns `None` when no row is available,
/// which means the race cannot be settled yet.
#[must_use]
pub fn determine_winner(quotes: &[YesterdayQuote]) -> Option<&'static str> {
    let mut best: Option<&YesterdayQuote> = None;
    for quote in quotes.iter().filter(|q| q.is_available()) {
        if best.is_none_or(|b| quote.percent_change > b.percent_change) {
            best = Some(quote);
        }
    }
    best.map(|q| q.coin_id)
}

/// Whether settlement has already run for `race_date`.
pub async fn is_race_settled(db: &DatabaseConnection, race_date: NaiveDate) -> Result<bool> {
    Ok(Race::find_by_id(clock::format_race_date(race_date))
        .one(db)
        .await?
        .is_some_and(|r| r.settled_at.is_some()))
}

/// Finished races (before `today`) that still hold pending bets, oldest first.
///
/// A race normally settles the day after it ran. Anything older showing up here missed
/// its settlement, e.g. because the price feed was down across a UTC midnight.
pub async fn unsettled_race_dates(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let pending = Bet::find()
        .filter(bet::Column::Status.eq(BetStatus::Pending))
        .filter(bet::Column::RaceDate.lt(clock::format_race_date(today)))
        .order_by_asc(bet::Column::RaceDate)
        .all(db)
        .await?;

    let dates: BTreeSet<NaiveDate> = pending
        .iter()
        .filter_map(|b| clock::parse_race_date(&b.race_date))
        .collect();

    let mut unsettled = Vec::with_capacity(dates.len());
    for date in dates {
        if !is_race_settled(db, date).await? {
            unsettled.push(date);
        }
    }
    Ok(unsettled)
}

/// Settles every pending bet of `race_date` against `winner_coin_id`.
///
/// # Returns
/// * `Ok(Some(result))` - the race was settled by this call
/// * `Ok(None)` - the race was already settled; nothing was touched
///
/// # Errors
/// `Error::InvalidCoin` for an unknown winner; database errors roll back the whole run.
#[instrument(skip(db, quotes))]
pub async fn settle_race(
    db: &DatabaseConnection,
    race_date: NaiveDate,
    winner_coin_id: &str,
    quotes: &[YesterdayQuote],
    now: DateTime<Utc>,
) -> Result<Option<SettlementResult>> {
    let winner = coin::find_coin(winner_coin_id).ok_or_else(|| Error::InvalidCoin {
        coin_id: winner_coin_id.to_string(),
    })?;
    let race_key = clock::format_race_date(race_date);

    let txn = db.begin().await?;

    let race_row = race::ensure_race(&txn, &race_key).await?;
    if race_row.settled_at.is_some() {
        info!(race_date = %race_key, "Race already settled, skipping");
        return Ok(None);
    }

    let pending = Bet::find()
        .filter(bet::Column::RaceDate.eq(race_key.as_str()))
        .filter(bet::Column::Status.eq(BetStatus::Pending))
        .all(&txn)
        .await?;

    let mut result = SettlementResult {
        race_date,
        winner,
        bets_settled: pending.len(),
        winning_bets: 0,
        losing_bets: 0,
        total_payout: 0,
    };

    for placed in pending {
        let user_id = placed.user_id;
        let won = placed.coin_id == winner.id;
        let payout = if won { payout_for(placed.stake) } else { 0 };

        let mut active: bet::ActiveModel = placed.into();
        active.status = Set(if won { BetStatus::Won } else { BetStatus::Lost });
        active.payout = Set(payout);
        active.settled_at = Set(Some(now));
        active.update(&txn).await?;

        if won {
            ledger::credit(&txn, user_id, payout).await?;
            ledger::record_history(
                &txn,
                user_id,
                None,
                payout,
                format!("Race {race_key} won with {}", winner.symbol),
                now,
            )
            .await?;
            result.winning_bets += 1;
            result.total_payout += payout;
        } else {
            result.losing_bets += 1;
        }
    }

    for quote in quotes.iter().filter(|q| q.is_available()) {
        race::upsert_race_coin(
            &txn,
            &race_key,
            quote.coin_id,
            CoinPrices {
                start_price: None,
                end_price: Some(quote.close_price),
                percent_change: Some(quote.percent_change),
            },
        )
        .await?;
    }

    let mut race_active: crate::entities::race::ActiveModel = race_row.into();
    race_active.winner_coin_id = Set(Some(winner.id.to_string()));
    race_active.settled_at = Set(Some(now));
    race_active.update(&txn).await?;

    txn.commit().await?;

    info!(
        race_date = %race_key,
        winner = winner.id,
        bets = result.bets_settled,
        winners = result.winning_bets,
        payout = result.total_payout,
        "Race settled"
    );

    Ok(Some(result))
}

/// One-line summary of a settlement for logs and chat announcements.
#[must_use]
pub fn format_settlement_summary(result: &SettlementResult) -> String {
    format!(
        "Race {} settled - winner {} ({}) | {} bets: {} won, {} lost | {} points paid",
        clock::format_race_date(result.race_date),
        result.winner.symbol,
        result.winner.name,
        result.bets_settled,
        result.winning_bets,
        result.losing_bets,
        result.total_payout
    )
}
