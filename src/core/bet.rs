//! Bet placement and bet queries.
//!
//! A bet always targets the upcoming race (tomorrow, UTC). Placement validates in a
//! fixed order and then debits the stake and inserts the bet in one transaction.

use crate::{
    core::{
        clock,
        coin::{self, Coin},
        ledger,
    },
    entities::{Bet, BetStatus, User, bet},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, prelude::*};
use tracing::info;

/// Largest stake accepted for a single bet.
pub const MAX_STAKE: i64 = 1000;

/// Multiplier applied to the stake of a winning bet.
pub const PAYOUT_MULTIPLIER: i64 = 4;

/// A freshly placed bet plus values computed for display.
#[derive(Debug, Clone)]
pub struct PlacedBet {
    /// The stored bet
    pub bet: bet::Model,
    /// Display symbol of the chosen coin
    pub coin_symbol: &'static str,
    /// Balance after the stake was taken
    pub remaining_points: i64,
    /// What the bet pays if the coin wins
    pub potential_payout: i64,
}

/// Payout for a winning stake.
#[must_use]
pub const fn payout_for(stake: i64) -> i64 {
    stake.saturating_mul(PAYOUT_MULTIPLIER)
}

/// Checks `0 < stake <= MAX_STAKE`.
pub fn validate_stake(stake: i64) -> Result<()> {
    if stake <= 0 || stake > MAX_STAKE {
        return Err(Error::InvalidStake {
            stake,
            max: MAX_STAKE,
        });
    }
    Ok(())
}

/// Resolves a coin id to one of the race coins.
pub fn validate_coin(coin_id: &str) -> Result<&'static Coin> {
    coin::find_coin(coin_id).ok_or_else(|| Error::InvalidCoin {
        coin_id: coin_id.to_string(),
    })
}

/// Places a bet on tomorrow's race.
///
/// Validation order (first failure wins): stake range, coin id, balance, existing bet.
/// The stake is then taken with a conditional debit and the bet inserted in the same
/// transaction; the unique (`user_id`, `race_date`) index catches a concurrent double
/// submit and rolls the debit back.
pub async fn place_bet(
    db: &DatabaseConnection,
    user_id: i64,
    coin_id: &str,
    stake: i64,
    now: DateTime<Utc>,
) -> Result<PlacedBet> {
    validate_stake(stake)?;
    let coin = validate_coin(coin_id)?;

    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })?;
    if user.total_points < stake {
        return Err(Error::InsufficientPoints {
            current: user.total_points,
            required: stake,
        });
    }

    let race_date = clock::upcoming_race_date(now);
    let race_key = clock::format_race_date(race_date);
    if get_bet_for_race(db, user_id, race_date).await?.is_some() {
        return Err(Error::DuplicateBet {
            race_date: race_key,
        });
    }

    stake_and_insert(db, user_id, coin, stake, race_key, now).await
}

/// Debits the stake and inserts the bet in one transaction.
///
/// A unique-index violation on insert means another bet for the same race landed first;
/// it surfaces as `DuplicateBet` and the debit is rolled back with the transaction.
async fn stake_and_insert(
    db: &DatabaseConnection,
    user_id: i64,
    coin: &'static Coin,
    stake: i64,
    race_key: String,
    now: DateTime<Utc>,
) -> Result<PlacedBet> {
    let txn = db.begin().await?;

    let updated = ledger::try_debit(&txn, user_id, stake).await?;

    let new_bet = bet::ActiveModel {
        user_id: Set(user_id),
        race_date: Set(race_key.clone()),
        coin_id: Set(coin.id.to_string()),
        stake: Set(stake),
        payout: Set(0),
        status: Set(BetStatus::Pending),
        created_at: Set(now),
        settled_at: Set(None),
        ..Default::default()
    };
    let inserted = match new_bet.insert(&txn).await {
        Ok(model) => model,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(Error::DuplicateBet {
                race_date: race_key,
            });
        }
        Err(err) => return Err(err.into()),
    };

    ledger::record_history(
        &txn,
        user_id,
        None,
        -stake,
        format!("Bet on {} for race {race_key}", coin.symbol),
        now,
    )
    .await?;

    txn.commit().await?;

    info!(user_id, coin = coin.id, stake, race_date = %race_key, "Bet placed");

    Ok(PlacedBet {
        bet: inserted,
        coin_symbol: coin.symbol,
        remaining_points: updated.total_points,
        potential_payout: payout_for(stake),
    })
}

/// The user's bet for a race, if any.
pub async fn get_bet_for_race(
    db: &DatabaseConnection,
    user_id: i64,
    race_date: NaiveDate,
) -> Result<Option<bet::Model>> {
    Bet::find()
        .filter(bet::Column::UserId.eq(user_id))
        .filter(bet::Column::RaceDate.eq(clock::format_race_date(race_date)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// The user's most recent bets, newest race first.
pub async fn get_bets_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    limit: u64,
) -> Result<Vec<bet::Model>> {
    Bet::find()
        .filter(bet::Column::UserId.eq(user_id))
        .order_by_desc(bet::Column::RaceDate)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_validate_stake_bounds() {
        assert!(validate_stake(1).is_ok());
        assert!(validate_stake(MAX_STAKE).is_ok());
        assert!(matches!(
            validate_stake(0).unwrap_err(),
            Error::InvalidStake { stake: 0, .. }
        ));
        assert!(matches!(
            validate_stake(-10).unwrap_err(),
            Error::InvalidStake { stake: -10, .. }
        ));
        assert!(matches!(
            validate_stake(MAX_STAKE + 1).unwrap_err(),
            Error::InvalidStake { .. }
        ));
    }

    #[tokio::test]
    async fn test_place_bet_debits_and_stores_pending() -> Result<()> {
        let (db, user) = setup_with_user(1000).await?;
        let now = test_now();

        let placed = place_bet(&db, user.id, "btc", 200, now).await?;
        assert_eq!(placed.remaining_points, 800);
        assert_eq!(placed.potential_payout, 800);
        assert_eq!(placed.coin_symbol, "BTC");
        assert_eq!(placed.bet.status, BetStatus::Pending);
        assert_eq!(placed.bet.payout, 0);
        assert_eq!(
            placed.bet.race_date,
            clock::format_race_date(clock::upcoming_race_date(now))
        );
        assert_eq!(get_points(&db, user.id).await?, 800);

        Ok(())
    }

    #[tokio::test]
    async fn test_second_bet_for_same_race_rejected() -> Result<()> {
        let (db, user) = setup_with_user(1000).await?;
        let now = test_now();

        place_bet(&db, user.id, "eth", 100, now).await?;
        let result = place_bet(&db, user.id, "sol", 100, now).await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateBet { .. }));

        // Balance only reflects the first bet
        assert_eq!(get_points(&db, user.id).await?, 900);
        assert_eq!(get_bets_for_user(&db, user.id, 10).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_validation_order() -> Result<()> {
        let (db, user) = setup_with_user(50).await?;
        let now = test_now();

        // Bad stake wins over bad coin
        let result = place_bet(&db, user.id, "doge", 0, now).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidStake { .. }));

        // Bad coin wins over insufficient balance
        let result = place_bet(&db, user.id, "doge", 500, now).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidCoin { .. }));

        let result = place_bet(&db, user.id, "btc", 500, now).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientPoints {
                current: 50,
                required: 500
            }
        ));

        assert_eq!(get_points(&db, user.id).await?, 50);
        Ok(())
    }

    #[tokio::test]
    async fn test_insufficient_balance_wins_over_duplicate() -> Result<()> {
        let (db, user) = setup_with_user(100).await?;
        let now = test_now();

        place_bet(&db, user.id, "btc", 100, now).await?;
        let result = place_bet(&db, user.id, "btc", 100, now).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientPoints { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_bets_on_different_races_allowed() -> Result<()> {
        let (db, user) = setup_with_user(1000).await?;
        let today = test_now();
        let tomorrow = today + chrono::Duration::days(1);

        place_bet(&db, user.id, "btc", 100, today).await?;
        place_bet(&db, user.id, "xrp", 100, tomorrow).await?;

        let bets = get_bets_for_user(&db, user.id, 10).await?;
        assert_eq!(bets.len(), 2);
        // Newest race first
        assert_eq!(bets[0].coin_id, "xrp");
        assert_eq!(get_points(&db, user.id).await?, 800);

        Ok(())
    }

    #[tokio::test]
    async fn test_coin_id_is_normalised() -> Result<()> {
        let (db, user) = setup_with_user(1000).await?;

        let placed = place_bet(&db, user.id, "ETH", 10, test_now()).await?;
        assert_eq!(placed.bet.coin_id, "eth");

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_index_rejects_bet_that_slipped_past_precheck() -> Result<()> {
        let (db, user) = setup_with_user(1000).await?;
        let now = test_now();
        let race_key = clock::format_race_date(clock::upcoming_race_date(now));

        // A bet that landed between the duplicate check and the insert
        bet::ActiveModel {
            user_id: Set(user.id),
            race_date: Set(race_key.clone()),
            coin_id: Set("btc".to_string()),
            stake: Set(100),
            payout: Set(0),
            status: Set(BetStatus::Pending),
            created_at: Set(now),
            settled_at: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let sol = validate_coin("sol")?;
        let result = stake_and_insert(&db, user.id, sol, 250, race_key.clone(), now).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateBet { race_date } if race_date == race_key
        ));

        // The debit and the history row were rolled back
        assert_eq!(get_points(&db, user.id).await?, 1000);
        assert!(crate::entities::PointHistory::find().all(&db).await?.is_empty());
        let bets = get_bets_for_user(&db, user.id, 10).await?;
        assert_eq!(bets.len(), 1);
        assert_eq!(bets[0].coin_id, "btc");

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_bets_for_same_race_take_one_stake() -> Result<()> {
        let (db, user) = setup_with_user(1000).await?;
        let now = test_now();

        let (first, second) = tokio::join!(
            place_bet(&db, user.id, "btc", 100, now),
            place_bet(&db, user.id, "eth", 100, now),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(Error::DuplicateBet { .. })))
        );

        assert_eq!(get_bets_for_user(&db, user.id, 10).await?.len(), 1);
        assert_eq!(get_points(&db, user.id).await?, 900);

        Ok(())
    }
}
