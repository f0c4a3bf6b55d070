//! Point ledger - the only code that changes a user's `total_points`.
//!
//! Every mutation is a single SQL UPDATE so concurrent credits and debits cannot lose
//! updates, and the zero floor is enforced in SQL rather than computed from a stale read.
//! All functions take any `ConnectionTrait`, so they run inside the caller's transaction.

use crate::{
    entities::{User, point_history, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{Set, prelude::*};

fn validate_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

async fn find_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })
}

/// Adds `amount` points to the user's balance.
///
/// `UPDATE users SET total_points = total_points + amount WHERE id = ?`
///
/// # Returns
/// The updated user model
pub async fn credit<C>(db: &C, user_id: i64, amount: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    validate_amount(amount)?;
    find_user(db, user_id).await?;

    User::update_many()
        .col_expr(
            user::Column::TotalPoints,
            Expr::col(user::Column::TotalPoints).add(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    find_user(db, user_id).await
}

/// Removes up to `amount` points, clamping the balance at zero.
///
/// The clamp is part of the UPDATE:
/// `SET total_points = CASE WHEN total_points > amount THEN total_points - amount ELSE 0 END`
///
/// # Returns
/// The updated user model
pub async fn debit<C>(db: &C, user_id: i64, amount: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    validate_amount(amount)?;
    find_user(db, user_id).await?;

    User::update_many()
        .col_expr(
            user::Column::TotalPoints,
            SimpleExpr::Case(Box::new(
                Expr::case(
                    Expr::col(user::Column::TotalPoints).gt(amount),
                    Expr::col(user::Column::TotalPoints).sub(amount),
                )
                .finally(0),
            )),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    find_user(db, user_id).await
}

/// Removes exactly `amount` points, or fails without touching the balance.
///
/// The balance check and the decrement are one statement
/// (`... WHERE id = ? AND total_points >= amount`), so two concurrent spends cannot
/// both pass the check.
///
/// # Errors
/// `Error::InsufficientPoints` when the balance is below `amount`.
pub async fn try_debit<C>(db: &C, user_id: i64, amount: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    validate_amount(amount)?;
    let before = find_user(db, user_id).await?;

    let result = User::update_many()
        .col_expr(
            user::Column::TotalPoints,
            Expr::col(user::Column::TotalPoints).sub(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::TotalPoints.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::InsufficientPoints {
            current: before.total_points,
            required: amount,
        });
    }

    find_user(db, user_id).await
}

/// Appends a row to the point history audit log.
pub async fn record_history<C>(
    db: &C,
    user_id: i64,
    task_id: Option<i64>,
    points: i64,
    reason: String,
    now: DateTime<Utc>,
) -> Result<point_history::Model>
where
    C: ConnectionTrait,
{
    let row = point_history::ActiveModel {
        user_id: Set(user_id),
        task_id: Set(task_id),
        points: Set(points),
        reason: Set(reason),
        created_at: Set(now),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::PointHistory;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_credit_adds_points() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;

        let updated = credit(&db, user.id, 250).await?;
        assert_eq!(updated.total_points, 250);

        let updated = credit(&db, user.id, 50).await?;
        assert_eq!(updated.total_points, 300);

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_never_goes_negative() -> Result<()> {
        let (db, user) = setup_with_user(150).await?;

        let updated = debit(&db, user.id, 100).await?;
        assert_eq!(updated.total_points, 50);

        // More than what is left clamps at zero
        let updated = debit(&db, user.id, 100).await?;
        assert_eq!(updated.total_points, 0);

        // Debiting an empty balance stays at zero
        let updated = debit(&db, user.id, 1000).await?;
        assert_eq!(updated.total_points, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_debit_sequence_property() -> Result<()> {
        let (db, user) = setup_with_user(500).await?;

        let mut expected: i64 = 500;
        for amount in [0, 1, 99, 400, 3, 1000, 7] {
            let updated = debit(&db, user.id, amount).await?;
            expected = (expected - amount).max(0);
            assert_eq!(updated.total_points, expected);
            assert!(updated.total_points >= 0);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_try_debit_is_all_or_nothing() -> Result<()> {
        let (db, user) = setup_with_user(100).await?;

        let result = try_debit(&db, user.id, 101).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientPoints {
                current: 100,
                required: 101
            }
        ));
        assert_eq!(get_points(&db, user.id).await?, 100);

        let updated = try_debit(&db, user.id, 100).await?;
        assert_eq!(updated.total_points, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() -> Result<()> {
        let (db, user) = setup_with_user(100).await?;

        assert!(matches!(
            credit(&db, user.id, -5).await.unwrap_err(),
            Error::InvalidAmount { amount: -5 }
        ));
        assert!(matches!(
            debit(&db, user.id, -5).await.unwrap_err(),
            Error::InvalidAmount { amount: -5 }
        ));
        assert_eq!(get_points(&db, user.id).await?, 100);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(matches!(
            credit(&db, 999, 10).await.unwrap_err(),
            Error::UserNotFound { .. }
        ));
        assert!(matches!(
            debit(&db, 999, 10).await.unwrap_err(),
            Error::UserNotFound { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_record_history() -> Result<()> {
        let (db, user) = setup_with_user(0).await?;

        record_history(&db, user.id, None, 400, "Race win".to_string(), Utc::now()).await?;
        record_history(&db, user.id, Some(7), -100, "Reset".to_string(), Utc::now()).await?;

        let rows = PointHistory::find()
            .filter(point_history::Column::UserId.eq(user.id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().map(|r| r.points).sum::<i64>(), 300);

        Ok(())
    }
}
