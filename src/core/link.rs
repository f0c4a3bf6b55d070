//! Account linking - short-lived codes that attach a chat identity to an existing user.

use crate::{
    entities::{Bet, BetStatus, LinkCode, User, bet, link_code, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::sea_query::Expr;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::info;

/// Length of a generated code.
pub const LINK_CODE_LEN: usize = 8;

/// How long a code stays redeemable.
pub const LINK_CODE_TTL_MINUTES: i64 = 10;

fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LINK_CODE_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

/// Issues a fresh code for `user_id`, replacing any code the user still holds.
pub async fn issue_link_code(
    db: &DatabaseConnection,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<link_code::Model> {
    if User::find_by_id(user_id).one(db).await?.is_none() {
        return Err(Error::UserNotFound {
            user_id: user_id.to_string(),
        });
    }

    let txn = db.begin().await?;

    LinkCode::delete_many()
        .filter(
            link_code::Column::UserId
                .eq(user_id)
                .or(link_code::Column::ExpiresAt.lte(now)),
        )
        .exec(&txn)
        .await?;

    let mut code = generate_code();
    while LinkCode::find()
        .filter(link_code::Column::Code.eq(code.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        code = generate_code();
    }

    let model = link_code::ActiveModel {
        code: Set(code),
        user_id: Set(user_id),
        expires_at: Set(now + Duration::minutes(LINK_CODE_TTL_MINUTES)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model)
}

/// Redeems `code` for `chat_id` and returns the linked user.
///
/// The chat identity is detached from any other account first, which is only allowed
/// while that account is empty: no points and no pending bets. The code is single use.
///
/// # Errors
/// `Error::LinkCodeInvalid` when the code is unknown or expired.
/// `Error::ChatAccountInUse` when the chat identity belongs to another account with
/// points or pending bets; the code stays redeemable.
pub async fn redeem_link_code(
    db: &DatabaseConnection,
    code: &str,
    chat_id: &str,
    now: DateTime<Utc>,
) -> Result<user::Model> {
    let code = code.trim().to_uppercase();
    let txn = db.begin().await?;

    let Some(found) = LinkCode::find()
        .filter(link_code::Column::Code.eq(code.as_str()))
        .one(&txn)
        .await?
    else {
        return Err(Error::LinkCodeInvalid);
    };

    if found.expires_at <= now {
        LinkCode::delete_by_id(found.id).exec(&txn).await?;
        txn.commit().await?;
        return Err(Error::LinkCodeInvalid);
    }

    let holders = User::find()
        .filter(user::Column::ChatId.eq(chat_id))
        .filter(user::Column::Id.ne(found.user_id))
        .all(&txn)
        .await?;
    for holder in &holders {
        let pending_bets = Bet::find()
            .filter(bet::Column::UserId.eq(holder.id))
            .filter(bet::Column::Status.eq(BetStatus::Pending))
            .count(&txn)
            .await?;
        if holder.total_points > 0 || pending_bets > 0 {
            return Err(Error::ChatAccountInUse {
                username: holder.username.clone(),
                points: holder.total_points,
            });
        }
    }

    User::update_many()
        .col_expr(user::Column::ChatId, Expr::value(Option::<String>::None))
        .filter(user::Column::ChatId.eq(chat_id))
        .filter(user::Column::Id.ne(found.user_id))
        .exec(&txn)
        .await?;

    let target = User::find_by_id(found.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: found.user_id.to_string(),
        })?;

    let mut active: user::ActiveModel = target.into();
    active.chat_id = Set(Some(chat_id.to_string()));
    let linked = active.update(&txn).await?;

    LinkCode::delete_by_id(found.id).exec(&txn).await?;
    txn.commit().await?;

    info!(user_id = linked.id, "Chat identity linked");
    Ok(linked)
}
