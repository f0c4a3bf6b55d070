//! Plan business logic - personal task plans and the point awarder.
//!
//! Points move only on completion transitions: `false → true` credits the task's
//! frequency points once, `true → false` takes the same amount back (clamped at zero).
//! The amounts come from [`TaskFrequency::points`], the table the reset job uses too.

use crate::{
    core::ledger,
    entities::{Task, TaskFrequency, User, UserPlan, task, user_plan},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Outcome of a completion request.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    /// Plan entry after the update
    pub entry: user_plan::Model,
    /// Points credited by this call (0 if the task was already complete)
    pub points_awarded: i64,
    /// Balance after the call
    pub total_points: i64,
}

/// Outcome of reverting a completion.
#[derive(Debug, Clone)]
pub struct UncompletionResult {
    /// Plan entry after the update
    pub entry: user_plan::Model,
    /// Points debited (before clamping)
    pub points_removed: i64,
    /// Balance after the call
    pub total_points: i64,
}

/// History reason for a completion credit.
#[must_use]
pub fn completion_reason(frequency: TaskFrequency, title: &str) -> String {
    format!("Completed {} task: {title}", frequency.label())
}

/// History reason for a completion reversal.
#[must_use]
pub fn reversal_reason(frequency: TaskFrequency, title: &str) -> String {
    format!("Uncompleted {} task: {title}", frequency.label())
}

async fn find_entry<C>(
    db: &C,
    user_id: i64,
    task_id: i64,
) -> Result<Option<(user_plan::Model, task::Model)>>
where
    C: ConnectionTrait,
{
    let found = UserPlan::find()
        .filter(user_plan::Column::UserId.eq(user_id))
        .filter(user_plan::Column::TaskId.eq(task_id))
        .find_also_related(Task)
        .one(db)
        .await?;

    match found {
        Some((entry, Some(t))) => Ok(Some((entry, t))),
        Some((_, None)) => Err(Error::TaskNotFound {
            task_id: task_id.to_string(),
        }),
        None => Ok(None),
    }
}

/// Adds a task to a user's plan. Adding a task twice returns the existing entry.
pub async fn add_to_plan(
    db: &DatabaseConnection,
    user_id: i64,
    task_id: i64,
    now: DateTime<Utc>,
) -> Result<user_plan::Model> {
    if User::find_by_id(user_id).one(db).await?.is_none() {
        return Err(Error::UserNotFound {
            user_id: user_id.to_string(),
        });
    }
    let task_is_active = Task::find_by_id(task_id)
        .one(db)
        .await?
        .is_some_and(|t| !t.is_deleted);
    if !task_is_active {
        return Err(Error::TaskNotFound {
            task_id: task_id.to_string(),
        });
    }

    if let Some((entry, _)) = find_entry(db, user_id, task_id).await? {
        return Ok(entry);
    }

    let entry = user_plan::ActiveModel {
        user_id: Set(user_id),
        task_id: Set(task_id),
        completed: Set(false),
        completed_at: Set(None),
        cost: Set(None),
        created_at: Set(now),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Removes a task from a user's plan.
///
/// A completed entry gives its points back first, so removing and re-adding a task
/// cannot earn the same completion twice.
pub async fn remove_from_plan(
    db: &DatabaseConnection,
    user_id: i64,
    task_id: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    let txn = db.begin().await?;

    let (entry, t) = find_entry(&txn, user_id, task_id)
        .await?
        .ok_or(Error::PlanEntryNotFound { user_id, task_id })?;

    if entry.completed {
        let points = t.frequency.points();
        ledger::debit(&txn, user_id, points).await?;
        ledger::record_history(
            &txn,
            user_id,
            Some(task_id),
            -points,
            format!("Removed completed {} task: {}", t.frequency.label(), t.title),
            now,
        )
        .await?;
    }

    entry.delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// A user's plan entries with their tasks, oldest entry first.
pub async fn get_user_plan(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<(user_plan::Model, task::Model)>> {
    let rows = UserPlan::find()
        .filter(user_plan::Column::UserId.eq(user_id))
        .order_by_asc(user_plan::Column::Id)
        .find_also_related(Task)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(entry, t)| t.filter(|t| !t.is_deleted).map(|t| (entry, t)))
        .collect())
}

/// Marks a planned task complete and awards its points.
///
/// Inside one transaction:
/// - already complete: no points, but a provided `cost` is still stored;
/// - not complete: credit `frequency.points()`, append history, stamp `completed_at`.
pub async fn complete_task(
    db: &DatabaseConnection,
    user_id: i64,
    task_id: i64,
    cost: Option<f64>,
    now: DateTime<Utc>,
) -> Result<CompletionResult> {
    let txn = db.begin().await?;

    let (entry, t) = find_entry(&txn, user_id, task_id)
        .await?
        .ok_or(Error::PlanEntryNotFound { user_id, task_id })?;

    if entry.completed {
        let entry = if cost.is_some() {
            let mut active: user_plan::ActiveModel = entry.into();
            active.cost = Set(cost);
            active.update(&txn).await?
        } else {
            entry
        };
        let balance = User::find_by_id(user_id)
            .one(&txn)
            .await?
            .map_or(0, |u| u.total_points);
        txn.commit().await?;

        return Ok(CompletionResult {
            entry,
            points_awarded: 0,
            total_points: balance,
        });
    }

    let points = t.frequency.points();
    let keep_cost = entry.cost;

    let mut active: user_plan::ActiveModel = entry.into();
    active.completed = Set(true);
    active.completed_at = Set(Some(now));
    active.cost = Set(cost.or(keep_cost));
    let entry = active.update(&txn).await?;

    let user = ledger::credit(&txn, user_id, points).await?;
    ledger::record_history(
        &txn,
        user_id,
        Some(task_id),
        points,
        completion_reason(t.frequency, &t.title),
        now,
    )
    .await?;

    txn.commit().await?;

    Ok(CompletionResult {
        entry,
        points_awarded: points,
        total_points: user.total_points,
    })
}

/// Reverts a completion and takes its points back (clamped at zero).
///
/// # Errors
/// `Error::PlanEntryNotFound` when the task is not in the plan or not completed.
pub async fn uncomplete_task(
    db: &DatabaseConnection,
    user_id: i64,
    task_id: i64,
    now: DateTime<Utc>,
) -> Result<UncompletionResult> {
    let txn = db.begin().await?;

    let (entry, t) = find_entry(&txn, user_id, task_id)
        .await?
        .filter(|(entry, _)| entry.completed)
        .ok_or(Error::PlanEntryNotFound { user_id, task_id })?;

    let points = t.frequency.points();

    let mut active: user_plan::ActiveModel = entry.into();
    active.completed = Set(false);
    active.completed_at = Set(None);
    active.cost = Set(None);
    let entry = active.update(&txn).await?;

    let user = ledger::debit(&txn, user_id, points).await?;
    ledger::record_history(
        &txn,
        user_id,
        Some(task_id),
        -points,
        reversal_reason(t.frequency, &t.title),
        now,
    )
    .await?;

    txn.commit().await?;

    Ok(UncompletionResult {
        entry,
        points_removed: points,
        total_points: user.total_points,
    })
}
