//! Daily and weekly task reset job.
//!
//! Completions expire at KST boundaries: daily tasks at local midnight, weekly tasks at
//! midnight of the most recent Sunday. Expiring a completion clears it and takes its
//! points back. The last processed boundary of each kind is persisted in the
//! `system_state` table, so a run that does not cross a boundary changes nothing, even
//! across restarts.

use crate::{
    core::{clock, ledger},
    entities::{SystemState, Task, TaskFrequency, UserPlan, system_state, task, user_plan},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, Set, TransactionTrait, prelude::*};
use tracing::{error, info, instrument};

const LAST_DAILY_RESET_KEY: &str = "last_daily_reset";
const LAST_WEEKLY_RESET_KEY: &str = "last_weekly_reset";

/// Outcome of resetting one frequency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Plan entries that were cleared
    pub reset_count: usize,
    /// Entries that failed and were skipped
    pub failed_count: usize,
    /// Points removed across all users (nominal, before clamping)
    pub points_removed: i64,
}

/// Result of one `process_task_resets` run. `None` means that boundary was already processed.
#[derive(Debug, Clone, Default)]
pub struct ResetRunSummary {
    /// KST date whose daily boundary was processed, with its outcome
    pub daily: Option<(NaiveDate, ResetOutcome)>,
    /// KST week start that was processed, with its outcome
    pub weekly: Option<(NaiveDate, ResetOutcome)>,
}

impl ResetRunSummary {
    /// True when neither boundary needed processing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.daily.is_none() && self.weekly.is_none()
    }
}

fn reset_reason(frequency: TaskFrequency, title: &str) -> String {
    let kind = match frequency {
        TaskFrequency::Daily => "Daily",
        TaskFrequency::Weekly => "Weekly",
        TaskFrequency::Once => "One-time",
    };
    format!("{kind} reset: {title}")
}

async fn get_marker<C>(db: &C, key: &str) -> Result<Option<NaiveDate>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    match state {
        Some(s) => clock::parse_race_date(&s.value)
            .map(Some)
            .ok_or_else(|| Error::Config {
                message: format!("Failed to parse {key} marker: {}", s.value),
            }),
        None => Ok(None),
    }
}

async fn set_marker<C>(db: &C, key: &str, date: NaiveDate, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let value = clock::format_race_date(date);
    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active: system_state::ActiveModel = state.into();
        active.value = Set(value);
        active.updated_at = Set(now.naive_utc());
        active.update(db).await?;
    } else {
        system_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now.naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}

/// KST date of the last processed daily boundary.
pub async fn get_last_daily_reset(db: &DatabaseConnection) -> Result<Option<NaiveDate>> {
    get_marker(db, LAST_DAILY_RESET_KEY).await
}

/// KST week start of the last processed weekly boundary.
pub async fn get_last_weekly_reset(db: &DatabaseConnection) -> Result<Option<NaiveDate>> {
    get_marker(db, LAST_WEEKLY_RESET_KEY).await
}

async fn reset_entry<C>(
    db: &C,
    entry: user_plan::Model,
    t: &task::Model,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let user_id = entry.user_id;
    let points = t.frequency.points();

    let mut active: user_plan::ActiveModel = entry.into();
    active.completed = Set(false);
    active.completed_at = Set(None);
    active.cost = Set(None);
    active.update(db).await?;

    ledger::debit(db, user_id, points).await?;
    ledger::record_history(
        db,
        user_id,
        Some(t.id),
        -points,
        reset_reason(t.frequency, &t.title),
        now,
    )
    .await?;

    Ok(())
}

/// Clears every completion of `frequency` that happened before `period_start`.
///
/// Entries without a completion timestamp are treated as stale. Each entry runs in its
/// own savepoint: a failure is logged, rolled back and skipped while the rest proceed.
pub async fn reset_completed_tasks(
    txn: &DatabaseTransaction,
    frequency: TaskFrequency,
    period_start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<ResetOutcome> {
    let candidates = UserPlan::find()
        .find_also_related(Task)
        .filter(user_plan::Column::Completed.eq(true))
        .filter(task::Column::Frequency.eq(frequency))
        .all(txn)
        .await?;

    let mut outcome = ResetOutcome::default();

    for (entry, t) in candidates {
        let Some(t) = t else { continue };
        if entry.completed_at.is_some_and(|at| at >= period_start) {
            continue;
        }

        let entry_id = entry.id;
        let savepoint = txn.begin().await?;
        match reset_entry(&savepoint, entry, &t, now).await {
            Ok(()) => {
                savepoint.commit().await?;
                outcome.reset_count += 1;
                outcome.points_removed += t.frequency.points();
            }
            Err(e) => {
                error!(entry_id, task = %t.title, "Failed to reset plan entry: {e}");
                savepoint.rollback().await?;
                outcome.failed_count += 1;
            }
        }
    }

    Ok(outcome)
}

/// Runs the daily and weekly resets whose boundary has not been processed yet.
///
/// Both resets and their markers are written in one transaction, so a crash never
/// leaves a boundary half-processed with its marker already advanced.
#[instrument(skip(db))]
pub async fn process_task_resets(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<ResetRunSummary> {
    let today = clock::reset_local_date(now);
    let week_start = clock::reset_week_start(now);

    let daily_due = get_last_daily_reset(db).await? != Some(today);
    let weekly_due = get_last_weekly_reset(db).await? != Some(week_start);

    let mut summary = ResetRunSummary::default();
    if !daily_due && !weekly_due {
        return Ok(summary);
    }

    let txn = db.begin().await?;

    if daily_due {
        let outcome =
            reset_completed_tasks(&txn, TaskFrequency::Daily, clock::reset_day_start(today), now)
                .await?;
        set_marker(&txn, LAST_DAILY_RESET_KEY, today, now).await?;
        summary.daily = Some((today, outcome));
    }

    if weekly_due {
        let outcome = reset_completed_tasks(
            &txn,
            TaskFrequency::Weekly,
            clock::reset_day_start(week_start),
            now,
        )
        .await?;
        set_marker(&txn, LAST_WEEKLY_RESET_KEY, week_start, now).await?;
        summary.weekly = Some((week_start, outcome));
    }

    txn.commit().await?;

    if let Some((date, outcome)) = &summary.daily {
        info!(%date, reset = outcome.reset_count, failed = outcome.failed_count, "Daily tasks reset");
    }
    if let Some((date, outcome)) = &summary.weekly {
        info!(%date, reset = outcome.reset_count, failed = outcome.failed_count, "Weekly tasks reset");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::plan;
    use crate::entities::PointHistory;
    use crate::test_utils::*;
    use chrono::Duration;

    async fn plan_entry(db: &DatabaseConnection, user_id: i64, task_id: i64) -> user_plan::Model {
        UserPlan::find()
            .filter(user_plan::Column::UserId.eq(user_id))
            .filter(user_plan::Column::TaskId.eq(task_id))
            .one(db)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_markers_start_empty() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_last_daily_reset(&db).await?.is_none());
        assert!(get_last_weekly_reset(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_marker_updates_existing() -> Result<()> {
        let db = setup_test_db().await?;
        let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();

        set_marker(&db, LAST_DAILY_RESET_KEY, first, test_now()).await?;
        set_marker(&db, LAST_DAILY_RESET_KEY, second, test_now()).await?;

        assert_eq!(get_last_daily_reset(&db).await?, Some(second));
        let count = SystemState::find()
            .filter(system_state::Column::Key.eq(LAST_DAILY_RESET_KEY))
            .count(&db)
            .await?;
        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_daily_completion_from_yesterday_is_reset() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Daily, 0).await?;
        let now = test_now();

        plan::complete_task(&db, user.id, task.id, Some(2.5), now - Duration::days(1)).await?;
        assert_eq!(get_points(&db, user.id).await?, 100);

        let summary = process_task_resets(&db, now).await?;
        let (date, outcome) = summary.daily.unwrap();
        assert_eq!(date, clock::reset_local_date(now));
        assert_eq!(outcome.reset_count, 1);
        assert_eq!(outcome.points_removed, 100);

        let entry = plan_entry(&db, user.id, task.id).await;
        assert!(!entry.completed);
        assert!(entry.completed_at.is_none());
        assert!(entry.cost.is_none());
        assert_eq!(get_points(&db, user.id).await?, 0);

        let history = PointHistory::find().all(&db).await?;
        assert!(history.iter().any(|h| h.points == -100 && h.reason.starts_with("Daily reset")));

        Ok(())
    }

    #[tokio::test]
    async fn test_completion_after_boundary_is_kept() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Daily, 0).await?;
        let now = test_now();

        plan::complete_task(&db, user.id, task.id, None, now).await?;
        let summary = process_task_resets(&db, now).await?;
        assert_eq!(summary.daily.unwrap().1.reset_count, 0);

        assert!(plan_entry(&db, user.id, task.id).await.completed);
        assert_eq!(get_points(&db, user.id).await?, 100);

        Ok(())
    }

    #[tokio::test]
    async fn test_second_run_without_boundary_is_noop() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Daily, 0).await?;
        let now = test_now();

        plan::complete_task(&db, user.id, task.id, None, now - Duration::days(1)).await?;
        assert!(!process_task_resets(&db, now).await?.is_noop());

        // Completed again after the reset; an hour later nothing crosses a boundary
        plan::complete_task(&db, user.id, task.id, None, now).await?;
        let history_before = PointHistory::find().count(&db).await?;

        let second = process_task_resets(&db, now + Duration::hours(1)).await?;
        assert!(second.is_noop());
        assert!(plan_entry(&db, user.id, task.id).await.completed);
        assert_eq!(get_points(&db, user.id).await?, 100);
        assert_eq!(PointHistory::find().count(&db).await?, history_before);

        Ok(())
    }

    #[tokio::test]
    async fn test_next_kst_day_resets_again() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Daily, 0).await?;
        let now = test_now();

        process_task_resets(&db, now).await?;
        plan::complete_task(&db, user.id, task.id, None, now).await?;

        // test_now() is 21:00 KST; four hours later is the next KST day
        let later = now + Duration::hours(4);
        let summary = process_task_resets(&db, later).await?;
        assert_eq!(summary.daily.unwrap().1.reset_count, 1);
        assert!(summary.weekly.is_none());
        assert_eq!(get_points(&db, user.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_weekly_reset_uses_sunday_boundary() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Weekly, 0).await?;
        let now = test_now();
        assert_eq!(clock::reset_week_start(now), clock::reset_local_date(now));

        // Completed on the previous Friday, before this week's Sunday midnight
        plan::complete_task(&db, user.id, task.id, None, now - Duration::days(2)).await?;
        assert_eq!(get_points(&db, user.id).await?, 500);

        let summary = process_task_resets(&db, now).await?;
        let (week_start, outcome) = summary.weekly.unwrap();
        assert_eq!(week_start, clock::reset_week_start(now));
        assert_eq!(outcome.reset_count, 1);
        assert_eq!(get_points(&db, user.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_completion_time_is_eligible() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Daily, 500).await?;

        let mut active: user_plan::ActiveModel = plan_entry(&db, user.id, task.id).await.into();
        active.completed = Set(true);
        active.completed_at = Set(None);
        active.update(&db).await?;

        let summary = process_task_resets(&db, test_now()).await?;
        assert_eq!(summary.daily.unwrap().1.reset_count, 1);
        assert!(!plan_entry(&db, user.id, task.id).await.completed);
        assert_eq!(get_points(&db, user.id).await?, 400);

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_debit_is_clamped() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Daily, 0).await?;
        let now = test_now();

        plan::complete_task(&db, user.id, task.id, None, now - Duration::days(1)).await?;
        ledger::debit(&db, user.id, 60).await?;
        assert_eq!(get_points(&db, user.id).await?, 40);

        process_task_resets(&db, now).await?;
        assert_eq!(get_points(&db, user.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_one_time_tasks_never_reset() -> Result<()> {
        let (db, user, task) = setup_with_planned_task(TaskFrequency::Once, 0).await?;
        let now = test_now();

        plan::complete_task(&db, user.id, task.id, None, now - Duration::days(30)).await?;
        process_task_resets(&db, now).await?;

        assert!(plan_entry(&db, user.id, task.id).await.completed);
        assert_eq!(get_points(&db, user.id).await?, 1000);

        Ok(())
    }

    #[tokio::test]
    async fn test_reset_only_touches_matching_frequency() -> Result<()> {
        let (db, user, daily) = setup_with_planned_task(TaskFrequency::Daily, 0).await?;
        let weekly = create_test_task(&db, daily.article_id, "Weekly swap", TaskFrequency::Weekly)
            .await?;
        plan::add_to_plan(&db, user.id, weekly.id, test_now()).await?;

        let now = test_now();
        // test_now() is a Sunday, so only today's weekly completion survives the boundary
        plan::complete_task(&db, user.id, daily.id, None, now - Duration::days(1)).await?;
        plan::complete_task(&db, user.id, weekly.id, None, now).await?;

        process_task_resets(&db, now).await?;

        assert!(!plan_entry(&db, user.id, daily.id).await.completed);
        assert!(plan_entry(&db, user.id, weekly.id).await.completed);
        assert_eq!(get_points(&db, user.id).await?, 500);

        Ok(())
    }

    #[test]
    fn test_reset_reason() {
        assert_eq!(reset_reason(TaskFrequency::Daily, "Bridge"), "Daily reset: Bridge");
        assert_eq!(reset_reason(TaskFrequency::Weekly, "Swap"), "Weekly reset: Swap");
    }
}
