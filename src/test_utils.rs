//! Shared test utilities.
//!
//! Helpers for setting up in-memory databases and creating users, catalog rows and
//! price quotes with sensible defaults.

use crate::{
    core::{catalog, coin::COINS, ledger, plan, user},
    entities::{self, TaskFrequency},
    errors::{Error, Result},
    price_feed::{PriceFeed, TodayQuote, YesterdayQuote},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Fixed instant used by tests: Sunday 2024-03-10 12:00 UTC (21:00 in Seoul).
#[must_use]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Creates a user holding `points`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    points: i64,
) -> Result<entities::user::Model> {
    let created = user::create_user(db, username, None, test_now()).await?;
    if points > 0 {
        ledger::credit(db, created.id, points).await
    } else {
        Ok(created)
    }
}

/// Creates a test database with a single user ("alice") holding `points`.
pub async fn setup_with_user(points: i64) -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let alice = create_test_user(&db, "alice", points).await?;
    Ok((db, alice))
}

/// Current balance of a user.
pub async fn get_points(db: &DatabaseConnection, user_id: i64) -> Result<i64> {
    entities::User::find_by_id(user_id)
        .one(db)
        .await?
        .map(|u| u.total_points)
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })
}

/// Creates an article with a placeholder description and no URL.
pub async fn create_test_article(
    db: &DatabaseConnection,
    title: &str,
) -> Result<entities::article::Model> {
    catalog::create_article(db, title, "Test article", None, test_now()).await
}

/// Creates a task under `article_id`.
pub async fn create_test_task(
    db: &DatabaseConnection,
    article_id: i64,
    title: &str,
    frequency: TaskFrequency,
) -> Result<entities::task::Model> {
    catalog::create_task(db, article_id, title, frequency, test_now()).await
}

/// Creates a user holding `points` with one task of `frequency` in their plan.
pub async fn setup_with_planned_task(
    frequency: TaskFrequency,
    points: i64,
) -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::task::Model,
)> {
    let (db, alice) = setup_with_user(points).await?;
    let article = create_test_article(&db, "Test Protocol").await?;
    let task = create_test_task(&db, article.id, "Test task", frequency).await?;
    plan::add_to_plan(&db, alice.id, task.id, test_now()).await?;
    Ok((db, alice, task))
}

/// Today's quotes in coin order: open 100, current moved by the given percent.
#[must_use]
pub fn today_quotes(changes: &[f64]) -> Vec<TodayQuote> {
    COINS
        .iter()
        .zip(changes)
        .map(|(coin, change)| TodayQuote {
            coin_id: coin.id,
            open_price: 100.0,
            current_price: 100.0 * (1.0 + change / 100.0),
            percent_change: *change,
        })
        .collect()
}

/// Yesterday's quotes in coin order: open 100, close moved by the given percent.
#[must_use]
pub fn yesterday_quotes(changes: &[f64]) -> Vec<YesterdayQuote> {
    COINS
        .iter()
        .zip(changes)
        .map(|(coin, change)| YesterdayQuote {
            coin_id: coin.id,
            open_price: 100.0,
            close_price: 100.0 * (1.0 + change / 100.0),
            percent_change: *change,
        })
        .collect()
}

/// Price feed returning fixed quotes and counting calls.
///
/// `closing_quotes` serves the same rows as `yesterday_quotes` for any date.
pub struct StaticFeed {
    today: Vec<TodayQuote>,
    yesterday: Mutex<Vec<YesterdayQuote>>,
    calls: Mutex<usize>,
    closing_requests: Mutex<Vec<NaiveDate>>,
}

impl StaticFeed {
    /// Feed serving the given rows.
    #[must_use]
    pub fn new(today: Vec<TodayQuote>, yesterday: Vec<YesterdayQuote>) -> Self {
        Self {
            today,
            yesterday: Mutex::new(yesterday),
            calls: Mutex::new(0),
            closing_requests: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the rows served for yesterday.
    pub fn set_yesterday(&self, quotes: Vec<YesterdayQuote>) {
        if let Ok(mut guard) = self.yesterday.lock() {
            *guard = quotes;
        }
    }

    /// Number of `yesterday_quotes` calls so far.
    #[must_use]
    pub fn yesterday_calls(&self) -> usize {
        self.calls.lock().map_or(0, |c| *c)
    }

    /// Dates passed to `closing_quotes` so far, in call order.
    #[must_use]
    pub fn closing_dates(&self) -> Vec<NaiveDate> {
        self.closing_requests
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PriceFeed for StaticFeed {
    async fn today_quotes(&self) -> Vec<TodayQuote> {
        self.today.clone()
    }

    async fn yesterday_quotes(&self) -> Vec<YesterdayQuote> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        self.yesterday
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    async fn closing_quotes(&self, race_date: NaiveDate) -> Vec<YesterdayQuote> {
        if let Ok(mut requests) = self.closing_requests.lock() {
            requests.push(race_date);
        }
        self.yesterday
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "static"
    }
}
