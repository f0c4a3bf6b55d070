//! Background scheduler - race start, race settlement and task resets on a polling loop.
//!
//! Every tick runs three independent steps. A failure in one is logged and never stops
//! the others or later ticks. Idempotency lives in the database (race `started_at` /
//! `settled_at`, reset markers); the in-memory dates only save repeated lookups.

use crate::{
    config::settings::Settings,
    core::{clock, race, reset, settlement},
    errors::{Error, Result},
    price_feed::{PriceFeed, TodayQuote, YesterdayQuote},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// What one tick did. Mostly useful for tests and debug logging.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Start prices of today's race were recorded by this tick
    pub race_started: bool,
    /// Races settled by this tick, oldest first
    pub settlements: Vec<settlement::SettlementResult>,
    /// Reset job outcome, `None` if the step failed
    pub resets: Option<reset::ResetRunSummary>,
}

/// Drives the periodic jobs.
pub struct Scheduler {
    db: DatabaseConnection,
    feed: Arc<dyn PriceFeed>,
    feed_timeout: Duration,
    last_started: Option<NaiveDate>,
    last_settled: Option<NaiveDate>,
}

impl Scheduler {
    /// Creates a scheduler that has not processed anything yet.
    #[must_use]
    pub fn new(db: DatabaseConnection, feed: Arc<dyn PriceFeed>, feed_timeout: Duration) -> Self {
        Self {
            db,
            feed,
            feed_timeout,
            last_started: None,
            last_settled: None,
        }
    }

    /// Starts the polling loop on the tokio runtime.
    pub fn spawn(
        db: DatabaseConnection,
        feed: Arc<dyn PriceFeed>,
        settings: &Settings,
    ) -> JoinHandle<()> {
        let mut scheduler = Self::new(db, feed, settings.price_feed_timeout);
        let poll_interval = settings.poll_interval;

        tokio::spawn(async move {
            info!(
                "Scheduler started (feed={}, interval={:?})",
                scheduler.feed.name(),
                poll_interval
            );

            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                scheduler.run_tick(Utc::now()).await;
            }
        })
    }

    /// Runs every job once against `now`.
    pub async fn run_tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        match self.start_today(now).await {
            Ok(started) => report.race_started = started,
            Err(e) => error!("Failed to record race start: {e}"),
        }

        match self.settle_finished(now).await {
            Ok(results) => report.settlements = results,
            Err(e) => error!("Failed to settle races: {e}"),
        }

        match reset::process_task_resets(&self.db, now).await {
            Ok(summary) => report.resets = Some(summary),
            Err(e) => error!("Failed to process task resets: {e}"),
        }

        report
    }

    async fn start_today(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let today = clock::today_race_date(now);
        if self.last_started == Some(today) {
            return Ok(false);
        }
        if race::is_race_started(&self.db, today).await? {
            self.last_started = Some(today);
            return Ok(false);
        }

        let quotes = self.fetch_today().await?;
        let started = race::record_race_start(&self.db, today, &quotes, now).await?;
        if started {
            self.last_started = Some(today);
        } else {
            warn!(race_date = %today, "No start prices available, will retry");
        }
        Ok(started)
    }

    /// Settles yesterday's race and every older race still holding pending bets.
    ///
    /// A date that cannot be settled yet is logged and retried next tick without
    /// blocking the others.
    async fn settle_finished(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<settlement::SettlementResult>> {
        let yesterday = clock::completed_race_date(now);
        let mut dates =
            settlement::unsettled_race_dates(&self.db, clock::today_race_date(now)).await?;

        if self.last_settled != Some(yesterday) && !dates.contains(&yesterday) {
            if settlement::is_race_settled(&self.db, yesterday).await? {
                self.last_settled = Some(yesterday);
            } else {
                dates.push(yesterday);
            }
        }

        let mut results = Vec::new();
        for race_date in dates {
            match self.settle_one(race_date, yesterday, now).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => error!(race_date = %race_date, "Failed to settle race: {e}"),
            }
        }
        Ok(results)
    }

    async fn settle_one(
        &mut self,
        race_date: NaiveDate,
        yesterday: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<settlement::SettlementResult>> {
        let quotes = if race_date == yesterday {
            self.fetch_yesterday().await?
        } else {
            self.fetch_closing(race_date).await?
        };

        let Some(winner) = settlement::determine_winner(&quotes) else {
            warn!(race_date = %race_date, "No closing prices available, settlement postponed");
            return Ok(None);
        };

        let result = settlement::settle_race(&self.db, race_date, winner, &quotes, now).await?;
        if let Some(settled) = &result {
            info!("{}", settlement::format_settlement_summary(settled));
        }
        if race_date == yesterday {
            self.last_settled = Some(race_date);
        }
        Ok(result)
    }

    async fn fetch_today(&self) -> Result<Vec<TodayQuote>> {
        tokio::time::timeout(self.feed_timeout, self.feed.today_quotes())
            .await
            .map_err(|_| Error::PriceFeed {
                message: format!("today quotes timed out after {:?}", self.feed_timeout),
            })
    }

    async fn fetch_yesterday(&self) -> Result<Vec<YesterdayQuote>> {
        tokio::time::timeout(self.feed_timeout, self.feed.yesterday_quotes())
            .await
            .map_err(|_| Error::PriceFeed {
                message: format!("yesterday quotes timed out after {:?}", self.feed_timeout),
            })
    }

    async fn fetch_closing(&self, race_date: NaiveDate) -> Result<Vec<YesterdayQuote>> {
        tokio::time::timeout(self.feed_timeout, self.feed.closing_quotes(race_date))
            .await
            .map_err(|_| Error::PriceFeed {
                message: format!(
                    "closing quotes for {race_date} timed out after {:?}",
                    self.feed_timeout
                ),
            })
    }
}
