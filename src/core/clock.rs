//! Calendar arithmetic for races and task resets.
//!
//! Races follow UTC calendar days: tomorrow is open for bets, today is racing and
//! yesterday is settled. Task completions reset on `Asia/Seoul` calendar days, with
//! weekly tasks resetting at the start of each KST week (Sunday).

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::{Asia::Seoul, Tz};

/// Time zone whose midnight starts a new task period.
pub const RESET_TIMEZONE: Tz = Seoul;

const RACE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Where a race is in its lifecycle, derived purely from the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    /// Tomorrow (or later): betting is open
    Upcoming,
    /// Today: prices are moving, no more bets
    Racing,
    /// Yesterday or earlier: settled or awaiting settlement
    Completed,
}

/// UTC date of the race currently running.
#[must_use]
pub fn today_race_date(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// UTC date of the race currently open for bets.
#[must_use]
pub fn upcoming_race_date(now: DateTime<Utc>) -> NaiveDate {
    let today = today_race_date(now);
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

/// UTC date of the most recently finished race.
#[must_use]
pub fn completed_race_date(now: DateTime<Utc>) -> NaiveDate {
    let today = today_race_date(now);
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

/// Lifecycle state of the race on `race_date` as seen at `now`.
#[must_use]
pub fn race_state(race_date: NaiveDate, now: DateTime<Utc>) -> RaceState {
    let today = today_race_date(now);
    if race_date > today {
        RaceState::Upcoming
    } else if race_date == today {
        RaceState::Racing
    } else {
        RaceState::Completed
    }
}

/// Formats a race date the way it is stored (`YYYY-MM-DD`).
#[must_use]
pub fn format_race_date(date: NaiveDate) -> String {
    date.format(RACE_DATE_FORMAT).to_string()
}

/// Parses a stored race date.
#[must_use]
pub fn parse_race_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, RACE_DATE_FORMAT).ok()
}

/// KST calendar date at `now`.
#[must_use]
pub fn reset_local_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&RESET_TIMEZONE).date_naive()
}

/// KST date of the Sunday that starts the week containing `now`.
#[must_use]
pub fn reset_week_start(now: DateTime<Utc>) -> NaiveDate {
    let local = reset_local_date(now);
    let days_since_sunday = u64::from(local.weekday().num_days_from_sunday());
    local
        .checked_sub_days(Days::new(days_since_sunday))
        .unwrap_or(local)
}

/// Instant at which the KST calendar day `date` begins.
#[must_use]
pub fn reset_day_start(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    RESET_TIMEZONE
        .from_local_datetime(&midnight)
        .earliest()
        .map_or_else(|| midnight.and_utc(), |local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Weekday;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_race_dates_follow_utc_day() {
        let now = utc(2024, 3, 10, 23, 59);
        assert_eq!(today_race_date(now), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(upcoming_race_date(now), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(completed_race_date(now), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn test_race_state() {
        let now = utc(2024, 3, 10, 12, 0);
        let today = today_race_date(now);
        assert_eq!(race_state(upcoming_race_date(now), now), RaceState::Upcoming);
        assert_eq!(race_state(today, now), RaceState::Racing);
        assert_eq!(race_state(completed_race_date(now), now), RaceState::Completed);
    }

    #[test]
    fn test_race_date_round_trip_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(format_race_date(date), "2024-01-05");
        assert_eq!(parse_race_date("2024-01-05"), Some(date));
        assert_eq!(parse_race_date("05/01/2024"), None);
    }

    #[test]
    fn test_kst_date_is_ahead_of_utc() {
        // 15:00 UTC is midnight in Seoul
        assert_eq!(
            reset_local_date(utc(2024, 3, 10, 14, 59)),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        assert_eq!(
            reset_local_date(utc(2024, 3, 10, 15, 0)),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
    }

    #[test]
    fn test_reset_day_start_is_previous_utc_afternoon() {
        let start = reset_day_start(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(start, utc(2024, 3, 10, 15, 0));
    }

    #[test]
    fn test_week_start_is_kst_sunday() {
        // 2024-03-13 is a Wednesday
        let week_start = reset_week_start(utc(2024, 3, 13, 3, 0));
        assert_eq!(week_start.weekday(), Weekday::Sun);
        assert_eq!(week_start, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        // Saturday 15:00 UTC is already Sunday in Seoul
        let week_start = reset_week_start(utc(2024, 3, 16, 15, 0));
        assert_eq!(week_start, NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());
    }
}
