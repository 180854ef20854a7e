//! Daily streaks.
//!
//! A streak is the number of consecutive calendar days, ending today or
//! yesterday, with at least one completed task. A user who has not done
//! anything yet today keeps yesterday's streak; once two days pass without
//! a completion the streak reads 0.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::activity::ActivityLog;
use crate::calendar::local_date;

/// Consecutive-day streak as of `now`. Logs may be in any order.
pub fn calculate_streak(logs: &[ActivityLog], now: DateTime<Utc>, offset: &FixedOffset) -> u32 {
    let today = local_date(now, offset);

    let mut days: Vec<NaiveDate> = logs
        .iter()
        .filter(|log| log.completed)
        .map(|log| local_date(log.start_time, offset))
        .filter(|day| {
            if *day > today {
                tracing::warn!(%day, %today, "ignoring future-dated completion in streak");
                false
            } else {
                true
            }
        })
        .collect();

    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut cursor = today;
    let mut streak = 0;
    for day in days {
        if day == cursor {
            streak += 1;
        } else if Some(day) == cursor.pred_opt() {
            streak += 1;
            cursor = day;
        } else {
            break;
        }
    }

    streak
}

/// Number of completed logs started on the local day containing `now`.
pub fn completed_on_day(logs: &[ActivityLog], now: DateTime<Utc>, offset: &FixedOffset) -> usize {
    let today = local_date(now, offset);
    logs.iter()
        .filter(|log| log.completed && local_date(log.start_time, offset) == today)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Mood;
    use crate::calendar::offset_from_minutes;
    use chrono::{Duration, TimeZone};

    fn completed_at(at: DateTime<Utc>) -> ActivityLog {
        let mut log = ActivityLog::start("u", "t", Mood::Neutral, None, at);
        log.completed = true;
        log
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 18, 0, 0).unwrap()
    }

    #[test]
    fn no_logs_means_no_streak() {
        assert_eq!(calculate_streak(&[], now(), &offset_from_minutes(0)), 0);
    }

    #[test]
    fn today_and_yesterday_count_two() {
        let logs = vec![
            completed_at(now() - Duration::days(1)),
            completed_at(now() - Duration::hours(2)),
        ];
        assert_eq!(calculate_streak(&logs, now(), &offset_from_minutes(0)), 2);
    }

    #[test]
    fn only_two_days_ago_is_broken() {
        let logs = vec![completed_at(now() - Duration::days(2))];
        assert_eq!(calculate_streak(&logs, now(), &offset_from_minutes(0)), 0);
    }

    #[test]
    fn yesterday_only_keeps_streak_alive() {
        let logs = vec![
            completed_at(now() - Duration::days(1)),
            completed_at(now() - Duration::days(2)),
            completed_at(now() - Duration::days(3)),
        ];
        assert_eq!(calculate_streak(&logs, now(), &offset_from_minutes(0)), 3);
    }

    #[test]
    fn same_day_completions_count_once_and_gaps_stop() {
        let logs = vec![
            completed_at(now() - Duration::hours(1)),
            completed_at(now() - Duration::hours(3)),
            completed_at(now() - Duration::days(1)),
            // gap on day -2
            completed_at(now() - Duration::days(3)),
        ];
        assert_eq!(calculate_streak(&logs, now(), &offset_from_minutes(0)), 2);
    }

    #[test]
    fn open_logs_do_not_count() {
        let open = ActivityLog::start("u", "t", Mood::Neutral, None, now());
        assert_eq!(calculate_streak(&[open], now(), &offset_from_minutes(0)), 0);
    }

    #[test]
    fn day_boundary_follows_offset() {
        // 23:30 UTC on the 11th is already the 12th at UTC+2
        let log = completed_at(Utc.with_ymd_and_hms(2024, 6, 11, 23, 30, 0).unwrap());
        let plus_two = offset_from_minutes(120);
        assert_eq!(completed_on_day(&[log.clone()], now(), &plus_two), 1);
        assert_eq!(completed_on_day(&[log], now(), &offset_from_minutes(0)), 0);
    }
}
