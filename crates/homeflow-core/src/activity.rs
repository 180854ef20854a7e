//! Activity logs: one record per task attempt.
//!
//! A log is appended when the user starts a task and closed exactly once
//! when they finish it. Logs are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::strategy::Intention;

/// Self-reported mood on a 5-point ordinal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VeryBad,
    Bad,
    Neutral,
    Good,
    VeryGood,
}

impl Mood {
    /// Parse from the 1-5 scale.
    pub fn from_value(value: i64) -> Result<Self, ValidationError> {
        match value {
            1 => Ok(Mood::VeryBad),
            2 => Ok(Mood::Bad),
            3 => Ok(Mood::Neutral),
            4 => Ok(Mood::Good),
            5 => Ok(Mood::VeryGood),
            other => Err(ValidationError::MoodOutOfRange(other)),
        }
    }

    /// Numeric value on the 1-5 scale.
    pub fn value(&self) -> i32 {
        match self {
            Mood::VeryBad => 1,
            Mood::Bad => 2,
            Mood::Neutral => 3,
            Mood::Good => 4,
            Mood::VeryGood => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mood::VeryBad => "Very bad",
            Mood::Bad => "Bad",
            Mood::Neutral => "Okay",
            Mood::Good => "Good",
            Mood::VeryGood => "Very good",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Post-task mood minus pre-task mood.
pub fn mood_delta(before: Mood, after: Mood) -> i32 {
    after.value() - before.value()
}

/// Number of recent log ids a derived record remembers as folded in.
pub const APPLIED_LOG_MEMORY: usize = 20;

/// Record that a log was folded into a derived record, oldest first.
pub fn remember_applied(applied: &mut Vec<String>, log_id: &str) {
    applied.push(log_id.to_string());
    if applied.len() > APPLIED_LOG_MEMORY {
        let overflow = applied.len() - APPLIED_LOG_MEMORY;
        applied.drain(..overflow);
    }
}

/// One task attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
    pub actual_minutes: Option<u32>,
    pub mood_before: Mood,
    pub mood_after: Option<Mood>,
    /// Derived: `mood_after - mood_before`, set on completion
    pub mood_delta: Option<i32>,
    /// Intention that led the user to this task
    pub route: Option<Intention>,
    /// Points credited when the log was closed
    #[serde(default)]
    pub points_earned: Option<u32>,
}

impl ActivityLog {
    /// Open a new, not yet completed log.
    pub fn start(
        user_id: impl Into<String>,
        task_id: impl Into<String>,
        mood_before: Mood,
        route: Option<Intention>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            task_id: task_id.into(),
            start_time,
            end_time: None,
            completed: false,
            actual_minutes: None,
            mood_before,
            mood_after: None,
            mood_delta: None,
            route,
            points_earned: None,
        }
    }

    /// Apply the one-time completion mutation.
    pub fn apply(&mut self, completion: &LogCompletion) {
        self.completed = true;
        self.end_time = Some(completion.end_time);
        self.actual_minutes = completion.actual_minutes;
        self.mood_after = Some(completion.mood_after);
        self.mood_delta = Some(mood_delta(self.mood_before, completion.mood_after));
        self.points_earned = Some(completion.points_earned);
    }
}

/// Fields written when a log is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogCompletion {
    pub end_time: DateTime<Utc>,
    pub actual_minutes: Option<u32>,
    pub mood_after: Mood,
    pub points_earned: u32,
}

/// Query shapes the activity log store must support.
///
/// Every variant returns logs newest-first by `start_time`.
#[derive(Debug, Clone, PartialEq)]
pub enum LogFilter {
    /// The `n` most recent logs, completed or not
    Recent(usize),
    /// Every completed log
    AllCompleted,
    /// Completed logs whose start time falls in `[start, end)`
    CompletedBetween {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl LogFilter {
    /// Whether a log satisfies the predicate part of the filter.
    pub fn matches(&self, log: &ActivityLog) -> bool {
        match self {
            LogFilter::Recent(_) => true,
            LogFilter::AllCompleted => log.completed,
            LogFilter::CompletedBetween { start, end } => {
                log.completed && log.start_time >= *start && log.start_time < *end
            }
        }
    }

    /// Row limit implied by the filter.
    pub fn limit(&self) -> Option<usize> {
        match self {
            LogFilter::Recent(n) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mood_scale_roundtrips_values() {
        for v in 1..=5 {
            assert_eq!(Mood::from_value(v).unwrap().value() as i64, v);
        }
        assert!(Mood::from_value(0).is_err());
        assert!(Mood::from_value(6).is_err());
    }

    #[test]
    fn apply_sets_delta_and_flags() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let mut log = ActivityLog::start("u", "t", Mood::Bad, None, start);
        assert!(!log.completed);

        log.apply(&LogCompletion {
            end_time: start + chrono::Duration::minutes(8),
            actual_minutes: Some(8),
            mood_after: Mood::Good,
            points_earned: 27,
        });

        assert!(log.completed);
        assert_eq!(log.mood_delta, Some(2));
        assert_eq!(log.actual_minutes, Some(8));
        assert_eq!(log.points_earned, Some(27));
    }

    #[test]
    fn completed_between_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let end = start + chrono::Duration::days(1);
        let filter = LogFilter::CompletedBetween { start, end };

        let mut log = ActivityLog::start("u", "t", Mood::Neutral, None, start);
        log.completed = true;
        assert!(filter.matches(&log));

        log.start_time = end;
        assert!(!filter.matches(&log));
    }

    #[test]
    fn applied_ids_keep_the_most_recent() {
        let mut applied = Vec::new();
        for i in 0..APPLIED_LOG_MEMORY + 3 {
            remember_applied(&mut applied, &format!("log-{i}"));
        }
        assert_eq!(applied.len(), APPLIED_LOG_MEMORY);
        assert_eq!(applied[0], "log-3");
        assert!(applied.iter().any(|id| id == &format!("log-{}", APPLIED_LOG_MEMORY + 2)));
    }
}
