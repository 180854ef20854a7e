//! Behavioral pattern learning.
//!
//! Each completed task feeds one observation into the user's rolling
//! statistics: which part of the day tends to go well, how long tasks
//! actually take, and lifetime points.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::activity::{remember_applied, ActivityLog};
use crate::calendar::local_hour;

/// Size of the rolling duration window.
pub const DURATION_WINDOW: usize = 20;

/// Samples needed before a preferred duration is derived.
pub const MIN_DURATION_SAMPLES: usize = 5;

/// Successes a bucket needs before it can be the best time of day.
pub const MIN_BEST_TIME_SUCCESSES: u32 = 3;

/// Coarse part of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Morning is 06-12, afternoon 12-18, everything else evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful completions per part of the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotCounts {
    pub morning: u32,
    pub afternoon: u32,
    pub evening: u32,
}

impl TimeSlotCounts {
    pub fn get(&self, slot: TimeOfDay) -> u32 {
        match slot {
            TimeOfDay::Morning => self.morning,
            TimeOfDay::Afternoon => self.afternoon,
            TimeOfDay::Evening => self.evening,
        }
    }

    fn increment(&mut self, slot: TimeOfDay) {
        match slot {
            TimeOfDay::Morning => self.morning += 1,
            TimeOfDay::Afternoon => self.afternoon += 1,
            TimeOfDay::Evening => self.evening += 1,
        }
    }

    /// Bucket with the most successes, if it has at least
    /// [`MIN_BEST_TIME_SUCCESSES`]. Ties go to the earlier part of the day.
    pub fn best(&self) -> Option<TimeOfDay> {
        let mut best: Option<(TimeOfDay, u32)> = None;
        for slot in [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Evening] {
            let count = self.get(slot);
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((slot, count));
            }
        }
        best.filter(|(_, count)| *count >= MIN_BEST_TIME_SUCCESSES)
            .map(|(slot, _)| slot)
    }
}

/// Rolling behavioral statistics for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPatterns {
    pub user_id: String,
    pub best_time_of_day: Option<TimeOfDay>,
    /// Most recent actual durations, oldest first
    pub task_durations: Vec<u32>,
    /// Median of `task_durations` once enough samples exist
    pub preferred_duration: Option<u32>,
    pub successful_time_slots: TimeSlotCounts,
    pub total_points_earned: u64,
    /// Bumped by every stored replace
    #[serde(default)]
    pub version: u64,
    /// Ids of the most recent logs already learned from
    #[serde(default)]
    pub applied_logs: Vec<String>,
}

impl UserPatterns {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            best_time_of_day: None,
            task_durations: Vec::new(),
            preferred_duration: None,
            successful_time_slots: TimeSlotCounts::default(),
            total_points_earned: 0,
            version: 0,
            applied_logs: Vec::new(),
        }
    }

    pub fn has_applied(&self, log_id: &str) -> bool {
        self.applied_logs.iter().any(|id| id == log_id)
    }

    /// Fold one closed log into the statistics. Returns `false`, changing
    /// nothing, when the log was already learned from.
    pub fn learn(&mut self, log: &ActivityLog, mood_improvement: i32, points: u32, offset: &FixedOffset) -> bool {
        if self.has_applied(&log.id) {
            return false;
        }
        remember_applied(&mut self.applied_logs, &log.id);

        let slot = TimeOfDay::from_hour(local_hour(log.start_time, offset));

        if log.completed && mood_improvement >= 0 {
            self.successful_time_slots.increment(slot);
        }

        if log.completed {
            if let Some(minutes) = log.actual_minutes.filter(|m| *m > 0) {
                self.task_durations.push(minutes);
                if self.task_durations.len() > DURATION_WINDOW {
                    let overflow = self.task_durations.len() - DURATION_WINDOW;
                    self.task_durations.drain(..overflow);
                }
                if self.task_durations.len() >= MIN_DURATION_SAMPLES {
                    self.preferred_duration = median(&self.task_durations);
                }
            }
        }

        self.best_time_of_day = self.successful_time_slots.best();
        self.total_points_earned += points as u64;
        true
    }
}

/// Median, rounding the mean of the two middle values for even counts.
pub fn median(values: &[u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let sum = sorted[mid - 1] as u64 + sorted[mid] as u64;
        Some(((sum + 1) / 2) as u32)
    } else {
        Some(sorted[mid])
    }
}
