//! Per-user progress: streaks, totals, weekly points and the list of tasks
//! that reliably lift the user's mood.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::remember_applied;

/// Maximum number of entries kept in [`UserProgress::high_impact_tasks`].
pub const MAX_HIGH_IMPACT_TASKS: usize = 10;

/// Weekly goal used when a progress record is created.
pub const DEFAULT_WEEKLY_GOAL: u32 = 100;

/// A task whose completions correlate with mood improvement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighImpactTask {
    pub task_id: String,
    pub avg_mood_improvement: f64,
    pub times_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity: Option<DateTime<Utc>>,
    pub total_tasks_completed: u32,
    pub weekly_points: u32,
    pub weekly_goal: u32,
    /// Sorted descending by average improvement, at most 10 entries
    pub high_impact_tasks: Vec<HighImpactTask>,
    /// Bumped by every stored update
    #[serde(default)]
    pub version: u64,
    /// Ids of the most recent logs already counted
    #[serde(default)]
    pub applied_logs: Vec<String>,
}

impl UserProgress {
    /// Fresh record: zero streak, zero points, empty history.
    pub fn new(user_id: impl Into<String>, weekly_goal: u32) -> Self {
        Self {
            user_id: user_id.into(),
            current_streak: 0,
            longest_streak: 0,
            last_activity: None,
            total_tasks_completed: 0,
            weekly_points: 0,
            weekly_goal,
            high_impact_tasks: Vec::new(),
            version: 0,
            applied_logs: Vec::new(),
        }
    }

    /// Whether the completion of `log_id` is already counted.
    pub fn has_applied(&self, log_id: &str) -> bool {
        self.applied_logs.iter().any(|id| id == log_id)
    }

    pub fn high_impact_for(&self, task_id: &str) -> Option<&HighImpactTask> {
        self.high_impact_tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Apply a partial update and bump the version.
    pub fn apply(&mut self, update: &ProgressUpdate) {
        if let Some(v) = update.current_streak {
            self.current_streak = v;
        }
        if let Some(v) = update.longest_streak {
            self.longest_streak = v;
        }
        if let Some(v) = update.last_activity {
            self.last_activity = Some(v);
        }
        if let Some(v) = update.total_tasks_completed {
            self.total_tasks_completed = v;
        }
        if let Some(v) = update.weekly_points {
            self.weekly_points = v;
        }
        if let Some(v) = update.weekly_goal {
            self.weekly_goal = v;
        }
        if let Some(v) = &update.high_impact_tasks {
            self.high_impact_tasks = v.clone();
        }
        if let Some(log_id) = &update.applied_log {
            remember_applied(&mut self.applied_logs, log_id);
        }
        self.version += 1;
    }

    /// Whether a store may apply `update` to this record.
    pub fn accepts(&self, update: &ProgressUpdate) -> bool {
        update.expected_version.map_or(true, |v| v == self.version)
    }
}

/// Partial-field write for the progress store. `None` leaves a field as is.
///
/// With `expected_version` set, stores reject the write with
/// [`StoreError::Conflict`](crate::error::StoreError::Conflict) when the
/// record's version has moved on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub current_streak: Option<u32>,
    pub longest_streak: Option<u32>,
    pub last_activity: Option<DateTime<Utc>>,
    pub total_tasks_completed: Option<u32>,
    pub weekly_points: Option<u32>,
    pub weekly_goal: Option<u32>,
    pub high_impact_tasks: Option<Vec<HighImpactTask>>,
    /// Log whose completion this update counts
    pub applied_log: Option<String>,
    pub expected_version: Option<u64>,
}

/// Fold one completion's mood improvement into the high-impact list.
///
/// Only positive improvements are recorded. The running average uses
/// `(avg * n + value) / (n + 1)`; afterwards the list is re-sorted
/// descending by average and truncated to [`MAX_HIGH_IMPACT_TASKS`].
pub fn record_high_impact(list: &mut Vec<HighImpactTask>, task_id: &str, mood_improvement: f64) {
    if mood_improvement <= 0.0 {
        return;
    }

    match list.iter_mut().find(|t| t.task_id == task_id) {
        Some(entry) => {
            let n = entry.times_completed as f64;
            entry.avg_mood_improvement = (entry.avg_mood_improvement * n + mood_improvement) / (n + 1.0);
            entry.times_completed += 1;
        }
        None => list.push(HighImpactTask {
            task_id: task_id.to_string(),
            avg_mood_improvement: mood_improvement,
            times_completed: 1,
        }),
    }

    list.sort_by(|a, b| {
        b.avg_mood_improvement
            .partial_cmp(&a.avg_mood_improvement)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    list.truncate(MAX_HIGH_IMPACT_TASKS);
}

/// Weekly points against the goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub weekly_points: u32,
    pub weekly_goal: u32,
    /// 0-100
    pub percentage: f64,
}

impl WeeklyProgress {
    pub fn new(weekly_points: u32, weekly_goal: u32) -> Self {
        let percentage = if weekly_goal > 0 {
            (weekly_points as f64 / weekly_goal as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
        Self {
            weekly_points,
            weekly_goal,
            percentage,
        }
    }
}
