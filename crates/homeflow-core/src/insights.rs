//! User-facing insights derived from learned patterns and progress.

use serde::{Deserialize, Serialize};

use crate::patterns::{TimeOfDay, UserPatterns};
use crate::progress::UserProgress;
use crate::task::Task;

/// Streak length worth celebrating.
pub const STREAK_INSIGHT_MIN: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Time,
    Task,
    Mood,
    Streak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, message: String) -> Self {
        Self { kind, message }
    }
}

fn period_label(slot: TimeOfDay) -> &'static str {
    match slot {
        TimeOfDay::Morning => "Mornings",
        TimeOfDay::Afternoon => "Afternoons",
        TimeOfDay::Evening => "Evenings",
    }
}

/// Build insights in a fixed order: time, duration, mood, streak.
///
/// `top_task` is the catalog entry for the first high-impact task, if the
/// caller could resolve it.
pub fn generate_insights(
    patterns: &UserPatterns,
    progress: &UserProgress,
    top_task: Option<&Task>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    if let Some(slot) = patterns.best_time_of_day {
        insights.push(Insight::new(
            InsightKind::Time,
            format!("{} are your best time to get going", period_label(slot)),
        ));
    }

    if let Some(minutes) = patterns.preferred_duration {
        insights.push(Insight::new(
            InsightKind::Task,
            format!("Your tasks usually take about {minutes} minutes"),
        ));
    }

    if let (Some(entry), Some(task)) = (progress.high_impact_tasks.first(), top_task) {
        if entry.task_id == task.id {
            insights.push(Insight::new(
                InsightKind::Mood,
                format!(
                    "\"{}\" tends to lift your mood (+{:.1} on average)",
                    task.title, entry.avg_mood_improvement
                ),
            ));
        }
    }

    if progress.current_streak >= STREAK_INSIGHT_MIN {
        insights.push(Insight::new(
            InsightKind::Streak,
            format!("{} days in a row! You're building a habit", progress.current_streak),
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{record_high_impact, DEFAULT_WEEKLY_GOAL};
    use crate::task::{EffortLevel, ImpactLevel, TaskCategory};

    #[test]
    fn empty_records_give_no_insights() {
        let insights = generate_insights(&UserPatterns::new("u"), &UserProgress::new("u", DEFAULT_WEEKLY_GOAL), None);
        assert!(insights.is_empty());
    }

    #[test]
    fn all_kinds_in_order() {
        let mut patterns = UserPatterns::new("u");
        patterns.best_time_of_day = Some(TimeOfDay::Evening);
        patterns.preferred_duration = Some(7);

        let mut progress = UserProgress::new("u", DEFAULT_WEEKLY_GOAL);
        progress.current_streak = 4;
        record_high_impact(&mut progress.high_impact_tasks, "dishes", 1.5);
        let task = Task::new("dishes", "Wash the dishes", TaskCategory::Cleaning, 10, EffortLevel::Low, ImpactLevel::High);

        let insights = generate_insights(&patterns, &progress, Some(&task));
        let kinds: Vec<_> = insights.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![InsightKind::Time, InsightKind::Task, InsightKind::Mood, InsightKind::Streak]
        );
        assert!(insights[0].message.starts_with("Evenings"));
        assert!(insights[2].message.contains("+1.5"));
    }
}
