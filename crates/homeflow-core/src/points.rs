//! Completion rewards.
//!
//! ```text
//! base            = {micro: 5, low: 10, medium: 20, high: 30}[effort]
//! impact_mult     = {low: 1.0, medium: 1.25, high: 1.5}[impact]
//! time_bonus      = clamp(estimated - actual, 0, 5)
//! mood_bonus      = max(0, after - before) * 5
//! points          = max(round(base * impact_mult + time_bonus + mood_bonus), 1)
//! ```
//!
//! This is the only points formula. Intensity tiers do not change the reward.

use crate::activity::Mood;
use crate::task::{EffortLevel, ImpactLevel, Task};

/// Largest bonus for finishing under the estimate.
pub const MAX_TIME_BONUS: u32 = 5;

/// Points per mood step gained.
pub const MOOD_BONUS_PER_STEP: u32 = 5;

fn base_points(effort: EffortLevel) -> f64 {
    match effort {
        EffortLevel::Micro => 5.0,
        EffortLevel::Low => 10.0,
        EffortLevel::Medium => 20.0,
        EffortLevel::High => 30.0,
    }
}

fn impact_multiplier(impact: ImpactLevel) -> f64 {
    match impact {
        ImpactLevel::Low => 1.0,
        ImpactLevel::Medium => 1.25,
        ImpactLevel::High => 1.5,
    }
}

/// Bonus for finishing faster than estimated (0 when unknown or slower).
pub fn time_bonus(estimated_minutes: u32, actual_minutes: Option<u32>) -> u32 {
    actual_minutes
        .map(|actual| estimated_minutes.saturating_sub(actual).min(MAX_TIME_BONUS))
        .unwrap_or(0)
}

/// Bonus for mood gained; needs both check-ins.
pub fn mood_bonus(before: Option<Mood>, after: Option<Mood>) -> u32 {
    match (before, after) {
        (Some(b), Some(a)) => (a.value() - b.value()).max(0) as u32 * MOOD_BONUS_PER_STEP,
        _ => 0,
    }
}

/// Points earned for a completion. Always at least 1.
pub fn calculate_points(
    task: &Task,
    actual_minutes: Option<u32>,
    mood_before: Option<Mood>,
    mood_after: Option<Mood>,
) -> u32 {
    let raw = base_points(task.effort) * impact_multiplier(task.impact)
        + time_bonus(task.estimated_minutes, actual_minutes) as f64
        + mood_bonus(mood_before, mood_after) as f64;

    (raw.round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskCategory;

    fn task(effort: EffortLevel, impact: ImpactLevel, estimated: u32) -> Task {
        Task::new("t", "Task", TaskCategory::Cleaning, estimated, effort, impact)
    }

    #[test]
    fn low_effort_high_impact_scenario() {
        // round(10 * 1.5) + min(2, 5) + 2 * 5
        let points = calculate_points(
            &task(EffortLevel::Low, ImpactLevel::High, 10),
            Some(8),
            Some(Mood::Bad),
            Some(Mood::Good),
        );
        assert_eq!(points, 27);
    }

    #[test]
    fn time_bonus_is_capped_and_never_negative() {
        assert_eq!(time_bonus(30, Some(5)), 5);
        assert_eq!(time_bonus(10, Some(20)), 0);
        assert_eq!(time_bonus(10, None), 0);
    }

    #[test]
    fn mood_drop_gives_no_bonus() {
        assert_eq!(mood_bonus(Some(Mood::Good), Some(Mood::Bad)), 0);
        assert_eq!(mood_bonus(None, Some(Mood::VeryGood)), 0);
        assert_eq!(mood_bonus(Some(Mood::VeryBad), Some(Mood::VeryGood)), 20);
    }

    #[test]
    fn medium_impact_rounds() {
        // 5 * 1.25 = 6.25 -> 6
        let points = calculate_points(&task(EffortLevel::Micro, ImpactLevel::Medium, 2), Some(2), None, None);
        assert_eq!(points, 6);
    }

    #[test]
    fn never_below_one() {
        let points = calculate_points(&task(EffortLevel::Micro, ImpactLevel::Low, 0), Some(60), None, None);
        assert!(points >= 1);
    }
}
