//! Candidate filtering.
//!
//! Applies a strategy's [`TaskFilters`] to the catalog. Predicates are ANDed
//! and an unset predicate is a no-op. The output keeps catalog order.

use std::collections::HashSet;

use crate::activity::ActivityLog;
use crate::strategy::TaskFilters;
use crate::task::Task;

/// Filter the catalog down to candidates for a strategy.
pub fn filter_tasks(tasks: &[Task], filters: &TaskFilters, history: &[ActivityLog]) -> Vec<Task> {
    let completed: HashSet<&str> = if filters.previously_completed {
        history
            .iter()
            .filter(|log| log.completed)
            .map(|log| log.task_id.as_str())
            .collect()
    } else {
        HashSet::new()
    };

    tasks
        .iter()
        .filter(|task| passes(task, filters, &completed))
        .cloned()
        .collect()
}

/// Single-task predicate; `completed` holds ids with a completed log.
fn passes(task: &Task, filters: &TaskFilters, completed: &HashSet<&str>) -> bool {
    if let Some(micro) = filters.is_micro_task {
        if task.is_micro_task != micro {
            return false;
        }
    }

    if let Some(max) = filters.max_minutes {
        if task.estimated_minutes > max {
            return false;
        }
    }

    if filters.requires_decisions == Some(false) && task.requires_decisions {
        return false;
    }

    if filters.requires_movement == Some(false) && task.requires_movement {
        return false;
    }

    if let Some(allowed) = filters.effort.as_deref() {
        if !allowed.is_empty() && !allowed.contains(&task.effort) {
            return false;
        }
    }

    if let Some(allowed) = filters.category.as_deref() {
        if !allowed.is_empty() && !allowed.contains(&task.category) {
            return false;
        }
    }

    if let Some(allowed) = filters.impact.as_deref() {
        if !allowed.is_empty() && !allowed.contains(&task.impact) {
            return false;
        }
    }

    if filters.has_intensity_levels && task.intensity_levels.is_none() {
        return false;
    }

    if filters.previously_completed && !completed.contains(task.id.as_str()) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Mood;
    use crate::strategy::{select_strategy, Intention, UserState};
    use crate::task::{EffortLevel, ImpactLevel, IntensityDetail, IntensityLevels, TaskCategory};
    use chrono::Utc;

    fn catalog() -> Vec<Task> {
        vec![
            Task::new("make-bed", "Make bed", TaskCategory::Organizing, 2, EffortLevel::Micro, ImpactLevel::High)
                .micro(),
            Task::new("closet", "Sort closet", TaskCategory::Organizing, 15, EffortLevel::Medium, ImpactLevel::High)
                .with_decisions()
                .with_movement(),
            Task::new("mirror", "Wipe mirror", TaskCategory::Cleaning, 2, EffortLevel::Micro, ImpactLevel::Medium)
                .micro()
                .with_intensity(IntensityLevels {
                    basic: IntensityDetail::new("Quick wipe", 1),
                    standard: IntensityDetail::new("Full wipe", 2),
                    deep: IntensityDetail::new("Mirror and frame", 5),
                }),
            Task::new("shower", "Scrub shower", TaskCategory::Cleaning, 12, EffortLevel::Medium, ImpactLevel::High)
                .with_movement(),
        ]
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn empty_filters_keep_everything_in_order() {
        let tasks = catalog();
        let out = filter_tasks(&tasks, &TaskFilters::default(), &[]);
        assert_eq!(ids(&out), ids(&tasks));
    }

    #[test]
    fn overwhelmed_keeps_only_tiny_decision_free_tasks() {
        let strategy = select_strategy(&UserState::new(Intention::Overwhelmed));
        let out = filter_tasks(&catalog(), &strategy.filters, &[]);
        assert_eq!(ids(&out), vec!["make-bed", "mirror"]);
    }

    #[test]
    fn intensity_and_history_checks() {
        let tasks = catalog();
        let with_levels = TaskFilters {
            has_intensity_levels: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &with_levels, &[])), vec!["mirror"]);

        let mut done = ActivityLog::start("u", "shower", Mood::Bad, None, Utc::now());
        done.completed = true;
        let open = ActivityLog::start("u", "closet", Mood::Bad, None, Utc::now());

        let familiar = TaskFilters {
            previously_completed: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &familiar, &[done, open])), vec!["shower"]);
    }

    #[test]
    fn movement_and_category_sets() {
        let filters = TaskFilters {
            requires_movement: Some(false),
            category: Some(vec![TaskCategory::Organizing]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&catalog(), &filters, &[])), vec!["make-bed"]);
    }
}
