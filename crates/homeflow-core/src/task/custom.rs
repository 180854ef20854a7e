//! User-authored tasks.
//!
//! Custom tasks live in their own store next to the catalog. Flags the user
//! does not fill in are inferred from duration and a few keywords in the
//! title and description.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CustomTaskMeta, EffortLevel, ImpactLevel, IntensityDetail, IntensityLevels, Task, TaskCategory,
};
use crate::error::{CoreError, ValidationError};

/// Number of recorded uses after which the estimate follows reality.
pub const ESTIMATE_CORRECTION_USES: u32 = 3;

/// Longest duration still treated as a micro-task.
pub const MICRO_TASK_MAX_MINUTES: u32 = 5;

const DECISION_WORDS: &[&str] = &["select", "choose", "decide", "sort by", "separate", "classify"];
const MOVEMENT_WORDS: &[&str] = &["walk", "carry", "take to", "move", "go to", "upstairs", "downstairs"];
const HIGH_IMPACT_WORDS: &[&str] = &["important", "essential", "critical", "must", "necessary"];
const MEDIUM_IMPACT_WORDS: &[&str] = &["improve", "helps", "useful", "nice to"];

/// User input for a new custom task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub room: Option<String>,
    pub category: TaskCategory,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub intensity_levels: Option<IntensityLevels>,
}

/// Editable fields of a custom task. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomTaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub room: Option<String>,
    pub category: Option<TaskCategory>,
    pub estimated_minutes: Option<u32>,
    pub effort: Option<EffortLevel>,
    pub impact: Option<ImpactLevel>,
    pub steps: Option<Vec<String>>,
    pub intensity_levels: Option<IntensityLevels>,
}

/// Effort bucket for a duration.
pub fn infer_effort(minutes: u32) -> EffortLevel {
    match minutes {
        0..=3 => EffortLevel::Micro,
        4..=10 => EffortLevel::Low,
        11..=20 => EffortLevel::Medium,
        _ => EffortLevel::High,
    }
}

fn mentions(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn infer_impact(text: &str) -> ImpactLevel {
    if mentions(text, HIGH_IMPACT_WORDS) {
        ImpactLevel::High
    } else if mentions(text, MEDIUM_IMPACT_WORDS) {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    }
}

/// Build a custom task owned by `owner`, inferring the classification flags.
pub fn create_custom_task(
    owner: &str,
    draft: CustomTaskDraft,
    now: DateTime<Utc>,
) -> Result<Task, ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::EmptyField("title".into()));
    }
    if owner.trim().is_empty() {
        return Err(ValidationError::EmptyField("owner".into()));
    }

    let text = format!("{} {}", draft.title, draft.description).to_lowercase();
    let minutes = draft.estimated_minutes;

    let mut task = Task::new(
        uuid::Uuid::new_v4().to_string(),
        draft.title.trim(),
        draft.category,
        minutes,
        infer_effort(minutes),
        infer_impact(&text),
    )
    .with_description(draft.description)
    .with_steps(draft.steps);

    task.room = draft.room;
    task.intensity_levels = draft.intensity_levels;
    task.is_micro_task = minutes <= MICRO_TASK_MAX_MINUTES;
    task.requires_decisions = mentions(&text, DECISION_WORDS);
    task.requires_movement = mentions(&text, MOVEMENT_WORDS);
    task.custom = Some(CustomTaskMeta {
        owner: owner.to_string(),
        created_at: now,
        last_modified: now,
        usage_count: 0,
        avg_completion_minutes: None,
    });

    Ok(task)
}

/// Fail unless `user_id` authored `task`.
pub fn ensure_owner(task: &Task, user_id: &str) -> Result<(), CoreError> {
    match &task.custom {
        Some(meta) if meta.owner == user_id => Ok(()),
        _ => Err(CoreError::NotAuthorized {
            user_id: user_id.to_string(),
            task_id: task.id.clone(),
        }),
    }
}

/// Apply an edit and bump `last_modified`. The caller checks ownership.
pub fn apply_patch(task: &mut Task, patch: CustomTaskPatch, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if let Some(title) = patch.title {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title".into()));
        }
        task.title = title.trim().to_string();
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(room) = patch.room {
        task.room = Some(room);
    }
    if let Some(category) = patch.category {
        task.category = category;
    }
    if let Some(minutes) = patch.estimated_minutes {
        task.estimated_minutes = minutes;
    }
    if let Some(effort) = patch.effort {
        task.effort = effort;
    }
    if let Some(impact) = patch.impact {
        task.impact = impact;
    }
    if let Some(steps) = patch.steps {
        task.steps = steps;
    }
    if let Some(levels) = patch.intensity_levels {
        task.intensity_levels = Some(levels);
    }
    if let Some(meta) = task.custom.as_mut() {
        meta.last_modified = now;
    }
    Ok(())
}

/// Record one completion against a custom task.
///
/// Keeps a running average of actual minutes; from the third use on the
/// estimate is replaced by the rounded average. Returns `false` for catalog
/// tasks, which are left untouched.
pub fn record_usage(task: &mut Task, actual_minutes: u32, now: DateTime<Utc>) -> bool {
    let Some(meta) = task.custom.as_mut() else {
        return false;
    };

    let previous = meta.usage_count as f64;
    let uses = meta.usage_count + 1;
    let avg = match meta.avg_completion_minutes {
        Some(avg) => (avg * previous + actual_minutes as f64) / uses as f64,
        None => actual_minutes as f64,
    };

    meta.usage_count = uses;
    meta.avg_completion_minutes = Some(avg);
    meta.last_modified = now;

    if uses >= ESTIMATE_CORRECTION_USES {
        task.estimated_minutes = avg.round() as u32;
    }
    true
}

/// Default basic/standard/deep split for a base duration.
pub fn suggest_intensity_levels(base_minutes: u32) -> IntensityLevels {
    let basic = ((base_minutes as f64 * 0.4).round() as u32).max(1);
    IntensityLevels {
        basic: IntensityDetail::new("Quick version", basic),
        standard: IntensityDetail::new("Full version", base_minutes),
        deep: IntensityDetail::new("Thorough version", base_minutes * 2),
    }
}
