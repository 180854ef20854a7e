//! Strategy selection.
//!
//! Maps the user's self-reported state to a named bundle of task filters and
//! messaging hints. Pure and deterministic.
//!
//! | Intention | Strategy | Filters |
//! |-----------|----------|---------|
//! | overwhelmed | `micro_activation` | micro, ≤3 min, no decisions, effort ∈ {micro} |
//! | have_energy | `capitalize_activation` | ≤ budget, impact ∈ {medium, high}, effort ∈ {low, medium, high} |
//! | hard_to_start | per [`Barrier`] | see [`select_for_barrier`] |
//! | need_planning | `planned_activation` | none |
//! | anything else | `neutral` | effort ∈ {micro, low, medium} |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::task::{EffortLevel, ImpactLevel, TaskCategory};

/// What the user says they need right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intention {
    Overwhelmed,
    HaveEnergy,
    HardToStart,
    NeedPlanning,
    NeedShopping,
}

/// Obstacle reported when the intention is [`Intention::HardToStart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Barrier {
    NoEnergy,
    DontKnowFirst,
    NotPerfectTime,
    TooMuch,
    Anxiety,
}

/// Self-reported time available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBudget {
    #[serde(rename = "5-10")]
    FiveToTen,
    #[serde(rename = "15-20")]
    FifteenToTwenty,
    #[serde(rename = "30+")]
    ThirtyPlus,
    #[serde(rename = "unsure")]
    Unsure,
}

impl TimeBudget {
    /// Minutes ceiling for a budget; unspecified budgets get 15.
    pub fn max_minutes(budget: Option<TimeBudget>) -> u32 {
        match budget {
            Some(TimeBudget::FiveToTen) => 10,
            Some(TimeBudget::FifteenToTwenty) => 20,
            Some(TimeBudget::ThirtyPlus) => 60,
            Some(TimeBudget::Unsure) | None => 15,
        }
    }
}

/// Input supplied by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    pub intention: Intention,
    #[serde(default)]
    pub barrier: Option<Barrier>,
    #[serde(default)]
    pub time_budget: Option<TimeBudget>,
}

impl UserState {
    pub fn new(intention: Intention) -> Self {
        Self {
            intention,
            barrier: None,
            time_budget: None,
        }
    }

    pub fn with_barrier(mut self, barrier: Barrier) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn with_time_budget(mut self, budget: TimeBudget) -> Self {
        self.time_budget = Some(budget);
        self
    }
}

/// Candidate predicates. Unset fields are no-ops; set fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilters {
    pub is_micro_task: Option<bool>,
    pub max_minutes: Option<u32>,
    /// `Some(false)` excludes tasks that require decisions
    pub requires_decisions: Option<bool>,
    /// `Some(false)` excludes tasks that require movement
    pub requires_movement: Option<bool>,
    pub effort: Option<Vec<EffortLevel>>,
    pub category: Option<Vec<TaskCategory>>,
    pub impact: Option<Vec<ImpactLevel>>,
    pub has_intensity_levels: bool,
    pub previously_completed: bool,
}

impl TaskFilters {
    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        *self == TaskFilters::default()
    }
}

/// Copy shown around the task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagingHints {
    pub pre_task: Option<String>,
    pub emphasize_basic_tier: bool,
}

/// A named bundle of filters and messaging hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub name: &'static str,
    pub principles: Vec<&'static str>,
    pub filters: TaskFilters,
    pub messaging: Option<MessagingHints>,
}

impl Strategy {
    fn new(name: &'static str, principles: &[&'static str], filters: TaskFilters) -> Self {
        Self {
            name,
            principles: principles.to_vec(),
            filters,
            messaging: None,
        }
    }

    fn with_pre_task(mut self, text: &str) -> Self {
        self.messaging
            .get_or_insert_with(MessagingHints::default)
            .pre_task = Some(text.to_string());
        self
    }
}

/// Pick the strategy for a user state.
pub fn select_strategy(state: &UserState) -> Strategy {
    match state.intention {
        Intention::Overwhelmed => Strategy::new(
            "micro_activation",
            &["minimize_cognitive_load", "immediate_action", "no_choice_paralysis"],
            TaskFilters {
                is_micro_task: Some(true),
                max_minutes: Some(3),
                requires_decisions: Some(false),
                effort: Some(vec![EffortLevel::Micro]),
                ..Default::default()
            },
        )
        .with_pre_task("Let's start really small. No pressure."),

        Intention::HaveEnergy => Strategy::new(
            "capitalize_activation",
            &["maximize_impact", "leverage_momentum", "high_reinforcement_tasks"],
            TaskFilters {
                max_minutes: Some(TimeBudget::max_minutes(state.time_budget)),
                impact: Some(vec![ImpactLevel::Medium, ImpactLevel::High]),
                effort: Some(vec![EffortLevel::Low, EffortLevel::Medium, EffortLevel::High]),
                ..Default::default()
            },
        ),

        Intention::HardToStart => select_for_barrier(state.barrier),

        Intention::NeedPlanning => Strategy::new(
            "planned_activation",
            &["user_directed", "show_options"],
            TaskFilters::default(),
        ),

        Intention::NeedShopping => neutral(),
    }
}

/// Second-level dispatch for users who find it hard to start.
pub fn select_for_barrier(barrier: Option<Barrier>) -> Strategy {
    let low_effort = || Some(vec![EffortLevel::Micro, EffortLevel::Low]);

    match barrier {
        Some(Barrier::NoEnergy) => Strategy::new(
            "low_effort_activation",
            &["minimize_physical_effort", "mental_tasks_ok"],
            TaskFilters {
                requires_movement: Some(false),
                effort: low_effort(),
                category: Some(vec![TaskCategory::Organizing, TaskCategory::Shopping]),
                ..Default::default()
            },
        ),
        Some(Barrier::DontKnowFirst) => Strategy::new(
            "remove_choice",
            &["provide_direction", "random_ok"],
            TaskFilters {
                effort: low_effort(),
                ..Default::default()
            },
        ),
        Some(Barrier::NotPerfectTime) => {
            let mut strategy = Strategy::new(
                "challenge_perfectionism",
                &["emphasize_progress_over_perfection", "time_boxing"],
                TaskFilters {
                    has_intensity_levels: true,
                    ..Default::default()
                },
            )
            .with_pre_task("Remember: only the BASIC level. Done beats perfect.");
            if let Some(hints) = strategy.messaging.as_mut() {
                hints.emphasize_basic_tier = true;
            }
            strategy
        }
        Some(Barrier::TooMuch) => Strategy::new(
            "micro_fragmentation",
            &["break_down", "tiny_steps"],
            TaskFilters {
                is_micro_task: Some(true),
                max_minutes: Some(2),
                ..Default::default()
            },
        )
        .with_pre_task("Just one small step. That's all."),
        Some(Barrier::Anxiety) => Strategy::new(
            "reduce_anxiety",
            &["familiar_tasks", "high_success_rate"],
            TaskFilters {
                previously_completed: true,
                effort: low_effort(),
                ..Default::default()
            },
        )
        .with_pre_task("Let's go with something you already know you do well."),
        None => Strategy::new(
            "gentle_start",
            &["low_barrier"],
            TaskFilters {
                effort: low_effort(),
                ..Default::default()
            },
        ),
    }
}

fn neutral() -> Strategy {
    Strategy::new(
        "neutral",
        &["balanced_options"],
        TaskFilters {
            effort: Some(vec![EffortLevel::Micro, EffortLevel::Low, EffortLevel::Medium]),
            ..Default::default()
        },
    )
}

impl Intention {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intention::Overwhelmed => "overwhelmed",
            Intention::HaveEnergy => "have_energy",
            Intention::HardToStart => "hard_to_start",
            Intention::NeedPlanning => "need_planning",
            Intention::NeedShopping => "need_shopping",
        }
    }
}

impl fmt::Display for Intention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intention {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "overwhelmed" => Ok(Intention::Overwhelmed),
            "have_energy" => Ok(Intention::HaveEnergy),
            "hard_to_start" | "stuck" => Ok(Intention::HardToStart),
            "need_planning" | "planning" => Ok(Intention::NeedPlanning),
            "need_shopping" | "shopping" => Ok(Intention::NeedShopping),
            other => Err(ValidationError::InvalidValue {
                field: "intention".into(),
                message: format!("unknown value '{other}'"),
            }),
        }
    }
}

impl FromStr for Barrier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "no_energy" => Ok(Barrier::NoEnergy),
            "dont_know_first" => Ok(Barrier::DontKnowFirst),
            "not_perfect_time" => Ok(Barrier::NotPerfectTime),
            "too_much" => Ok(Barrier::TooMuch),
            "anxiety" => Ok(Barrier::Anxiety),
            other => Err(ValidationError::InvalidValue {
                field: "barrier".into(),
                message: format!("unknown value '{other}'"),
            }),
        }
    }
}

impl FromStr for TimeBudget {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5-10" => Ok(TimeBudget::FiveToTen),
            "15-20" => Ok(TimeBudget::FifteenToTwenty),
            "30+" => Ok(TimeBudget::ThirtyPlus),
            "unsure" => Ok(TimeBudget::Unsure),
            other => Err(ValidationError::InvalidValue {
                field: "time_budget".into(),
                message: format!("expected 5-10, 15-20, 30+ or unsure, got '{other}'"),
            }),
        }
    }
}
