//! Task catalog types.
//!
//! Catalog tasks are immutable reference data. User-authored custom tasks
//! (see [`custom`]) additionally carry a [`CustomTaskMeta`] block that
//! tracks the owner and self-corrects the duration estimate.

pub mod custom;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Category of household work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Cleaning,
    Organizing,
    Shopping,
    Maintenance,
}

/// How much effort a task asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EffortLevel {
    Micro,
    Low,
    Medium,
    High,
}

/// Visible/emotional impact of a finished task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

/// One of the three effort variants a task may offer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IntensityTier {
    Basic,
    Standard,
    Deep,
}

/// Duration and description of a single intensity tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityDetail {
    pub description: String,
    pub minutes: u32,
}

impl IntensityDetail {
    pub fn new(description: impl Into<String>, minutes: u32) -> Self {
        Self {
            description: description.into(),
            minutes,
        }
    }
}

/// Three-tier intensity map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityLevels {
    pub basic: IntensityDetail,
    pub standard: IntensityDetail,
    pub deep: IntensityDetail,
}

impl IntensityLevels {
    pub fn get(&self, tier: IntensityTier) -> &IntensityDetail {
        match tier {
            IntensityTier::Basic => &self.basic,
            IntensityTier::Standard => &self.standard,
            IntensityTier::Deep => &self.deep,
        }
    }
}

/// Bookkeeping carried only by user-authored tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTaskMeta {
    /// User who created the task
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Number of completions recorded against this task
    pub usage_count: u32,
    /// Running average of actual completion minutes
    pub avg_completion_minutes: Option<f64>,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: String,
    pub category: TaskCategory,
    /// Room tag (matches [`crate::room::Room::kind`])
    #[serde(default)]
    pub room: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Estimated duration in minutes
    pub estimated_minutes: u32,
    pub effort: EffortLevel,
    pub impact: ImpactLevel,
    pub is_micro_task: bool,
    pub requires_decisions: bool,
    pub requires_movement: bool,
    /// Ordered checklist shown while executing
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub intensity_levels: Option<IntensityLevels>,
    /// Present only on user-authored tasks
    #[serde(default)]
    pub custom: Option<CustomTaskMeta>,
}

impl Task {
    /// Create a plain catalog task; flags default to false.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: TaskCategory,
        estimated_minutes: u32,
        effort: EffortLevel,
        impact: ImpactLevel,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            room: None,
            title: title.into(),
            description: String::new(),
            estimated_minutes,
            effort,
            impact,
            is_micro_task: false,
            requires_decisions: false,
            requires_movement: false,
            steps: Vec::new(),
            intensity_levels: None,
            custom: None,
        }
    }

    pub fn in_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn micro(mut self) -> Self {
        self.is_micro_task = true;
        self
    }

    pub fn with_decisions(mut self) -> Self {
        self.requires_decisions = true;
        self
    }

    pub fn with_movement(mut self) -> Self {
        self.requires_movement = true;
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_intensity(mut self, levels: IntensityLevels) -> Self {
        self.intensity_levels = Some(levels);
        self
    }

    /// Whether this task was authored by a user.
    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }

    /// Duration for a given tier, falling back to the base estimate.
    pub fn minutes_for(&self, tier: IntensityTier) -> u32 {
        self.intensity_levels
            .as_ref()
            .map(|levels| levels.get(tier).minutes)
            .unwrap_or(self.estimated_minutes)
    }
}

macro_rules! impl_str_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ValidationError::InvalidValue {
                        field: $field.to_string(),
                        message: format!("unknown value '{other}'"),
                    }),
                }
            }
        }
    };
}

impl_str_enum!(TaskCategory, "category", {
    Cleaning => "cleaning",
    Organizing => "organizing",
    Shopping => "shopping",
    Maintenance => "maintenance",
});

impl_str_enum!(EffortLevel, "effort", {
    Micro => "micro",
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl_str_enum!(ImpactLevel, "impact", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl_str_enum!(IntensityTier, "intensity", {
    Basic => "basic",
    Standard => "standard",
    Deep => "deep",
});
