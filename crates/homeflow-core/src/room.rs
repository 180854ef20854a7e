//! Rooms: per-user reference data used as scoring input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// How much the user cares about keeping a room in shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPriority {
    High,
    Medium,
    Low,
}

impl RoomPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomPriority::High => "high",
            RoomPriority::Medium => "medium",
            RoomPriority::Low => "low",
        }
    }
}

impl fmt::Display for RoomPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(RoomPriority::High),
            "medium" => Ok(RoomPriority::Medium),
            "low" => Ok(RoomPriority::Low),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("unknown value '{other}'"),
            }),
        }
    }
}

/// A room in the user's home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub user_id: String,
    /// Room type tag, matched against [`crate::task::Task::room`]
    pub kind: String,
    pub name: String,
    pub priority: RoomPriority,
    /// Last time any work was done in the room
    pub last_serviced: Option<DateTime<Utc>>,
}

impl Room {
    pub fn new(
        user_id: impl Into<String>,
        kind: impl Into<String>,
        priority: RoomPriority,
    ) -> Self {
        let kind = kind.into();
        Self {
            id: format!("{}:{}", uuid::Uuid::new_v4(), kind),
            user_id: user_id.into(),
            name: kind.clone(),
            kind,
            priority,
            last_serviced: None,
        }
    }

    pub fn serviced_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_serviced = Some(at);
        self
    }

    /// Whole days since the room was last serviced, never negative.
    pub fn days_since_serviced(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_serviced
            .map(|at| (now - at).num_days().max(0))
    }
}
