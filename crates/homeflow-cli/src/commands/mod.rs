pub mod activity;
pub mod config;
pub mod progress;
pub mod recommend;
pub mod room;
pub mod task;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use homeflow_core::{Config, Database, EngineSettings, Mood, RecommendationEngine, Stores};
use serde::Serialize;

/// Shared state for one CLI invocation.
pub struct Context {
    pub engine: RecommendationEngine,
    pub user: String,
    pub json: bool,
    pub now: DateTime<Utc>,
}

impl Context {
    /// Open the default database and seed the task library on first use.
    pub async fn open(config: &Config, user: String, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open_default()?;
        let engine = RecommendationEngine::new(
            Stores::from_backend(Arc::new(db)),
            EngineSettings::from_config(config),
        );
        engine.seed_if_empty().await?;
        Ok(Self {
            engine,
            user,
            json,
            now: Utc::now(),
        })
    }

    /// Print `value` as JSON, or the text from `human` otherwise.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }
}

/// Mood on the 1-5 scale.
pub fn parse_mood(s: &str) -> Result<Mood, String> {
    let value: i64 = s.trim().parse().map_err(|_| format!("expected a number from 1 to 5, got '{s}'"))?;
    Mood::from_value(value).map_err(|e| e.to_string())
}
