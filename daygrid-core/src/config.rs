//! Engine tuning knobs.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shortest task the engine will ever produce.
    pub min_duration_minutes: i64,
    /// Safety valve for chain propagation.
    pub max_chain_iterations: usize,
    /// Grid used when enumerating free slots.
    pub search_step_minutes: i64,
    /// Gaps further than this from the preferred start are skipped by the
    /// nearest-gap pass (first-fit still sees them).
    pub max_search_radius_minutes: i64,
    pub cache_max_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_duration_minutes: 15,
            max_chain_iterations: 15,
            search_step_minutes: 15,
            max_search_radius_minutes: 12 * 60,
            cache_max_size: 128,
        }
    }
}

impl EngineConfig {
    pub fn min_duration(&self) -> Duration {
        Duration::minutes(self.min_duration_minutes)
    }

    pub fn search_step(&self) -> Duration {
        Duration::minutes(self.search_step_minutes)
    }

    pub fn max_search_radius(&self) -> Duration {
        Duration::minutes(self.max_search_radius_minutes)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let bad = |field: &str| Err(EngineError::InvalidConfig(format!("{field} must be positive")));
        if self.min_duration_minutes <= 0 {
            return bad("min_duration_minutes");
        }
        if self.max_chain_iterations == 0 {
            return bad("max_chain_iterations");
        }
        if self.search_step_minutes <= 0 {
            return bad("search_step_minutes");
        }
        if self.max_search_radius_minutes <= 0 {
            return bad("max_search_radius_minutes");
        }
        if self.cache_max_size == 0 {
            return bad("cache_max_size");
        }
        if self.min_duration_minutes >= 24 * 60 {
            return Err(EngineError::InvalidConfig(
                "min_duration_minutes must be shorter than a day".to_string(),
            ));
        }
        Ok(())
    }
}
