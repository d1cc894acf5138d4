//! Session configuration.
//!
//! [`AppConfig`] controls how the default achievement ladder is generated and
//! which defaults the task form falls back to. It is usually supplied by the
//! host as JSON when a session is created; every field is optional on the wire.
//!
//! ```rust
//! use chore_quest_core::app_config::AppConfig;
//!
//! let config = AppConfig::from_json(r#"{"levelCount": 10}"#)?;
//! assert_eq!(config.level_count, 10);
//! assert_eq!(config.points_per_level, 100);
//! # Ok::<(), chore_quest_core::app_response::AppResponse>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

pub const DEFAULT_LEVEL_COUNT: u32 = 25;
pub const DEFAULT_POINTS_PER_LEVEL: u64 = 100;
pub const DEFAULT_TASK_POINTS: u64 = 10;
/// Upper bound on `levelCount`; the generated ladder is allocated up front.
pub const MAX_LEVEL_COUNT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Number of levels in the generated ladder.
    pub level_count: u32,
    /// Points between two consecutive level thresholds.
    pub points_per_level: u64,
    /// Points a new task is worth when the form leaves the field empty.
    pub default_task_points: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            level_count: DEFAULT_LEVEL_COUNT,
            points_per_level: DEFAULT_POINTS_PER_LEVEL,
            default_task_points: DEFAULT_TASK_POINTS,
        }
    }
}

impl AppConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.level_count == 0 {
            return Err(AppResponse::invalid("levelCount must be at least 1"));
        }
        if self.level_count > MAX_LEVEL_COUNT {
            return Err(AppResponse::invalid(format!(
                "levelCount must be at most {MAX_LEVEL_COUNT}, got {}",
                self.level_count
            )));
        }
        if self.points_per_level == 0 {
            return Err(AppResponse::invalid("pointsPerLevel must be a positive number"));
        }
        // the top threshold is levelCount * pointsPerLevel and must stay distinct
        if u64::from(self.level_count).checked_mul(self.points_per_level).is_none() {
            return Err(AppResponse::invalid(format!(
                "levelCount {} times pointsPerLevel {} overflows the point range",
                self.level_count, self.points_per_level
            )));
        }
        if self.default_task_points == 0 {
            return Err(AppResponse::invalid("defaultTaskPoints must be at least 1"));
        }
        Ok(())
    }
}
