//! Achievement level definitions.
//!
//! This module defines [`AchievementLevel`], the reference data that drives
//! progression. A collection of levels is generated once per session (see
//! [`generate_default_levels`]) and is treated as read-mostly afterwards.
//!
//! # Ordering invariant
//!
//! Sorted by `level`, the `points_needed` thresholds are strictly increasing
//! and no two entries share a `level`. [`validate_levels`] checks this; the
//! progression engine assumes it and does not re-check.
//!
//! # Derived state
//!
//! The `unlocked` flag is carried on the wire for the front-end's benefit but
//! it is never ground truth. Every query recomputes it from the user's total
//! points through [`crate::progression::compute_unlocked`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::app_config::{AppConfig, MAX_LEVEL_COUNT};
use crate::app_response::AppResponse;
use crate::reward_model::{find_reward, Reward};

const LEVEL_TITLES: [&str; 25] = [
    "Task Beginner",
    "Responsibility Rookie",
    "Helper Hero",
    "Chore Champion",
    "Achievement Ace",
    "Star Student",
    "Responsibility Rockstar",
    "Task Titan",
    "Super Helper",
    "Duty Dynamo",
    "Goal Getter",
    "Mission Master",
    "Responsibility Royal",
    "Task Tycoon",
    "Helper Hotshot",
    "Chore Chief",
    "Achievement Authority",
    "Star Superstar",
    "Responsibility Ruler",
    "Task Tamer",
    "Helping Heavyweight",
    "Duty Dominator",
    "Goal Guardian",
    "Mission Maestro",
    "Ultimate Achiever",
];

const LEVEL_ICONS: [&str; 10] = ["🏆", "🌟", "🚀", "🎖️", "🏅", "🥇", "👑", "⭐", "✨", "💫"];

/// (title, description, icon) of the rewards handed out by the default ladder.
const DEFAULT_REWARDS: [(&str, &str, &str); 5] = [
    ("Ice Cream Treat", "A special ice cream treat", "🍦"),
    ("Movie Night Choice", "Pick the next family movie night film", "🎬"),
    ("Extra Allowance", "$5 bonus in allowance", "💰"),
    ("Extra Screen Time", "30 minutes of extra screen time", "📱"),
    ("Special Outing", "A special trip to a place of your choice", "🚗"),
];

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// One rung of the achievement ladder.
///
/// # Examples
///
/// ```rust
/// use chore_quest_core::achievement_model::AchievementLevel;
///
/// let level = AchievementLevel::new("achievement-1", 1, 100, "Task Beginner");
/// assert!(!level.unlocked);
/// assert!(level.reward_id.is_none());
/// ```
///
/// # Serialization
///
/// Field names are camelCase on the wire (`pointsNeeded`, `rewardId`) so the
/// front-end can hand its records over unchanged. `unlocked` may be omitted
/// and defaults to `false`.
///
/// ```rust
/// use chore_quest_core::achievement_model::AchievementLevel;
///
/// let json = r#"{"id":"a-2","level":2,"pointsNeeded":200,"title":"Responsibility Rookie",
///                "description":"Earned 200 points","icon":"🌟","rewardId":"ar-2"}"#;
/// let level: AchievementLevel = serde_json::from_str(json)?;
/// assert_eq!(level.points_needed, 200);
/// assert_eq!(level.reward_id.as_deref(), Some("ar-2"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementLevel {
    /// Unique identifier.
    pub id: String,

    /// Position in the ladder, starting at 1. Defines the ordering key.
    pub level: u32,

    /// Total points at which this level unlocks.
    pub points_needed: u64,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub icon: String,

    /// Weak reference to a [`Reward`]. Resolved with [`AchievementLevel::resolve_reward`];
    /// a dangling id simply resolves to `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_id: Option<String>,

    /// Derived from total points on every query. Never authoritative.
    #[serde(default)]
    pub unlocked: bool,
}

impl AchievementLevel {
    pub fn new(id: impl Into<String>, level: u32, points_needed: u64, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level,
            points_needed,
            title: title.into(),
            description: format!("Earned {points_needed} points"),
            icon: LEVEL_ICONS[0].to_string(),
            reward_id: None,
            unlocked: false,
        }
    }

    #[must_use]
    pub fn with_reward(mut self, reward_id: impl Into<String>) -> Self {
        self.reward_id = Some(reward_id.into());
        self
    }

    /// Looks up the linked reward, if any.
    #[must_use]
    pub fn resolve_reward<'a>(&self, rewards: &'a [Reward]) -> Option<&'a Reward> {
        self.reward_id
            .as_deref()
            .and_then(|id| find_reward(rewards, id))
    }
}

/// Form payload for creating or editing a level.
///
/// Without an `id` the session creates a new level; with one it edits the
/// existing record in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub points_needed: u64,
    pub icon: String,
    #[serde(default)]
    pub reward_id: Option<String>,
    pub level: u32,
}

impl AchievementDraft {
    /// Basic form validation. Does not look at other levels.
    pub fn validate(&self) -> Result<(), AppResponse> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppResponse::invalid("Title is required"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppResponse::invalid(format!(
                "Title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppResponse::invalid("Description is too long"));
        }
        if self.points_needed == 0 {
            return Err(AppResponse::invalid("Points must be a positive number"));
        }
        if self.icon.trim().is_empty() {
            return Err(AppResponse::invalid("Icon is required"));
        }
        if self.level == 0 {
            return Err(AppResponse::invalid("Level must be a positive number"));
        }
        Ok(())
    }

    /// Builds the level record. `id` is used only when the draft carries none.
    pub fn into_level(self, id: String) -> AchievementLevel {
        AchievementLevel {
            id: self.id.unwrap_or(id),
            level: self.level,
            points_needed: self.points_needed,
            title: self.title.trim().to_string(),
            description: self.description,
            icon: self.icon,
            // the form sends "none" for an empty selection
            reward_id: self.reward_id.filter(|id| !id.is_empty() && id != "none"),
            unlocked: false,
        }
    }
}

/// Checks the ordering invariant of a level collection, in any input order.
pub fn validate_levels(levels: &[AchievementLevel]) -> Result<(), AppResponse> {
    let mut ids = HashSet::new();
    for level in levels {
        if level.level == 0 {
            return Err(AppResponse::invalid(format!(
                "Achievement '{}' has level 0; levels start at 1",
                level.id
            )));
        }
        if level.points_needed == 0 {
            return Err(AppResponse::invalid(format!(
                "Achievement '{}' must need a positive number of points",
                level.id
            )));
        }
        if !ids.insert(level.id.as_str()) {
            return Err(AppResponse::invalid(format!("Duplicate achievement id '{}'", level.id)));
        }
    }

    let mut ordered: Vec<&AchievementLevel> = levels.iter().collect();
    ordered.sort_by_key(|level| level.level);

    for pair in ordered.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if lower.level == upper.level {
            return Err(AppResponse::invalid(format!("Duplicate level {}", upper.level)));
        }
        if upper.points_needed <= lower.points_needed {
            return Err(AppResponse::invalid(format!(
                "Level {} needs {} points but level {} already needs {}",
                upper.level, upper.points_needed, lower.level, lower.points_needed
            )));
        }
    }
    Ok(())
}

/// Generates the default ladder and the rewards its levels link to.
///
/// Level `n` needs `n * config.points_per_level` points and links reward
/// `ar-{n}`, cycling through five default rewards. The config is expected
/// to have passed [`AppConfig::validate`]; the count is capped at
/// [`MAX_LEVEL_COUNT`] regardless.
///
/// ```rust
/// use chore_quest_core::achievement_model::generate_default_levels;
/// use chore_quest_core::app_config::AppConfig;
///
/// let (levels, rewards) = generate_default_levels(&AppConfig::default());
/// assert_eq!(levels.len(), 25);
/// assert_eq!(levels[2].points_needed, 300);
/// assert_eq!(rewards[0].title, "Ice Cream Treat");
/// ```
pub fn generate_default_levels(config: &AppConfig) -> (Vec<AchievementLevel>, Vec<Reward>) {
    let count = config.level_count.min(MAX_LEVEL_COUNT) as usize;
    let mut levels = Vec::with_capacity(count);
    let mut rewards = Vec::with_capacity(count);

    for i in 0..count {
        let level = i as u32 + 1;
        let points_needed = u64::from(level).saturating_mul(config.points_per_level);
        let (reward_title, reward_description, reward_icon) = DEFAULT_REWARDS[i % DEFAULT_REWARDS.len()];
        let reward = Reward::new(format!("ar-{level}"), reward_title, reward_description, reward_icon);

        let title = LEVEL_TITLES
            .get(i)
            .map(|title| title.to_string())
            .unwrap_or_else(|| format!("Level {level} Achievement"));

        levels.push(AchievementLevel {
            id: format!("achievement-{level}"),
            level,
            points_needed,
            title,
            description: format!("Earned {points_needed} points"),
            icon: LEVEL_ICONS[i % LEVEL_ICONS.len()].to_string(),
            reward_id: Some(reward.id.clone()),
            unlocked: false,
        });
        rewards.push(reward);
    }

    (levels, rewards)
}
