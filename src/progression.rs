//! Achievement progression engine.
//!
//! Pure functions over a slice of [`AchievementLevel`] and a user's total
//! points. Nothing here mutates its input: every function that reports
//! `unlocked` flags returns fresh records.
//!
//! The level slice may come in any order; functions that care about order
//! sort by `level`. Thresholds are assumed to satisfy the ordering invariant
//! checked by [`crate::achievement_model::validate_levels`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::achievement_model::AchievementLevel;

/// Returns a copy of `levels` with `unlocked` set iff `total_points >= points_needed`.
///
/// Input order is preserved.
///
/// ```rust
/// use chore_quest_core::achievement_model::AchievementLevel;
/// use chore_quest_core::progression::compute_unlocked;
///
/// let levels = vec![
///     AchievementLevel::new("a", 1, 100, "One"),
///     AchievementLevel::new("b", 2, 200, "Two"),
/// ];
/// let flags: Vec<bool> = compute_unlocked(&levels, 150).iter().map(|l| l.unlocked).collect();
/// assert_eq!(flags, vec![true, false]);
/// ```
#[must_use]
pub fn compute_unlocked(levels: &[AchievementLevel], total_points: u64) -> Vec<AchievementLevel> {
    levels
        .iter()
        .map(|level| AchievementLevel {
            unlocked: total_points >= level.points_needed,
            ..level.clone()
        })
        .collect()
}

/// Number of levels whose threshold is at or below `total_points`.
#[must_use]
pub fn unlocked_count(levels: &[AchievementLevel], total_points: u64) -> usize {
    levels
        .iter()
        .filter(|level| total_points >= level.points_needed)
        .count()
}

/// The lowest-level entry still locked at `total_points`, or `None` once every
/// level is unlocked.
#[must_use]
pub fn find_next_level(levels: &[AchievementLevel], total_points: u64) -> Option<AchievementLevel> {
    levels
        .iter()
        .filter(|level| total_points < level.points_needed)
        .min_by_key(|level| level.level)
        .map(|level| AchievementLevel {
            unlocked: false,
            ..level.clone()
        })
}

/// Percentage of the way from the previous level's threshold to `target`'s,
/// clamped to `[0, 100]`.
///
/// The previous threshold is taken from the level numbered `target.level - 1`.
/// Level 1 measures from zero. When the immediate predecessor is missing from
/// a gapped ladder, the nearest lower level is used instead.
///
/// ```rust
/// use chore_quest_core::achievement_model::AchievementLevel;
/// use chore_quest_core::progression::compute_progress;
///
/// let levels = vec![
///     AchievementLevel::new("a", 1, 100, "One"),
///     AchievementLevel::new("b", 2, 200, "Two"),
/// ];
/// assert_eq!(compute_progress(&levels, 150, &levels[1]), 50.0);
/// ```
#[must_use]
pub fn compute_progress(levels: &[AchievementLevel], total_points: u64, target: &AchievementLevel) -> f64 {
    let previous_points = previous_threshold(levels, target);

    let gained = total_points as f64 - previous_points as f64;
    let mut span = target.points_needed as f64 - previous_points as f64;
    if span <= 0.0 {
        debug!(
            "Level {} does not rise above its predecessor ({} <= {}); using a unit span",
            target.level, target.points_needed, previous_points
        );
        span = 1.0;
    }

    (gained * 100.0 / span).clamp(0.0, 100.0)
}

fn previous_threshold(levels: &[AchievementLevel], target: &AchievementLevel) -> u64 {
    if target.level <= 1 {
        return 0;
    }
    levels
        .iter()
        .filter(|level| level.level < target.level)
        .max_by_key(|level| level.level)
        .map(|level| level.points_needed)
        .unwrap_or(0)
}

/// Levels that unlock when a user's total moves from `before` to `after`,
/// ordered by level. Empty when points did not increase.
#[must_use]
pub fn newly_unlocked(levels: &[AchievementLevel], before: u64, after: u64) -> Vec<AchievementLevel> {
    let mut crossed: Vec<AchievementLevel> = levels
        .iter()
        .filter(|level| before < level.points_needed && level.points_needed <= after)
        .map(|level| AchievementLevel {
            unlocked: true,
            ..level.clone()
        })
        .collect();
    crossed.sort_by_key(|level| level.level);
    crossed
}

/// Everything a progress bar needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_points: u64,
    pub unlocked_count: usize,
    pub level_count: usize,
    /// Highest unlocked level, if any.
    pub current_level: Option<u32>,
    pub next_level: Option<AchievementLevel>,
    /// Progress toward `next_level`; 100 once the ladder is complete.
    pub percentage: f64,
    pub points_to_next: Option<u64>,
    pub is_max_level: bool,
}

#[must_use]
pub fn progress_snapshot(levels: &[AchievementLevel], total_points: u64) -> ProgressSnapshot {
    let next_level = find_next_level(levels, total_points);
    let current_level = levels
        .iter()
        .filter(|level| total_points >= level.points_needed)
        .map(|level| level.level)
        .max();

    let (percentage, points_to_next) = match &next_level {
        Some(target) => (
            compute_progress(levels, total_points, target),
            Some(target.points_needed.saturating_sub(total_points)),
        ),
        None => (100.0, None),
    };

    ProgressSnapshot {
        total_points,
        unlocked_count: unlocked_count(levels, total_points),
        level_count: levels.len(),
        current_level,
        is_max_level: next_level.is_none(),
        next_level,
        percentage,
        points_to_next,
    }
}
