//! Caller-owned session state.
//!
//! [`AppSessionState`] is the repository for one logical UI session: it owns
//! the users, tasks, achievement ladder and rewards, and exposes explicit read
//! and update operations over them. There is no ambient global state; a host
//! that needs two sessions creates two values.
//!
//! Unlock flags are never stored. Every level query recomputes them from the
//! user's current total through [`crate::progression`].

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::achievement_model::{generate_default_levels, validate_levels, AchievementDraft, AchievementLevel};
use crate::app_config::AppConfig;
use crate::app_response::AppResponse;
use crate::progression::{
    compute_unlocked, find_next_level, newly_unlocked, progress_snapshot, ProgressSnapshot,
};
use crate::reward_model::{claim_reward, find_reward, Reward};
use crate::task_model::{Task, TaskDraft};
use crate::user_model::User;

/// Serializable image of a session, used to hand state across the FFI
/// boundary and to seed a session with demo data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    pub config: AppConfig,
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
    pub levels: Vec<AchievementLevel>,
    pub rewards: Vec<Reward>,
}

/// Result of completing a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletion {
    pub task: Task,
    pub points_awarded: u64,
    pub total_points: u64,
    /// Levels crossed by this completion, ordered by level.
    pub newly_unlocked: Vec<AchievementLevel>,
    /// The task's linked reward, when the reference resolves.
    pub reward: Option<Reward>,
}

/// Result of deleting a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRemoval {
    pub user: User,
    /// Tasks that were assigned to the user and went with them.
    pub removed_task_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AppSessionState {
    config: AppConfig,
    users: Vec<User>,
    tasks: Vec<Task>,
    levels: Vec<AchievementLevel>,
    rewards: Vec<Reward>,
    next_seq: u64,
}

impl AppSessionState {
    /// Creates an empty session with the default achievement ladder.
    pub fn init(config: AppConfig) -> Result<Self, AppResponse> {
        config.validate()?;
        let (levels, rewards) = generate_default_levels(&config);
        info!(
            "Session initialized with {} levels every {} points",
            levels.len(),
            config.points_per_level
        );
        Ok(Self {
            config,
            users: Vec::new(),
            tasks: Vec::new(),
            levels,
            rewards,
            next_seq: 1,
        })
    }

    /// Rebuilds a session from a snapshot.
    ///
    /// Levels and rewards load as a pair. A snapshot with levels replaces both
    /// the generated ladder and its rewards. A snapshot without levels keeps
    /// the generated ladder together with its rewards, and any snapshot reward
    /// sharing a generated id (e.g. a claimed `ar-1`) takes that reward's place.
    /// Loaded data must pass the same checks as live edits: every level and
    /// task `rewardId` must resolve, and every task must belong to a child.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Result<Self, AppResponse> {
        let SessionSnapshot {
            config,
            users,
            tasks,
            levels,
            rewards,
        } = snapshot;

        let mut state = Self::init(config)?;

        for user in users {
            state.add_user(user)?;
        }

        if levels.is_empty() {
            state
                .rewards
                .retain(|generated| !rewards.iter().any(|reward| reward.id == generated.id));
        } else {
            validate_levels(&levels)?;
            state.levels = levels
                .into_iter()
                .map(|level| AchievementLevel {
                    unlocked: false,
                    ..level
                })
                .collect();
            state.rewards.clear();
        }

        for reward in rewards {
            state.add_reward(reward)?;
        }

        for level in &state.levels {
            state.require_reward(level.reward_id.as_deref())?;
        }

        for task in tasks {
            if state.get_task(&task.id).is_some() {
                return Err(AppResponse::invalid(format!("Duplicate task id '{}'", task.id)));
            }
            state.child(&task.assigned_to)?;
            state.require_reward(task.reward_id.as_deref())?;
            state.tasks.push(task);
        }

        info!(
            "Session loaded: {} users, {} tasks, {} levels, {} rewards",
            state.users.len(),
            state.tasks.len(),
            state.levels.len(),
            state.rewards.len()
        );
        Ok(state)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            config: self.config.clone(),
            users: self.users.clone(),
            tasks: self.tasks.clone(),
            levels: self.levels.clone(),
            rewards: self.rewards.clone(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ----- users -----

    pub fn add_user(&mut self, user: User) -> Result<User, AppResponse> {
        user.validate()?;
        if self.get_user(&user.id).is_some() {
            return Err(AppResponse::invalid(format!("User '{}' already exists", user.id)));
        }
        debug!("Adding user {} ({:?})", user.id, user.role);
        self.users.push(user.clone());
        Ok(user)
    }

    /// Creates a user, or updates the one with the same id.
    ///
    /// A blank id creates a new child record under a generated `child-N` id.
    /// An update replaces name, age and points but never the role.
    pub fn save_user(&mut self, mut user: User) -> Result<User, AppResponse> {
        if user.id.trim().is_empty() {
            user.id = self.fresh_id("child", |state, candidate| state.get_user(candidate).is_some());
        }
        user.validate()?;

        match self.users.iter_mut().find(|existing| existing.id == user.id) {
            Some(slot) => {
                if slot.role != user.role {
                    return Err(AppResponse::invalid(format!(
                        "Cannot change the role of user '{}'",
                        user.id
                    )));
                }
                *slot = user.clone();
                info!("Updated {}'s profile", user.name);
            }
            None => {
                info!("Added new user: {} ({:?})", user.name, user.role);
                self.users.push(user.clone());
            }
        }
        Ok(user)
    }

    /// Removes a user and every task assigned to them.
    pub fn delete_user(&mut self, user_id: &str) -> Result<UserRemoval, AppResponse> {
        let index = self
            .users
            .iter()
            .position(|user| user.id == user_id)
            .ok_or_else(|| AppResponse::not_found("user", user_id))?;
        let user = self.users.remove(index);

        let mut removed_task_ids = Vec::new();
        self.tasks.retain(|task| {
            let orphaned = task.assigned_to == user_id;
            if orphaned {
                removed_task_ids.push(task.id.clone());
            }
            !orphaned
        });

        info!(
            "Deleted user {} and {} assigned task(s)",
            user.id,
            removed_task_ids.len()
        );
        Ok(UserRemoval { user, removed_task_ids })
    }

    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn children(&self) -> Vec<&User> {
        self.users.iter().filter(|user| user.is_child()).collect()
    }

    /// Overrides a child's total, e.g. when a parent corrects a balance.
    pub fn set_total_points(&mut self, user_id: &str, total_points: u64) -> Result<User, AppResponse> {
        let user = self.child_mut(user_id)?;
        user.total_points = total_points;
        Ok(user.clone())
    }

    fn child_mut(&mut self, user_id: &str) -> Result<&mut User, AppResponse> {
        let user = self
            .users
            .iter_mut()
            .find(|user| user.id == user_id)
            .ok_or_else(|| AppResponse::not_found("user", user_id))?;
        if !user.is_child() {
            return Err(AppResponse::invalid(format!("User '{user_id}' is not a child")));
        }
        Ok(user)
    }

    fn child(&self, user_id: &str) -> Result<&User, AppResponse> {
        let user = self
            .get_user(user_id)
            .ok_or_else(|| AppResponse::not_found("user", user_id))?;
        if !user.is_child() {
            return Err(AppResponse::invalid(format!("User '{user_id}' is not a child")));
        }
        Ok(user)
    }

    // ----- tasks -----

    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_for(&self, child_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.assigned_to == child_id)
            .collect()
    }

    /// Creates a task, or updates the one named by `draft.id`.
    pub fn save_task(&mut self, draft: TaskDraft, today: NaiveDate) -> Result<Task, AppResponse> {
        draft.validate()?;
        self.child(&draft.assigned_to)?;
        self.require_reward(draft.reward_id.as_deref())?;

        match draft.id.clone() {
            Some(id) => {
                let slot = self
                    .tasks
                    .iter_mut()
                    .find(|task| task.id == id)
                    .ok_or_else(|| AppResponse::not_found("task", &id))?;
                *slot = draft.apply_to(slot);
                info!("Updated task: {}", slot.title);
                Ok(slot.clone())
            }
            None => {
                let id = self.fresh_id("task", |state, candidate| state.get_task(candidate).is_some());
                let task = draft.into_task(id, today, self.config.default_task_points);
                info!("Added new task: {}", task.title);
                self.tasks.push(task.clone());
                Ok(task)
            }
        }
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    /// Completes a task on `today` and awards its points to the assignee.
    pub fn complete_task(&mut self, task_id: &str, today: NaiveDate) -> Result<TaskCompletion, AppResponse> {
        let task_index = self
            .tasks
            .iter()
            .position(|task| task.id == task_id)
            .ok_or_else(|| AppResponse::not_found("task", task_id))?;

        let assignee = self.tasks[task_index].assigned_to.clone();
        // fail before touching the task if the assignee is gone
        self.child(&assignee)?;

        self.tasks[task_index].mark_completed(today)?;
        let task = self.tasks[task_index].clone();

        let user = self.child_mut(&assignee)?;
        let before = user.total_points;
        let after = user.award_points(task.points);

        let newly_unlocked = newly_unlocked(&self.levels, before, after);
        let reward = task
            .reward_id
            .as_deref()
            .and_then(|id| find_reward(&self.rewards, id))
            .cloned();

        info!(
            "Task {} completed by {}: +{} points ({} -> {})",
            task.id,
            assignee,
            after - before,
            before,
            after
        );
        for level in &newly_unlocked {
            info!("{} unlocked level {} ({})", assignee, level.level, level.title);
        }

        Ok(TaskCompletion {
            task,
            points_awarded: after - before,
            total_points: after,
            newly_unlocked,
            reward,
        })
    }

    // ----- achievement levels -----

    /// The raw ladder. `unlocked` is always `false` here; use [`Self::levels_for`].
    pub fn levels(&self) -> &[AchievementLevel] {
        &self.levels
    }

    pub fn levels_for(&self, user_id: &str) -> Result<Vec<AchievementLevel>, AppResponse> {
        let user = self.child(user_id)?;
        let mut levels = compute_unlocked(&self.levels, user.total_points);
        levels.sort_by_key(|level| level.level);
        Ok(levels)
    }

    pub fn next_level_for(&self, user_id: &str) -> Result<Option<AchievementLevel>, AppResponse> {
        let user = self.child(user_id)?;
        Ok(find_next_level(&self.levels, user.total_points))
    }

    pub fn progress_for(&self, user_id: &str) -> Result<ProgressSnapshot, AppResponse> {
        let user = self.child(user_id)?;
        Ok(progress_snapshot(&self.levels, user.total_points))
    }

    /// Creates a level, or edits the one named by `draft.id`. The resulting
    /// ladder must still satisfy the ordering invariant; otherwise nothing changes.
    pub fn save_level(&mut self, draft: AchievementDraft) -> Result<AchievementLevel, AppResponse> {
        draft.validate()?;

        let mut candidate = self.levels.clone();
        let level = match draft.id.clone() {
            Some(id) => {
                let index = candidate
                    .iter()
                    .position(|level| level.id == id)
                    .ok_or_else(|| AppResponse::not_found("achievement", &id))?;
                let level = draft.into_level(id);
                candidate[index] = level.clone();
                level
            }
            None => {
                let id = self.fresh_id("achievement", |state, candidate| {
                    state.levels.iter().any(|level| level.id == candidate)
                });
                let level = draft.into_level(id);
                candidate.push(level.clone());
                level
            }
        };

        self.require_reward(level.reward_id.as_deref())?;
        validate_levels(&candidate)?;

        self.levels = candidate;
        info!("Saved achievement level {}: {}", level.level, level.title);
        Ok(level)
    }

    // ----- rewards -----

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn find_reward(&self, id: &str) -> Option<&Reward> {
        find_reward(&self.rewards, id)
    }

    pub fn add_reward(&mut self, reward: Reward) -> Result<Reward, AppResponse> {
        if reward.id.trim().is_empty() {
            return Err(AppResponse::invalid("Reward id is required"));
        }
        if reward.title.trim().is_empty() {
            return Err(AppResponse::invalid("Reward title is required"));
        }
        if self.find_reward(&reward.id).is_some() {
            return Err(AppResponse::invalid(format!("Reward '{}' already exists", reward.id)));
        }
        self.rewards.push(reward.clone());
        Ok(reward)
    }

    /// Ok when `reward_id` is absent or names a reward in this session.
    fn require_reward(&self, reward_id: Option<&str>) -> Result<(), AppResponse> {
        match reward_id {
            Some(id) if self.find_reward(id).is_none() => {
                Err(AppResponse::invalid(format!("Unknown reward '{id}'")))
            }
            _ => Ok(()),
        }
    }

    /// Claims a reward. Claiming twice is a no-op that still succeeds.
    pub fn claim_reward(&mut self, reward_id: &str) -> Result<Reward, AppResponse> {
        let slot = self
            .rewards
            .iter_mut()
            .find(|reward| reward.id == reward_id)
            .ok_or_else(|| AppResponse::not_found("reward", reward_id))?;
        if !slot.claimed {
            info!("Reward claimed: {}", slot.title);
        }
        *slot = claim_reward(slot);
        Ok(slot.clone())
    }

    /// Claims the reward attached to `level_id`, provided `user_id` has unlocked it.
    pub fn claim_level_reward(&mut self, user_id: &str, level_id: &str) -> Result<Reward, AppResponse> {
        let user = self.child(user_id)?;
        let level = self
            .levels
            .iter()
            .find(|level| level.id == level_id)
            .ok_or_else(|| AppResponse::not_found("achievement", level_id))?;

        if user.total_points < level.points_needed {
            return Err(AppResponse::invalid(format!(
                "Level {} is not unlocked yet ({}/{} points)",
                level.level, user.total_points, level.points_needed
            )));
        }

        let reward_id = level
            .reward_id
            .clone()
            .ok_or_else(|| AppResponse::NotFound(format!("Level {} has no reward", level.level)))?;
        self.claim_reward(&reward_id)
    }

    fn fresh_id(&mut self, prefix: &str, taken: impl Fn(&Self, &str) -> bool) -> String {
        loop {
            let candidate = format!("{prefix}-{}", self.next_seq);
            self.next_seq += 1;
            if !taken(&*self, candidate.as_str()) {
                return candidate;
            }
        }
    }
}
