//! Claimable rewards.
//!
//! A [`Reward`] has a one-way lifecycle: it starts [`RewardState::Unclaimed`]
//! and moves to [`RewardState::Claimed`] exactly once. Nothing in the crate
//! ever resets `claimed` back to `false`.
//!
//! Achievement levels and tasks reference rewards by id only. Resolving that
//! id is an explicit lookup through [`find_reward`], which yields `None` for a
//! dangling reference instead of failing.

use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[serde(default)]
    pub claimed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardState {
    Unclaimed,
    Claimed,
}

impl Reward {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
            claimed: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> RewardState {
        if self.claimed {
            RewardState::Claimed
        } else {
            RewardState::Unclaimed
        }
    }

    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

/// Returns a claimed copy of `reward`.
///
/// Claiming an already claimed reward is a no-op: the returned value is equal
/// to the input. All fields other than `claimed` are carried over untouched.
#[must_use]
pub fn claim_reward(reward: &Reward) -> Reward {
    if reward.claimed {
        debug!("Reward {} already claimed; nothing to do", reward.id);
    }
    Reward {
        claimed: true,
        ..reward.clone()
    }
}

/// Looks up a reward by id.
#[must_use]
pub fn find_reward<'a>(rewards: &'a [Reward], id: &str) -> Option<&'a Reward> {
    rewards.iter().find(|reward| reward.id == id)
}
