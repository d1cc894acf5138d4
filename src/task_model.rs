//! Chores and their recurrence rules.
//!
//! A [`Task`] is assigned to one child and is worth a fixed number of
//! points. Non-recurring tasks complete once. Recurring tasks complete at
//! most once per day; each completion pushes the due date forward by the
//! recurrence interval and leaves the task open for the next round.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

pub const DEFAULT_TASK_ICON: &str = "star";

/// Icons the task form offers.
pub const TASK_ICONS: [&str; 7] = ["star", "book", "house", "trash", "backpack", "dog", "cart"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Next due date after `date`. Monthly recurrence clamps to the end of
    /// shorter months (Jan 31 -> Feb 28/29).
    #[must_use]
    pub fn next_due(&self, date: NaiveDate) -> NaiveDate {
        let next = match self {
            Recurrence::None => Some(date),
            Recurrence::Daily => date.checked_add_days(Days::new(1)),
            Recurrence::Weekly => date.checked_add_days(Days::new(7)),
            Recurrence::Monthly => date.checked_add_months(Months::new(1)),
        };
        next.unwrap_or(date)
    }

    pub fn is_recurring(&self) -> bool {
        *self != Recurrence::None
    }

    pub fn label(&self) -> Option<&'static str> {
        match self {
            Recurrence::None => None,
            Recurrence::Daily => Some("Repeats daily"),
            Recurrence::Weekly => Some("Repeats weekly"),
            Recurrence::Monthly => Some("Repeats monthly"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub points: u64,
    #[serde(default)]
    pub completed: bool,
    pub due_date: NaiveDate,
    pub icon: String,
    /// Weak reference to a reward granted alongside the points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_id: Option<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<NaiveDate>,
    #[serde(default, rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Task {
    /// Whether the task can be completed on `today`.
    pub fn is_completable(&self, today: NaiveDate) -> bool {
        if self.recurrence.is_recurring() {
            self.last_completed != Some(today)
        } else {
            !self.completed
        }
    }

    /// Marks the task done on `today`. Recurring tasks move their due date
    /// forward and stay open.
    pub fn mark_completed(&mut self, today: NaiveDate) -> Result<(), AppResponse> {
        if !self.is_completable(today) {
            let reason = if self.recurrence.is_recurring() {
                format!("Task '{}' was already completed on {}", self.id, today)
            } else {
                format!("Task '{}' is already completed", self.id)
            };
            return Err(AppResponse::invalid(reason));
        }

        self.last_completed = Some(today);
        if self.recurrence.is_recurring() {
            self.due_date = self.recurrence.next_due(self.due_date.max(today));
            self.completed = false;
        } else {
            self.completed = true;
        }
        Ok(())
    }
}

/// Task form payload. Missing optional fields fall back to form defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    #[serde(default)]
    pub points: Option<u64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub reward_id: Option<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default, rename = "imageURL")]
    pub image_url: Option<String>,
}

impl TaskDraft {
    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.title.trim().chars().count() < 3 {
            return Err(AppResponse::invalid("Title must be at least 3 characters"));
        }
        if self.description.trim().chars().count() < 5 {
            return Err(AppResponse::invalid("Description must be at least 5 characters"));
        }
        if self.assigned_to.trim().is_empty() {
            return Err(AppResponse::invalid("Please select a child"));
        }
        if self.points == Some(0) {
            return Err(AppResponse::invalid("Points must be at least 1"));
        }
        if let Some(icon) = &self.icon {
            if !TASK_ICONS.contains(&icon.as_str()) {
                return Err(AppResponse::invalid(format!("Unknown task icon '{icon}'")));
            }
        }
        Ok(())
    }

    /// Applies the draft on top of `existing`, keeping completion state.
    pub fn apply_to(self, existing: &Task) -> Task {
        Task {
            id: existing.id.clone(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            assigned_to: self.assigned_to,
            points: self.points.unwrap_or(existing.points),
            completed: existing.completed,
            due_date: self.due_date.unwrap_or(existing.due_date),
            icon: self.icon.unwrap_or_else(|| existing.icon.clone()),
            reward_id: self.reward_id,
            recurrence: self.recurrence,
            last_completed: existing.last_completed,
            image_url: self.image_url,
        }
    }

    pub fn into_task(self, id: String, today: NaiveDate, default_points: u64) -> Task {
        Task {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            assigned_to: self.assigned_to,
            points: self.points.unwrap_or(default_points),
            completed: false,
            due_date: self.due_date.unwrap_or(today),
            icon: self.icon.unwrap_or_else(|| DEFAULT_TASK_ICON.to_string()),
            reward_id: self.reward_id,
            recurrence: self.recurrence,
            last_completed: None,
            image_url: self.image_url,
        }
    }
}
