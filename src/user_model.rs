use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Child,
}

/// A household member. Only children accrue points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default)]
    pub total_points: u64,
}

impl User {
    pub fn child(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Child,
            age: None,
            total_points: 0,
        }
    }

    pub fn parent(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: Role::Parent,
            ..Self::child(id, name)
        }
    }

    #[must_use]
    pub fn with_points(mut self, total_points: u64) -> Self {
        self.total_points = total_points;
        self
    }

    pub fn is_child(&self) -> bool {
        self.role == Role::Child
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.id.trim().is_empty() {
            return Err(AppResponse::invalid("User id is required"));
        }
        if self.name.trim().is_empty() {
            return Err(AppResponse::invalid("Name is required"));
        }
        if self.role == Role::Parent && self.total_points > 0 {
            return Err(AppResponse::invalid("Parents do not accrue points"));
        }
        Ok(())
    }

    /// Adds `points` and returns the new total. Saturates instead of wrapping.
    pub fn award_points(&mut self, points: u64) -> u64 {
        self.total_points = self.total_points.saturating_add(points);
        self.total_points
    }
}
