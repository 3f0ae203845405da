use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ccvms_core::{DomainError, DomainResult, Entity, EventId, TaskId, UserId, VolunteerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown task status '{other}'"))),
        }
    }
}

/// A unit of work inside one event, assigned to one volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub event_id: EventId,
    pub title: String,
    pub description: String,
    pub assigned_to: VolunteerId,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub assigned_by: Option<UserId>,
}

impl Task {
    pub fn new(
        id: TaskId,
        event_id: EventId,
        title: impl Into<String>,
        assigned_to: VolunteerId,
        assigned_by: UserId,
    ) -> DomainResult<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("task title cannot be empty"));
        }
        Ok(Self {
            id,
            event_id,
            title,
            description: String::new(),
            assigned_to,
            status: TaskStatus::Pending,
            due_date: None,
            assigned_by: Some(assigned_by),
        })
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
