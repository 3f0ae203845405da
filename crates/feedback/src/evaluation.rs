use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccvms_core::{DomainError, Entity, EvaluationId, EventId, UserId, VolunteerId};

/// A 1–5 rating (poor … excellent).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::validation(format!(
                "rating must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// A staff member's evaluation of a volunteer. Only its author may change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerEvaluation {
    pub id: EvaluationId,
    pub volunteer_id: VolunteerId,
    pub event_id: Option<EventId>,
    pub evaluated_by: UserId,
    pub rating: Rating,
    pub comments: String,
    pub created_at: DateTime<Utc>,
}

impl VolunteerEvaluation {
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.evaluated_by == user
    }
}

impl Entity for VolunteerEvaluation {
    type Id = EvaluationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
