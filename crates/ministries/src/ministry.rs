use serde::{Deserialize, Serialize};

use ccvms_core::{DomainError, DomainResult, Entity, MinistryId, UserId};

/// An organizational unit.
///
/// Volunteer and event membership is recorded on the volunteer profile and the
/// event respectively; the ministry itself holds no back-references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ministry {
    pub id: MinistryId,
    pub name: String,
    pub description: String,
    pub leader: Option<UserId>,
    pub is_active: bool,
}

impl Ministry {
    pub fn new(id: MinistryId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("ministry name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description: String::new(),
            leader: None,
            is_active: true,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for Ministry {
    type Id = MinistryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
