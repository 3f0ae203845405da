use core::str::FromStr;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccvms_auth::Role;
use ccvms_core::{AnnouncementId, DomainError, DomainResult, Entity, MinistryId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(DomainError::validation(format!("unknown priority '{other}'"))),
        }
    }
}

/// Parse a comma-separated role list (e.g. `"priest, coordinator"`).
///
/// Blank entries are skipped; an unknown role name fails the whole list.
pub fn parse_target_roles(raw: &str) -> DomainResult<BTreeSet<Role>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Role::from_str)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementDraft {
    pub title: String,
    pub message: String,
    pub priority: Priority,
    /// Comma-separated role list as entered by the author.
    pub target_roles: String,
    pub target_ministries: BTreeSet<MinistryId>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub created_by: UserId,
    /// Empty means every role.
    pub target_roles: BTreeSet<Role>,
    /// Empty means every ministry.
    pub target_ministries: BTreeSet<MinistryId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Announcement {
    pub fn create(
        id: AnnouncementId,
        created_by: UserId,
        draft: AnnouncementDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if draft.title.trim().is_empty() {
            return Err(DomainError::validation("announcement title cannot be empty"));
        }
        let target_roles = parse_target_roles(&draft.target_roles)?;
        Ok(Self {
            id,
            title: draft.title.trim().to_string(),
            message: draft.message,
            priority: draft.priority,
            created_by,
            target_roles,
            target_ministries: draft.target_ministries,
            is_active: true,
            created_at: now,
            expires_at: draft.expires_at,
        })
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires| now < expires)
    }

    /// Whether a reader with `role` serving in `ministries` is in the audience.
    pub fn reaches<I>(&self, role: Role, ministries: I, now: DateTime<Utc>) -> bool
    where
        I: IntoIterator<Item = MinistryId>,
    {
        if !self.is_live(now) {
            return false;
        }
        if !self.target_roles.is_empty() && !self.target_roles.contains(&role) {
            return false;
        }
        self.target_ministries.is_empty()
            || ministries
                .into_iter()
                .any(|m| self.target_ministries.contains(&m))
    }
}

impl Entity for Announcement {
    type Id = AnnouncementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
