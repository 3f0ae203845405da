use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccvms_core::{DomainError, DomainResult, Entity, EventId, MinistryId, UserId, VolunteerId};

/// Kind of gathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Mass,
    Meeting,
    Outreach,
    Fundraiser,
    Celebration,
    #[default]
    Other,
}

/// Caller-supplied fields for creating or revising an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub kind: EventKind,
    /// Requested owning ministry. Ignored when the event is created by a priest.
    pub ministry: Option<MinistryId>,
    /// Must name a coordinator bound to the event's ministry.
    pub coordinator: Option<UserId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub max_volunteers: Option<u32>,
}

impl EventDraft {
    /// Field checks that need no stored state.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("event title cannot be empty"));
        }
        if self.end <= self.start {
            return Err(DomainError::validation("event must end after it starts"));
        }
        if self.max_volunteers == Some(0) {
            return Err(DomainError::validation("max_volunteers must be positive"));
        }
        Ok(())
    }
}

/// A scheduled event.
///
/// # Invariants
/// - `end > start`.
/// - `assigned_volunteers.len() <= max_volunteers` when a cap is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub kind: EventKind,
    pub ministry: Option<MinistryId>,
    pub coordinator: Option<UserId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub assigned_volunteers: BTreeSet<VolunteerId>,
    pub max_volunteers: Option<u32>,
    pub is_active: bool,
}

impl Event {
    /// Create an event with the draft's requested ministry.
    pub fn create(id: EventId, draft: EventDraft) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            kind: draft.kind,
            ministry: draft.ministry,
            coordinator: draft.coordinator,
            start: draft.start,
            end: draft.end,
            location: draft.location,
            assigned_volunteers: BTreeSet::new(),
            max_volunteers: draft.max_volunteers,
            is_active: true,
        })
    }

    /// Create an event force-bound to `ministry`, whatever the draft requested.
    pub fn create_in_ministry(id: EventId, draft: EventDraft, ministry: MinistryId) -> DomainResult<Self> {
        let mut event = Self::create(id, draft)?;
        event.ministry = Some(ministry);
        Ok(event)
    }

    /// Replace the editable fields. The owning ministry is never changed here.
    pub fn revise(&mut self, draft: EventDraft) -> DomainResult<()> {
        draft.validate()?;
        if let Some(max) = draft.max_volunteers {
            if self.assigned_volunteers.len() > max as usize {
                return Err(DomainError::invariant(
                    "max_volunteers is below the number of enrolled volunteers",
                ));
            }
        }
        self.title = draft.title.trim().to_string();
        self.description = draft.description;
        self.kind = draft.kind;
        self.coordinator = draft.coordinator;
        self.start = draft.start;
        self.end = draft.end;
        self.location = draft.location;
        self.max_volunteers = draft.max_volunteers;
        Ok(())
    }

    pub fn is_enrolled(&self, volunteer: VolunteerId) -> bool {
        self.assigned_volunteers.contains(&volunteer)
    }

    pub fn is_coordinated_by(&self, user: UserId) -> bool {
        self.coordinator == Some(user)
    }

    /// Enroll a volunteer. Returns `false` if already enrolled.
    pub fn enroll(&mut self, volunteer: VolunteerId) -> DomainResult<bool> {
        if self.is_enrolled(volunteer) {
            return Ok(false);
        }
        if let Some(max) = self.max_volunteers {
            if self.assigned_volunteers.len() >= max as usize {
                return Err(DomainError::invariant("event is full"));
            }
        }
        Ok(self.assigned_volunteers.insert(volunteer))
    }

    /// Withdraw a volunteer. Returns `false` if they were not enrolled.
    pub fn withdraw(&mut self, volunteer: VolunteerId) -> bool {
        self.assigned_volunteers.remove(&volunteer)
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
