//! Scope resolution and collection filtering.
//!
//! A subject's scope is computed fresh on every request from its role and
//! ministry binding; it is never cached across a ministry reassignment.

use std::collections::BTreeSet;

use serde::Serialize;

use ccvms_auth::{Role, Subject};
use ccvms_core::{MinistryId, UserId};
use ccvms_events::{Event, EventReport};
use ccvms_ministries::Ministry;
use ccvms_volunteers::VolunteerProfile;

/// The visibility/ownership boundary of a subject.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScopeDescriptor {
    /// Unrestricted (administrators).
    All,
    /// Records belonging to one ministry (bound priests/coordinators).
    Ministry(MinistryId),
    /// Nothing at all: a priest/coordinator without a ministry binding.
    Empty,
    /// Records owned by or related to this user (volunteers).
    SelfOnly(UserId),
}

impl ScopeDescriptor {
    /// Whether a record with the given membership is visible in this scope.
    pub fn permits(&self, membership: &Membership) -> bool {
        match self {
            ScopeDescriptor::All => true,
            ScopeDescriptor::Ministry(id) => membership.ministries.contains(id),
            ScopeDescriptor::Empty => false,
            ScopeDescriptor::SelfOnly(user) => membership.owners.contains(user),
        }
    }

    pub fn ministry(&self) -> Option<MinistryId> {
        match self {
            ScopeDescriptor::Ministry(id) => Some(*id),
            _ => None,
        }
    }
}

/// Compute the scope that bounds `subject`'s visibility and mutation.
pub fn resolve_scope(subject: &Subject) -> ScopeDescriptor {
    match subject.role {
        Role::Administrator => ScopeDescriptor::All,
        Role::Priest | Role::Coordinator => match subject.assigned_ministry {
            Some(ministry) => ScopeDescriptor::Ministry(ministry),
            None => ScopeDescriptor::Empty,
        },
        Role::Volunteer => ScopeDescriptor::SelfOnly(subject.id),
    }
}

/// Which ministries a record belongs to and which users it is related to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Membership {
    pub ministries: BTreeSet<MinistryId>,
    pub owners: BTreeSet<UserId>,
}

impl Membership {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn in_ministry(ministry: Option<MinistryId>) -> Self {
        Self {
            ministries: ministry.into_iter().collect(),
            owners: BTreeSet::new(),
        }
    }

    pub fn in_ministries<I>(ministries: I) -> Self
    where
        I: IntoIterator<Item = MinistryId>,
    {
        Self {
            ministries: ministries.into_iter().collect(),
            owners: BTreeSet::new(),
        }
    }

    pub fn owned_by(mut self, user: UserId) -> Self {
        self.owners.insert(user);
        self
    }

    pub fn with_owners<I>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = UserId>,
    {
        self.owners.extend(users);
        self
    }

    /// Attendance/feedback on an event: scoped by the event's ministry,
    /// related to the volunteer it concerns.
    pub fn for_event_volunteer(event: &Event, volunteer: &VolunteerProfile) -> Self {
        Self::in_ministry(event.ministry).owned_by(volunteer.user_id)
    }

    /// Report: scoped by the event's ministry, owned by its author.
    pub fn for_report(event: &Event, report: &EventReport) -> Self {
        Self::in_ministry(event.ministry).owned_by(report.author)
    }

    /// Evaluation of a volunteer: scoped by the volunteer's ministries.
    pub fn for_evaluation(volunteer: &VolunteerProfile) -> Self {
        volunteer.membership()
    }
}

/// Records that know their own membership.
pub trait Scoped {
    fn membership(&self) -> Membership;
}

impl Scoped for VolunteerProfile {
    fn membership(&self) -> Membership {
        Membership::in_ministries(self.ministries.iter().copied()).owned_by(self.user_id)
    }
}

/// Events are related to their coordinator. Enrolled volunteers are added by
/// callers that can map profiles to users (see [`Membership::with_owners`]).
impl Scoped for Event {
    fn membership(&self) -> Membership {
        Membership::in_ministry(self.ministry).with_owners(self.coordinator)
    }
}

impl Scoped for Ministry {
    fn membership(&self) -> Membership {
        Membership::in_ministry(Some(self.id))
    }
}

impl Scoped for Subject {
    fn membership(&self) -> Membership {
        Membership::in_ministry(self.managed_ministry()).owned_by(self.id)
    }
}

/// Keep only the items visible in `scope`.
///
/// `membership_fn` reports each item's ministries and related users. `All`
/// and `Empty` never call it.
pub fn apply_scope<T, I, F>(scope: &ScopeDescriptor, items: I, membership_fn: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Membership,
{
    match scope {
        ScopeDescriptor::All => items.into_iter().collect(),
        ScopeDescriptor::Empty => Vec::new(),
        ScopeDescriptor::Ministry(_) | ScopeDescriptor::SelfOnly(_) => items
            .into_iter()
            .filter(|item| scope.permits(&membership_fn(item)))
            .collect(),
    }
}

/// [`apply_scope`] for records implementing [`Scoped`].
pub fn filter_scoped<T, I>(scope: &ScopeDescriptor, items: I) -> Vec<T>
where
    T: Scoped,
    I: IntoIterator<Item = T>,
{
    apply_scope(scope, items, Scoped::membership)
}
