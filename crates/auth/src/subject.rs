use serde::{Deserialize, Serialize};

use ccvms_core::{Entity, MinistryId, UserId};

use crate::Role;

/// Volunteer approval state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl core::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An already-identified actor, as handed to the policy core.
///
/// Construction is decoupled from credentials and sessions: callers resolve
/// the subject from their identity store and pass it in per request.
///
/// # Invariants
/// - `assigned_ministry` only scopes priests and coordinators; use
///   [`Subject::managed_ministry`] rather than reading the field directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: UserId,
    pub role: Role,
    pub approval_status: ApprovalStatus,
    pub is_active: bool,
    pub is_suspended: bool,
    pub assigned_ministry: Option<MinistryId>,
}

impl Subject {
    /// An approved, active account with the given role and no ministry binding.
    pub fn new(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            approval_status: ApprovalStatus::Approved,
            is_active: true,
            is_suspended: false,
            assigned_ministry: None,
        }
    }

    /// A self-signed-up volunteer awaiting approval.
    pub fn signup_volunteer(id: UserId) -> Self {
        Self {
            id,
            role: Role::Volunteer,
            approval_status: ApprovalStatus::Pending,
            is_active: false,
            is_suspended: false,
            assigned_ministry: None,
        }
    }

    pub fn with_ministry(mut self, ministry: MinistryId) -> Self {
        self.assigned_ministry = Some(ministry);
        self
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    /// The ministry that bounds this subject's scope, if the role is ministry-bound.
    pub fn managed_ministry(&self) -> Option<MinistryId> {
        if self.role.is_ministry_bound() {
            self.assigned_ministry
        } else {
            None
        }
    }

    pub fn can_login(&self) -> bool {
        self.is_active && !self.is_suspended && self.approval_status == ApprovalStatus::Approved
    }
}

impl Entity for Subject {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_is_pending_and_cannot_login() {
        let subject = Subject::signup_volunteer(UserId::new());
        assert_eq!(subject.approval_status, ApprovalStatus::Pending);
        assert!(!subject.is_active);
        assert!(!subject.can_login());
    }

    #[test]
    fn suspension_blocks_login() {
        let mut subject = Subject::new(UserId::new(), Role::Priest);
        assert!(subject.can_login());
        subject.is_suspended = true;
        assert!(!subject.can_login());
    }

    #[test]
    fn rejected_active_account_cannot_login() {
        let mut subject = Subject::new(UserId::new(), Role::Volunteer);
        subject.approval_status = ApprovalStatus::Rejected;
        assert!(!subject.can_login());
    }

    #[test]
    fn ministry_is_ignored_for_administrators_and_volunteers() {
        let ministry = MinistryId::new();
        for role in [Role::Administrator, Role::Volunteer] {
            let subject = Subject::new(UserId::new(), role).with_ministry(ministry);
            assert_eq!(subject.managed_ministry(), None);
        }
        for role in [Role::Priest, Role::Coordinator] {
            let subject = Subject::new(UserId::new(), role).with_ministry(ministry);
            assert_eq!(subject.managed_ministry(), Some(ministry));
        }
    }
}
