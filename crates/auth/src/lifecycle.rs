//! Subject lifecycle: approval, suspension, role promotion, ministry binding.
//!
//! Transitions follow a two-step shape:
//! - **Decision**: `handle(&self, cmd)` validates state-machine preconditions
//!   and returns the events describing what changes (empty = no-op).
//! - **Mutation**: `apply(&mut self, event)` evolves state.
//!
//! These only guard *state*. Whether the actor may issue the command at all is
//! the policy engine's call and must be checked first.

use serde::{Deserialize, Serialize};

use ccvms_core::{DenyReason, MinistryId, UserId};

use crate::{ApprovalStatus, PolicyConfig, Role, Subject};

/// Outcome requested by an approver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

impl ApprovalDecision {
    /// The approval status this decision lands on.
    pub fn target_status(&self) -> ApprovalStatus {
        match self {
            ApprovalDecision::Approve => ApprovalStatus::Approved,
            ApprovalDecision::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// All subject commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectCommand {
    Decide(ApprovalDecision),
    ToggleSuspension {
        actor: UserId,
    },
    AssignRole {
        role: Role,
        /// Role of the actor issuing the change (drives the ministry coupling).
        actor_role: Role,
        actor_ministry: Option<MinistryId>,
    },
    AssignMinistry {
        ministry: Option<MinistryId>,
    },
}

/// All subject events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectEvent {
    Approved {
        user_id: UserId,
        from: ApprovalStatus,
    },
    Rejected {
        user_id: UserId,
        from: ApprovalStatus,
    },
    SuspensionChanged {
        user_id: UserId,
        suspended: bool,
    },
    RoleAssigned {
        user_id: UserId,
        role: Role,
        /// Ministry bound as part of a priest-driven promotion.
        ministry_binding: Option<MinistryId>,
    },
    MinistryAssigned {
        user_id: UserId,
        ministry: Option<MinistryId>,
    },
}

impl SubjectEvent {
    /// Stable event name (e.g. "accounts.volunteer.approved").
    pub fn event_type(&self) -> &'static str {
        match self {
            SubjectEvent::Approved { .. } => "accounts.volunteer.approved",
            SubjectEvent::Rejected { .. } => "accounts.volunteer.rejected",
            SubjectEvent::SuspensionChanged { suspended: true, .. } => "accounts.user.suspended",
            SubjectEvent::SuspensionChanged { suspended: false, .. } => "accounts.user.unsuspended",
            SubjectEvent::RoleAssigned { .. } => "accounts.user.role_assigned",
            SubjectEvent::MinistryAssigned { .. } => "accounts.user.ministry_assigned",
        }
    }
}

impl Subject {
    /// Validate a command against current state.
    pub fn handle(
        &self,
        command: &SubjectCommand,
        config: &PolicyConfig,
    ) -> Result<Vec<SubjectEvent>, DenyReason> {
        match command {
            SubjectCommand::Decide(decision) => self.handle_decision(*decision, config),
            SubjectCommand::ToggleSuspension { actor } => self.handle_toggle_suspension(*actor),
            SubjectCommand::AssignRole {
                role,
                actor_role,
                actor_ministry,
            } => self.handle_assign_role(*role, *actor_role, *actor_ministry),
            SubjectCommand::AssignMinistry { ministry } => {
                Ok(vec![SubjectEvent::MinistryAssigned {
                    user_id: self.id,
                    ministry: *ministry,
                }])
            }
        }
    }

    pub fn apply(&mut self, event: &SubjectEvent) {
        match event {
            SubjectEvent::Approved { .. } => {
                self.approval_status = ApprovalStatus::Approved;
                self.is_active = true;
            }
            SubjectEvent::Rejected { .. } => {
                self.approval_status = ApprovalStatus::Rejected;
                self.is_active = false;
            }
            SubjectEvent::SuspensionChanged { suspended, .. } => {
                self.is_suspended = *suspended;
            }
            SubjectEvent::RoleAssigned {
                role,
                ministry_binding,
                ..
            } => {
                self.role = *role;
                if let Some(ministry) = ministry_binding {
                    self.assigned_ministry = Some(*ministry);
                }
            }
            SubjectEvent::MinistryAssigned { ministry, .. } => {
                self.assigned_ministry = *ministry;
            }
        }
    }

    fn handle_decision(
        &self,
        decision: ApprovalDecision,
        config: &PolicyConfig,
    ) -> Result<Vec<SubjectEvent>, DenyReason> {
        let from = self.approval_status;
        let event = match (decision, from) {
            // Re-deciding the same way is a no-op.
            (ApprovalDecision::Approve, ApprovalStatus::Approved)
            | (ApprovalDecision::Reject, ApprovalStatus::Rejected) => return Ok(vec![]),

            (ApprovalDecision::Approve, ApprovalStatus::Pending) => SubjectEvent::Approved {
                user_id: self.id,
                from,
            },
            (ApprovalDecision::Approve, ApprovalStatus::Rejected) => {
                if !config.allow_reapproval {
                    return Err(DenyReason::AlreadyDecided);
                }
                SubjectEvent::Approved {
                    user_id: self.id,
                    from,
                }
            }

            (ApprovalDecision::Reject, ApprovalStatus::Pending) => SubjectEvent::Rejected {
                user_id: self.id,
                from,
            },
            (ApprovalDecision::Reject, ApprovalStatus::Approved) => {
                return Err(DenyReason::AlreadyDecided);
            }
        };
        Ok(vec![event])
    }

    fn handle_toggle_suspension(&self, actor: UserId) -> Result<Vec<SubjectEvent>, DenyReason> {
        if actor == self.id {
            return Err(DenyReason::SelfActionForbidden);
        }
        Ok(vec![SubjectEvent::SuspensionChanged {
            user_id: self.id,
            suspended: !self.is_suspended,
        }])
    }

    fn handle_assign_role(
        &self,
        role: Role,
        actor_role: Role,
        actor_ministry: Option<MinistryId>,
    ) -> Result<Vec<SubjectEvent>, DenyReason> {
        let ministry_binding = match actor_role {
            Role::Administrator => None,
            Role::Priest => {
                let ministry = actor_ministry.ok_or(DenyReason::MissingMinistryAssignment)?;
                if self.role != Role::Volunteer {
                    return Err(DenyReason::InvalidStateTransition);
                }
                if role != Role::Coordinator {
                    return Err(DenyReason::NotAuthorized);
                }
                Some(ministry)
            }
            Role::Coordinator | Role::Volunteer => return Err(DenyReason::NotAuthorized),
        };

        Ok(vec![SubjectEvent::RoleAssigned {
            user_id: self.id,
            role,
            ministry_binding,
        }])
    }
}

/// Apply an approval decision to `volunteer`, returning the new state.
///
/// `pending → approved` activates the account, `pending → rejected`
/// deactivates it, and `rejected → approved` is permitted while
/// [`PolicyConfig::allow_reapproval`] is set. Repeating the decision already
/// recorded returns the state unchanged; contradicting a recorded terminal
/// decision returns `ALREADY_DECIDED`.
pub fn transition_approval(
    volunteer: &Subject,
    decision: ApprovalDecision,
    config: &PolicyConfig,
) -> Result<Subject, DenyReason> {
    let events = volunteer.handle(&SubjectCommand::Decide(decision), config)?;
    let mut next = volunteer.clone();
    for event in &events {
        next.apply(event);
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> PolicyConfig {
        PolicyConfig::default()
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    #[test]
    fn approve_pending_activates() {
        let pending = Subject::signup_volunteer(UserId::new());
        let approved = transition_approval(&pending, ApprovalDecision::Approve, &config()).unwrap();

        assert_eq!(approved.approval_status, ApprovalStatus::Approved);
        assert!(approved.is_active);
        assert!(approved.can_login());
    }

    #[test]
    fn reject_pending_deactivates() {
        let pending = Subject::signup_volunteer(UserId::new());
        let rejected = transition_approval(&pending, ApprovalDecision::Reject, &config()).unwrap();

        assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
        assert!(!rejected.is_active);
    }

    #[test]
    fn reapproval_of_rejected_is_permitted_by_default() {
        let pending = Subject::signup_volunteer(UserId::new());
        let rejected = transition_approval(&pending, ApprovalDecision::Reject, &config()).unwrap();
        let approved = transition_approval(&rejected, ApprovalDecision::Approve, &config()).unwrap();

        assert_eq!(approved.approval_status, ApprovalStatus::Approved);
        assert!(approved.is_active);
    }

    #[test]
    fn reapproval_blocked_when_rejection_is_terminal() {
        let strict = PolicyConfig {
            allow_reapproval: false,
        };
        let pending = Subject::signup_volunteer(UserId::new());
        let rejected = transition_approval(&pending, ApprovalDecision::Reject, &strict).unwrap();

        let result = transition_approval(&rejected, ApprovalDecision::Approve, &strict);
        assert_eq!(result, Err(DenyReason::AlreadyDecided));
    }

    #[test]
    fn rejecting_an_approved_volunteer_is_already_decided() {
        let pending = Subject::signup_volunteer(UserId::new());
        let approved = transition_approval(&pending, ApprovalDecision::Approve, &config()).unwrap();

        let result = transition_approval(&approved, ApprovalDecision::Reject, &config());
        assert_eq!(result, Err(DenyReason::AlreadyDecided));
    }

    #[test]
    fn repeating_a_decision_is_a_no_op() {
        let pending = Subject::signup_volunteer(UserId::new());
        let approved = transition_approval(&pending, ApprovalDecision::Approve, &config()).unwrap();

        let events = approved
            .handle(&SubjectCommand::Decide(ApprovalDecision::Approve), &config())
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn suspension_toggles_independently_of_approval() {
        let admin = UserId::new();
        let mut target = Subject::signup_volunteer(UserId::new());

        for event in target
            .handle(&SubjectCommand::ToggleSuspension { actor: admin }, &config())
            .unwrap()
        {
            assert_eq!(event.event_type(), "accounts.user.suspended");
            target.apply(&event);
        }
        assert!(target.is_suspended);
        assert_eq!(target.approval_status, ApprovalStatus::Pending);

        for event in target
            .handle(&SubjectCommand::ToggleSuspension { actor: admin }, &config())
            .unwrap()
        {
            target.apply(&event);
        }
        assert!(!target.is_suspended);
    }

    #[test]
    fn priest_promotion_binds_ministry() {
        let ministry = MinistryId::new();
        let mut target = Subject::new(UserId::new(), Role::Volunteer);

        let cmd = SubjectCommand::AssignRole {
            role: Role::Coordinator,
            actor_role: Role::Priest,
            actor_ministry: Some(ministry),
        };
        for event in target.handle(&cmd, &config()).unwrap() {
            target.apply(&event);
        }

        assert_eq!(target.role, Role::Coordinator);
        assert_eq!(target.assigned_ministry, Some(ministry));
    }

    #[test]
    fn priest_cannot_promote_non_volunteer() {
        let target = Subject::new(UserId::new(), Role::Coordinator);
        let cmd = SubjectCommand::AssignRole {
            role: Role::Coordinator,
            actor_role: Role::Priest,
            actor_ministry: Some(MinistryId::new()),
        };
        assert_eq!(
            target.handle(&cmd, &config()),
            Err(DenyReason::InvalidStateTransition)
        );
    }

    #[test]
    fn administrator_assigns_any_role_without_touching_ministry() {
        let ministry = MinistryId::new();
        let mut target = Subject::new(UserId::new(), Role::Coordinator).with_ministry(ministry);

        let cmd = SubjectCommand::AssignRole {
            role: Role::Administrator,
            actor_role: Role::Administrator,
            actor_ministry: None,
        };
        for event in target.handle(&cmd, &config()).unwrap() {
            target.apply(&event);
        }

        assert_eq!(target.role, Role::Administrator);
        assert_eq!(target.assigned_ministry, Some(ministry));
    }

    #[test]
    fn clearing_ministry_assignment() {
        let mut target = Subject::new(UserId::new(), Role::Priest).with_ministry(MinistryId::new());
        let cmd = SubjectCommand::AssignMinistry { ministry: None };
        for event in target.handle(&cmd, &config()).unwrap() {
            target.apply(&event);
        }
        assert_eq!(target.assigned_ministry, None);
    }

    proptest! {
        /// Property: nobody can toggle their own suspension, whatever their role.
        #[test]
        fn self_suspension_is_always_forbidden(role in role_strategy(), suspended in any::<bool>()) {
            let mut subject = Subject::new(UserId::new(), role);
            subject.is_suspended = suspended;

            let result = subject.handle(&SubjectCommand::ToggleSuspension { actor: subject.id }, &config());
            prop_assert_eq!(result, Err(DenyReason::SelfActionForbidden));
        }

        /// Property: handle never mutates; the same command yields the same events.
        #[test]
        fn handle_is_deterministic(reject in any::<bool>()) {
            let subject = Subject::signup_volunteer(UserId::new());
            let before = subject.clone();
            let decision = if reject { ApprovalDecision::Reject } else { ApprovalDecision::Approve };

            let first = subject.handle(&SubjectCommand::Decide(decision), &config());
            let second = subject.handle(&SubjectCommand::Decide(decision), &config());

            prop_assert_eq!(&subject, &before);
            prop_assert_eq!(first, second);
        }
    }
}
