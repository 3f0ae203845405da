// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

use serde::Serialize;

use ccvms_auth::{Capability, Role, Subject, role_capabilities};
use ccvms_core::{Decision, DenyReason, UserId};

use crate::action::{Action, Resource};
use crate::engine::decide;
use crate::scope::{ScopeDescriptor, resolve_scope};

/// Serialisable record of one authorization decision, suitable for an
/// external audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionRecord {
    pub actor: UserId,
    pub role: Role,
    pub action: Action,
    /// Kind of resource the action was applied to (e.g. `"event_volunteer"`).
    pub resource: &'static str,
    pub scope: ScopeDescriptor,
    pub decision: Decision,
    /// Human-readable reason for the outcome.
    pub message: String,
    /// Capabilities the actor held when the decision was made.
    pub capabilities: Vec<Capability>,
}

impl DecisionRecord {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }
}

/// Decide and explain in one pass.
///
/// The embedded decision is exactly what [`decide`] returns for the same
/// inputs.
pub fn explain(subject: &Subject, action: Action, resource: &Resource<'_>) -> DecisionRecord {
    let decision = decide(subject, action, resource);
    let message = match decision.deny_reason() {
        Some(reason) => deny_message(action, reason),
        None => format!("{} may perform {}", subject.role, action_label(action)),
    };

    DecisionRecord {
        actor: subject.id,
        role: subject.role,
        action,
        resource: resource.kind(),
        scope: resolve_scope(subject),
        decision,
        message,
        capabilities: role_capabilities(subject.role).to_vec(),
    }
}

/// User-facing message for a refused action.
pub fn deny_message(action: Action, reason: DenyReason) -> String {
    let label = action_label(action);
    match reason {
        DenyReason::NotAuthorized => format!("You do not have permission to {label}."),
        DenyReason::SelfActionForbidden => "You cannot perform this action on your own account.".to_string(),
        DenyReason::OutOfScope => match action {
            Action::ApproveVolunteer | Action::RejectVolunteer => {
                "You can only approve or reject volunteers within your ministry.".to_string()
            }
            Action::AssignRole => "You can only promote volunteers in your own ministry.".to_string(),
            Action::UpdateEvent | Action::DeleteEvent => "You can only manage events in your ministry.".to_string(),
            Action::AddVolunteerToEvent
            | Action::RemoveVolunteerFromEvent
            | Action::CreateTask
            | Action::UpdateTask
            | Action::DeleteTask
            | Action::CreateEventReport
            | Action::UpdateEventReport => "You can only manage events you coordinate.".to_string(),
            _ => format!("You cannot {label} outside your ministry."),
        },
        DenyReason::InvalidStateTransition => match action {
            Action::UpdateEventReport => "Reviewed reports can no longer be edited.".to_string(),
            Action::AssignRole => "Only volunteers can be promoted to coordinator.".to_string(),
            _ => format!("Cannot {label} in its current state."),
        },
        DenyReason::MissingMinistryAssignment => {
            "You must be assigned to a ministry before performing this action.".to_string()
        }
        DenyReason::TargetNotEnrolled => match action {
            Action::AssignRole => "The user has no volunteer profile.".to_string(),
            _ => "The volunteer is not assigned to this event.".to_string(),
        },
        DenyReason::AlreadyDecided => "This request has already been decided.".to_string(),
    }
}

fn action_label(action: Action) -> String {
    // Serialises as a snake_case string.
    match serde_json::to_value(action) {
        Ok(serde_json::Value::String(name)) => name.replace('_', " "),
        _ => format!("{action:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccvms_core::MinistryId;

    #[test]
    fn explains_a_denial_with_scope_and_message() {
        let priest = Subject::new(UserId::new(), Role::Priest);
        let record = explain(&priest, Action::CreateEvent, &Resource::None);

        assert!(!record.is_allowed());
        assert_eq!(record.scope, ScopeDescriptor::Empty);
        assert_eq!(record.decision, Decision::Deny(DenyReason::MissingMinistryAssignment));
        assert!(record.message.contains("assigned to a ministry"));
        assert!(record.capabilities.contains(&Capability::ScheduleEvents));
    }

    #[test]
    fn record_serializes_for_the_audit_log() {
        let m = MinistryId::new();
        let priest = Subject::new(UserId::new(), Role::Priest).with_ministry(m);
        let record = explain(&priest, Action::CreateEvent, &Resource::None);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["action"], "create_event");
        assert_eq!(json["role"], "priest");
        assert_eq!(json["resource"], "none");
        assert_eq!(json["decision"]["outcome"], "allow");
        assert_eq!(json["scope"]["kind"], "ministry");
        assert_eq!(record.message, "priest may perform create event");
    }

    #[test]
    fn explanation_agrees_with_decide() {
        let volunteer = Subject::new(UserId::new(), Role::Volunteer);
        for action in Action::ALL {
            let record = explain(&volunteer, action, &Resource::None);
            assert_eq!(record.decision, decide(&volunteer, action, &Resource::None));
        }
    }

    #[test]
    fn out_of_scope_messages_name_the_boundary() {
        assert_eq!(
            deny_message(Action::ApproveVolunteer, DenyReason::OutOfScope),
            "You can only approve or reject volunteers within your ministry."
        );
        assert_eq!(
            deny_message(Action::ViewReport, DenyReason::OutOfScope),
            "You cannot view report outside your ministry."
        );
    }
}
