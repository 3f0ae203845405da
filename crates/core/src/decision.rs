//! Authorization outcome vocabulary.
//!
//! Authorization failures are values, not errors: callers match on
//! [`Decision`] to pick a user-facing message and to refuse the mutation.

use serde::{Deserialize, Serialize};

/// Why an action was refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// The subject's role does not grant the action.
    NotAuthorized,
    /// The subject tried to act on their own account (suspend/delete self).
    SelfActionForbidden,
    /// The target lies outside the subject's ministry or ownership scope.
    OutOfScope,
    /// The target's current state does not admit the requested transition.
    InvalidStateTransition,
    /// A priest/coordinator without a ministry binding attempted a scoped action.
    MissingMinistryAssignment,
    /// The volunteer is not enrolled in the event the action refers to.
    TargetNotEnrolled,
    /// A terminal decision was already recorded by a different writer.
    AlreadyDecided,
}

impl DenyReason {
    /// Stable reason code (e.g. `"OUT_OF_SCOPE"`).
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NotAuthorized => "NOT_AUTHORIZED",
            DenyReason::SelfActionForbidden => "SELF_ACTION_FORBIDDEN",
            DenyReason::OutOfScope => "OUT_OF_SCOPE",
            DenyReason::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            DenyReason::MissingMinistryAssignment => "MISSING_MINISTRY_ASSIGNMENT",
            DenyReason::TargetNotEnrolled => "TARGET_NOT_ENROLLED",
            DenyReason::AlreadyDecided => "ALREADY_DECIDED",
        }
    }
}

impl core::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }

    /// Convert into a `Result` so callers can short-circuit with `?`.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

impl From<Result<(), DenyReason>> for Decision {
    fn from(value: Result<(), DenyReason>) -> Self {
        match value {
            Ok(()) => Decision::Allow,
            Err(reason) => Decision::Deny(reason),
        }
    }
}
