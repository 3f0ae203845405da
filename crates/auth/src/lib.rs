//! `ccvms-auth`: identity & capability model (authorization only).
//!
//! This crate never authenticates anybody: it receives an already-resolved
//! [`Subject`] and answers what that subject's role grants, plus the guarded
//! lifecycle transitions of the subject record itself.

pub mod capabilities;
pub mod config;
pub mod lifecycle;
pub mod roles;
pub mod subject;

pub use capabilities::{Capability, has_capability, role_capabilities};
pub use config::PolicyConfig;
pub use lifecycle::{ApprovalDecision, SubjectCommand, SubjectEvent, transition_approval};
pub use roles::Role;
pub use subject::{ApprovalStatus, Subject};
