//! `ccvms-policy`: the authorization and ministry-scoping core.
//!
//! Every "may this subject do that?" question goes through [`decide`], and
//! every list view is narrowed through [`apply_scope`]. Both are pure:
//! - No IO
//! - No panics
//! - No mutation (callers apply lifecycle transitions after an `Allow`)

pub mod action;
pub mod engine;
pub mod explain;
pub mod scope;

pub use action::{Action, Resource};
pub use engine::decide;
pub use explain::{DecisionRecord, deny_message, explain};
pub use scope::{Membership, ScopeDescriptor, Scoped, apply_scope, filter_scoped, resolve_scope};

pub use ccvms_core::{Decision, DenyReason};
