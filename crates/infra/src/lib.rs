//! Infrastructure layer: persistence stores and the authorized workflows
//! that connect the policy engine to them.

pub mod store;
pub mod workflows;

pub use store::{EntityStore, InMemoryStore, KeyedStore, StoreError, Stores, Swap};
pub use workflows::attendance::MarkRequest;
pub use workflows::events::TaskChange;
pub use workflows::volunteers::ProfileDetails;
pub use workflows::{AUDIT_LOG_CAPACITY, AuditEntry, BulkOutcome, DashboardSummary, WorkflowError, WorkflowResult, Workflows};
