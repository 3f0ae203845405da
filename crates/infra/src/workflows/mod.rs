//! Workflow layer: every state change funnels through one pipeline.
//!
//! ```text
//! caller input
//!   ↓
//! 1. Parse caller-supplied values (unknown role/status → Validation)
//!   ↓
//! 2. Load the records the decision needs
//!   ↓
//! 3. decide(), recorded in the audit trail (a Deny stops here, nothing written)
//!   ↓
//! 4. Apply the lifecycle transition
//!   ↓
//! 5. Persist as one atomic store write (compare-and-swap for existing records)
//! ```

pub mod accounts;
pub mod attendance;
pub mod communications;
pub mod events;
pub mod feedback;
pub mod ministries;
pub mod reports;
pub mod volunteers;

use std::collections::VecDeque;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use ccvms_auth::{PolicyConfig, Subject};
use ccvms_core::{Decision, DenyReason, DomainError, Entity};
use ccvms_policy::{Action, DecisionRecord, Resource, explain};

use crate::store::{EntityStore, StoreError, Stores, Swap};

pub use attendance::BulkOutcome;
pub use reports::DashboardSummary;

/// Retries for a compare-and-swap that lost to an unrelated concurrent write.
const MAX_SWAP_ATTEMPTS: usize = 8;

/// Decisions kept in memory by default; older ones are dropped first.
pub const AUDIT_LOG_CAPACITY: usize = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("denied: {0}")]
    Denied(DenyReason),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DenyReason> for WorkflowError {
    fn from(value: DenyReason) -> Self {
        WorkflowError::Denied(value)
    }
}

impl WorkflowError {
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            WorkflowError::Denied(reason) => Some(*reason),
            _ => None,
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// One audited decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: DecisionRecord,
}

/// Bounded in-memory audit trail.
#[derive(Debug)]
struct AuditTrail {
    entries: RwLock<VecDeque<AuditEntry>>,
    capacity: usize,
    /// Entries evicted for capacity or skipped on a poisoned lock.
    dropped: AtomicU64,
}

impl AuditTrail {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    fn push(&self, entry: AuditEntry) {
        match self.entries.write() {
            Ok(mut log) => {
                while log.len() >= self.capacity {
                    log.pop_front();
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                log.push_back(entry);
            }
            Err(_) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    action = ?entry.record.action,
                    actor = %entry.record.actor,
                    dropped,
                    "audit log lock poisoned, decision not recorded"
                );
            }
        }
    }
}

/// Entry point for all authorized mutations and scoped reads.
#[derive(Debug)]
pub struct Workflows {
    stores: Stores,
    config: PolicyConfig,
    audit: AuditTrail,
}

impl Default for Workflows {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

impl Workflows {
    pub fn new(config: PolicyConfig) -> Self {
        Self::with_stores(Stores::new(), config)
    }

    pub fn with_stores(stores: Stores, config: PolicyConfig) -> Self {
        Self {
            stores,
            config,
            audit: AuditTrail::with_capacity(AUDIT_LOG_CAPACITY),
        }
    }

    /// Keep at most `capacity` audit entries (at least one).
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit = AuditTrail::with_capacity(capacity);
        self
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Run the policy engine, audit the outcome and turn a deny into an error.
    pub(crate) fn authorize(&self, actor: &Subject, action: Action, resource: &Resource<'_>) -> WorkflowResult<()> {
        let record = explain(actor, action, resource);
        let decision = record.decision;

        match decision {
            Decision::Allow => tracing::debug!(
                actor = %actor.id,
                role = %actor.role,
                action = ?action,
                resource = record.resource,
                "action allowed"
            ),
            Decision::Deny(reason) => tracing::info!(
                actor = %actor.id,
                role = %actor.role,
                action = ?action,
                resource = record.resource,
                reason = reason.code(),
                "action denied"
            ),
        }

        self.audit.push(AuditEntry { at: Utc::now(), record });

        decision.into_result().map_err(WorkflowError::Denied)
    }

    /// The retained decisions, newest last.
    pub fn audit_log(&self, actor: &Subject) -> WorkflowResult<Vec<AuditEntry>> {
        self.authorize(actor, Action::ViewAuditLog, &Resource::None)?;
        let log = self.audit.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(log.iter().cloned().collect())
    }

    /// Decisions that are no longer (or were never) in the audit log.
    pub fn audit_entries_dropped(&self) -> u64 {
        self.audit.dropped.load(Ordering::Relaxed)
    }
}

/// Read-modify-write an existing record with compare-and-swap.
///
/// `step` sees the freshly loaded record on every attempt and returns the
/// replacement, or `None` for a no-op. Authorization belongs inside `step`
/// so it is re-evaluated against the state actually being replaced.
pub(crate) fn update_with<E, S, F>(store: &S, id: &E::Id, mut step: F) -> WorkflowResult<E>
where
    E: Entity + Clone,
    S: EntityStore<E> + ?Sized,
    F: FnMut(&E) -> WorkflowResult<Option<E>>,
{
    for _ in 0..MAX_SWAP_ATTEMPTS {
        let current = store.require(id)?;
        let Some(next) = step(&current)? else {
            return Ok(current);
        };
        match store.compare_and_swap(&current, next.clone())? {
            Swap::Applied => return Ok(next),
            Swap::Stale(None) => return Err(StoreError::NotFound.into()),
            Swap::Stale(Some(_)) => continue,
        }
    }
    Err(StoreError::Conflict(format!("record {id:?} kept changing underneath the update")).into())
}

pub(crate) fn transition_applied(event_type: &'static str, id: &dyn core::fmt::Display) {
    tracing::info!(event_type, id = %id, "transition applied");
}
