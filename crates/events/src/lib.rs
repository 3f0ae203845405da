//! Events domain module: scheduled events, their tasks, and coordinator reports.
//!
//! Pure domain logic (no IO, no storage). Authorization is decided elsewhere;
//! the types here only guard their own invariants and state machines.

pub mod event;
pub mod report;
pub mod task;

pub use event::{Event, EventDraft, EventKind};
pub use report::{EventReport, ReportContent, ReportStatus, transition_report_status};
pub use task::{Task, TaskStatus};
