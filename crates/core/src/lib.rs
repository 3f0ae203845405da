//! `ccvms-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every bounded
//! context: identifiers, the domain error model and the authorization outcome
//! vocabulary. No infrastructure concerns live here.

pub mod decision;
pub mod entity;
pub mod error;
pub mod id;

pub use decision::{Decision, DenyReason};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    AnnouncementId, AttendanceId, EvaluationId, EventId, FeedbackId, MinistryId, ProgramId,
    ReportId, TaskId, UserId, VolunteerId,
};
