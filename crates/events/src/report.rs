//! Coordinator event reports and their submission state machine.
//!
//! ```text
//! draft ⇄ submitted ──review──▶ reviewed
//! ```
//!
//! Authors move freely between `draft` and `submitted`. Once `reviewed`, the
//! report is frozen. `submitted_at` is stamped on the first entry into
//! `submitted` and never rewritten afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccvms_core::{DenyReason, Entity, EventId, ReportId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Draft,
    Submitted,
    Reviewed,
}

impl ReportStatus {
    /// Map a caller-supplied status onto what an author may request.
    ///
    /// Anything other than `submitted` (including `reviewed` and garbage) is
    /// coerced to `draft`.
    pub fn coerce_requested(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submitted" => ReportStatus::Submitted,
            _ => ReportStatus::Draft,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "draft",
            ReportStatus::Submitted => "submitted",
            ReportStatus::Reviewed => "reviewed",
        }
    }
}

/// Author-editable report body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReportContent {
    pub title: String,
    pub summary: String,
    pub attendance_count: u32,
    pub volunteer_performance: String,
    pub challenges: String,
    pub recommendations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReport {
    pub id: ReportId,
    pub event_id: EventId,
    pub author: UserId,
    pub content: ReportContent,
    pub status: ReportStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl EventReport {
    /// Start a new report, honouring the requested (coerced) status.
    pub fn create(
        id: ReportId,
        event_id: EventId,
        author: UserId,
        content: ReportContent,
        requested_status: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let status = ReportStatus::coerce_requested(requested_status);
        Self {
            id,
            event_id,
            author,
            content,
            status,
            submitted_at: (status == ReportStatus::Submitted).then_some(now),
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    /// Replace the body and move to the requested status in one save.
    pub fn revise(
        &self,
        content: ReportContent,
        requested_status: &str,
        now: DateTime<Utc>,
    ) -> Result<EventReport, DenyReason> {
        let mut next = transition_report_status(self, requested_status, now)?;
        next.content = content;
        Ok(next)
    }
}

impl Entity for EventReport {
    type Id = ReportId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Move `report` to the requested status, returning the new state.
///
/// Reviewed reports refuse with `INVALID_STATE_TRANSITION`.
pub fn transition_report_status(
    report: &EventReport,
    requested_status: &str,
    now: DateTime<Utc>,
) -> Result<EventReport, DenyReason> {
    if report.status == ReportStatus::Reviewed {
        return Err(DenyReason::InvalidStateTransition);
    }

    let to = ReportStatus::coerce_requested(requested_status);
    let mut next = report.clone();
    next.status = to;
    if to == ReportStatus::Submitted && next.submitted_at.is_none() {
        next.submitted_at = Some(now);
    }
    Ok(next)
}
