use std::collections::BTreeMap;

use serde::Serialize;

use ccvms_auth::{ApprovalStatus, Subject};
use ccvms_core::{DomainError, EventId};
use ccvms_policy::{Action, Resource, ScopeDescriptor, Scoped, filter_scoped, resolve_scope};

use super::{WorkflowResult, Workflows};
use crate::store::EntityStore;

/// Headline numbers for the reports dashboard, restricted to the actor's scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub scope: Option<ScopeDescriptor>,
    pub volunteers: usize,
    pub pending_approvals: usize,
    pub events: usize,
    pub reports_submitted: usize,
    /// Attendance records per status (`present`, `absent`, ...).
    pub attendance: BTreeMap<String, usize>,
}

impl Workflows {
    pub fn dashboard(&self, actor: &Subject) -> WorkflowResult<DashboardSummary> {
        self.authorize(actor, Action::ViewReportsDashboard, &Resource::None)?;
        let scope = resolve_scope(actor);

        let profiles = filter_scoped(&scope, self.stores.profiles.list()?);
        let users = self.stores.users.list()?;
        let pending_approvals = profiles
            .iter()
            .filter(|p| {
                users
                    .iter()
                    .any(|u| u.id == p.user_id && u.approval_status == ApprovalStatus::Pending)
            })
            .count();

        let events = filter_scoped(&scope, self.stores.events.list()?);
        let in_scope = |event_id: EventId| events.iter().any(|e| e.id == event_id);

        let reports_submitted = self
            .stores
            .reports
            .list()?
            .iter()
            .filter(|r| in_scope(r.event_id) && r.submitted_at.is_some())
            .count();

        let mut attendance = BTreeMap::new();
        for record in self.stores.attendance.list()?.iter().filter(|a| in_scope(a.event_id)) {
            *attendance.entry(record.status.as_str().to_string()).or_insert(0) += 1;
        }

        Ok(DashboardSummary {
            scope: Some(scope),
            volunteers: profiles.len(),
            pending_approvals,
            events: events.len(),
            reports_submitted,
            attendance,
        })
    }

    /// Scoped event reports as a JSON document for download.
    pub fn export_reports(&self, actor: &Subject) -> WorkflowResult<String> {
        self.authorize(actor, Action::ExportReports, &Resource::None)?;
        let scope = resolve_scope(actor);
        let events = self.stores.events.list()?;

        let mut reports: Vec<_> = self
            .stores
            .reports
            .list()?
            .into_iter()
            .filter(|r| {
                events
                    .iter()
                    .find(|e| e.id == r.event_id)
                    .is_some_and(|e| scope.permits(&e.membership()))
            })
            .collect();
        reports.sort_by_key(|r| r.id);

        serde_json::to_string_pretty(&reports)
            .map_err(|err| DomainError::invariant(format!("report export failed: {err}")).into())
    }
}
