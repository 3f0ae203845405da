use chrono::Utc;

use ccvms_attendance::{Attendance, AttendanceKey, AttendanceMark, upsert_attendance};
use ccvms_auth::Subject;
use ccvms_core::{DenyReason, EventId, VolunteerId};
use ccvms_events::Event;
use ccvms_policy::{Action, Membership, Resource, apply_scope, resolve_scope};

use super::{WorkflowError, WorkflowResult, Workflows, transition_applied};
use crate::store::EntityStore;

/// One line of a bulk attendance submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkRequest {
    pub volunteer_id: VolunteerId,
    pub status: String,
    pub notes: String,
}

/// Result of a bulk mark: each line succeeds or fails on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub applied: Vec<Attendance>,
    pub failed: Vec<(VolunteerId, WorkflowError)>,
}

impl Workflows {
    /// Mark (or re-mark) one volunteer's attendance at an event.
    ///
    /// There is one record per `(event, volunteer)`; marking again overwrites
    /// status, notes and marker.
    pub fn mark_attendance(
        &self,
        actor: &Subject,
        event_id: EventId,
        volunteer_id: VolunteerId,
        status: &str,
        notes: &str,
    ) -> WorkflowResult<Attendance> {
        let mark = AttendanceMark::parse(status, notes)?;
        let event = self.stores.events.require(&event_id)?;
        let volunteer = self.stores.profiles.require(&volunteer_id)?;
        let key = AttendanceKey::new(event_id, volunteer_id);

        let action = match self.stores.attendance.get(&key)? {
            Some(_) => Action::UpdateAttendance,
            None => Action::MarkAttendance,
        };
        self.authorize(
            actor,
            action,
            &Resource::EventVolunteer {
                event: &event,
                volunteer: &volunteer,
            },
        )?;

        self.upsert(actor, key, mark)
    }

    /// Mark many volunteers for one event.
    ///
    /// Authorization runs once for the event. Each line is then parsed and
    /// checked for enrolment and, for bound staff, ministry membership before
    /// it is upserted; a failing line is reported without undoing the others.
    pub fn bulk_mark_attendance(
        &self,
        actor: &Subject,
        event_id: EventId,
        requests: Vec<MarkRequest>,
    ) -> WorkflowResult<BulkOutcome> {
        let event = self.stores.events.require(&event_id)?;
        self.authorize(actor, Action::BulkMarkAttendance, &Resource::Event(&event))?;

        let mut outcome = BulkOutcome::default();
        for request in requests {
            let volunteer_id = request.volunteer_id;
            match self.mark_enrolled(actor, &event, request) {
                Ok(record) => outcome.applied.push(record),
                Err(err) => {
                    tracing::warn!(
                        event_id = %event_id,
                        volunteer_id = %volunteer_id,
                        error = %err,
                        "bulk attendance line rejected"
                    );
                    outcome.failed.push((volunteer_id, err));
                }
            }
        }

        tracing::info!(
            event_id = %event_id,
            applied = outcome.applied.len(),
            failed = outcome.failed.len(),
            "bulk attendance marked"
        );
        Ok(outcome)
    }

    pub fn delete_attendance(&self, actor: &Subject, event_id: EventId, volunteer_id: VolunteerId) -> WorkflowResult<()> {
        let event = self.stores.events.require(&event_id)?;
        let volunteer = self.stores.profiles.require(&volunteer_id)?;
        self.authorize(
            actor,
            Action::DeleteAttendance,
            &Resource::EventVolunteer {
                event: &event,
                volunteer: &volunteer,
            },
        )?;

        let key = AttendanceKey::new(event_id, volunteer_id);
        if self.stores.attendance.remove(&key)?.is_some() {
            transition_applied("attendance.record.deleted", &volunteer_id);
        }
        Ok(())
    }

    /// Attendance records inside the actor's scope.
    pub fn visible_attendance(&self, actor: &Subject) -> WorkflowResult<Vec<Attendance>> {
        self.authorize(actor, Action::ListAttendance, &Resource::None)?;
        let events = self.stores.events.list()?;
        let profiles = self.stores.profiles.list()?;

        let mut visible = apply_scope(&resolve_scope(actor), self.stores.attendance.list()?, |record| {
            let ministry = events.iter().find(|e| e.id == record.event_id).and_then(|e| e.ministry);
            let owner = profiles.iter().find(|p| p.id == record.volunteer_id).map(|p| p.user_id);
            Membership::in_ministry(ministry).with_owners(owner)
        });
        visible.sort_by_key(|r| (r.event_id, r.volunteer_id));
        Ok(visible)
    }

    fn mark_enrolled(&self, actor: &Subject, event: &Event, request: MarkRequest) -> WorkflowResult<Attendance> {
        let mark = AttendanceMark::parse(&request.status, request.notes)?;
        let volunteer = self.stores.profiles.require(&request.volunteer_id)?;
        if !event.is_enrolled(volunteer.id) {
            return Err(WorkflowError::Denied(DenyReason::TargetNotEnrolled));
        }
        if let Some(ministry) = actor.managed_ministry() {
            if !volunteer.serves_in(ministry) {
                return Err(WorkflowError::Denied(DenyReason::OutOfScope));
            }
        }
        self.upsert(actor, AttendanceKey::new(event.id, request.volunteer_id), mark)
    }

    fn upsert(&self, actor: &Subject, key: AttendanceKey, mark: AttendanceMark) -> WorkflowResult<Attendance> {
        let now = Utc::now();
        let record = self
            .stores
            .attendance
            .upsert_with(key, |existing| upsert_attendance(existing, key, mark, actor.id, now))?;
        transition_applied("attendance.record.marked", &record.id);
        Ok(record)
    }
}
