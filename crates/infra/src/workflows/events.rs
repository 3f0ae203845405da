use chrono::{NaiveDate, Utc};

use ccvms_auth::{Role, Subject};
use ccvms_core::{DenyReason, DomainError, EventId, MinistryId, ReportId, TaskId, UserId, VolunteerId};
use ccvms_events::{Event, EventDraft, EventReport, ReportContent, ReportStatus, Task, TaskStatus};
use ccvms_policy::{Action, Membership, Resource, Scoped, apply_scope, resolve_scope};
use ccvms_volunteers::VolunteerProfile;

use super::{MAX_SWAP_ATTEMPTS, WorkflowError, WorkflowResult, Workflows, transition_applied, update_with};
use crate::store::{EntityStore, StoreError};

/// Editable task fields. `status` is parsed before any policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChange {
    pub title: String,
    pub description: String,
    pub assigned_to: VolunteerId,
    pub status: String,
    pub due_date: Option<NaiveDate>,
}

impl Workflows {
    /// Schedule an event in the priest's own ministry, whatever the draft asked for.
    pub fn create_event(&self, actor: &Subject, draft: EventDraft) -> WorkflowResult<Event> {
        draft.validate()?;
        self.authorize(actor, Action::CreateEvent, &Resource::None)?;
        let ministry = actor
            .managed_ministry()
            .ok_or(WorkflowError::Denied(DenyReason::MissingMinistryAssignment))?;
        self.check_coordinator(draft.coordinator, Some(ministry))?;

        let event = Event::create_in_ministry(EventId::new(), draft, ministry)?;
        self.stores.events.insert(event.clone())?;
        transition_applied("events.event.created", &event.id);
        Ok(event)
    }

    pub fn update_event(&self, actor: &Subject, event_id: EventId, draft: EventDraft) -> WorkflowResult<Event> {
        draft.validate()?;
        let updated = update_with(&self.stores.events, &event_id, |current| {
            self.authorize(actor, Action::UpdateEvent, &Resource::Event(current))?;
            self.check_coordinator(draft.coordinator, current.ministry)?;
            let mut next = current.clone();
            next.revise(draft.clone())?;
            Ok(Some(next))
        })?;
        transition_applied("events.event.updated", &event_id);
        Ok(updated)
    }

    /// An event's coordinator must hold the coordinator role in the event's ministry.
    fn check_coordinator(&self, coordinator: Option<UserId>, ministry: Option<MinistryId>) -> WorkflowResult<()> {
        let Some(coordinator) = coordinator else {
            return Ok(());
        };
        let user = self.stores.users.require(&coordinator)?;
        if user.role == Role::Coordinator && ministry.is_some() && user.assigned_ministry == ministry {
            Ok(())
        } else {
            tracing::debug!(%coordinator, "coordinator is not bound to the event's ministry");
            Err(WorkflowError::Denied(DenyReason::OutOfScope))
        }
    }

    /// Delete an event with its tasks.
    pub fn delete_event(&self, actor: &Subject, event_id: EventId) -> WorkflowResult<()> {
        let event = self.stores.events.require(&event_id)?;
        self.authorize(actor, Action::DeleteEvent, &Resource::Event(&event))?;

        for task in self.stores.tasks.list()?.into_iter().filter(|t| t.event_id == event_id) {
            self.stores.tasks.remove(&task.id)?;
        }
        self.stores.events.remove(&event_id)?;
        transition_applied("events.event.deleted", &event_id);
        Ok(())
    }

    pub fn view_event(&self, actor: &Subject, event_id: EventId) -> WorkflowResult<Event> {
        let event = self.stores.events.require(&event_id)?;
        let membership = self.event_membership(&event)?;
        self.authorize(actor, Action::ViewEvent, &Resource::Scoped(membership))?;
        Ok(event)
    }

    /// Events in the actor's scope; volunteers see the events they are enrolled in.
    pub fn visible_events(&self, actor: &Subject) -> WorkflowResult<Vec<Event>> {
        self.authorize(actor, Action::ListEvents, &Resource::None)?;
        let profiles = self.stores.profiles.list()?;
        let mut visible = apply_scope(&resolve_scope(actor), self.stores.events.list()?, |event| {
            with_enrolled_owners(event, &profiles)
        });
        visible.sort_by_key(|e| (e.start, e.id));
        Ok(visible)
    }

    pub fn add_volunteer_to_event(
        &self,
        actor: &Subject,
        event_id: EventId,
        volunteer_id: VolunteerId,
    ) -> WorkflowResult<Event> {
        let volunteer = self.stores.profiles.require(&volunteer_id)?;
        let updated = update_with(&self.stores.events, &event_id, |current| {
            self.authorize(
                actor,
                Action::AddVolunteerToEvent,
                &Resource::EventVolunteer {
                    event: current,
                    volunteer: &volunteer,
                },
            )?;
            let mut next = current.clone();
            if !next.enroll(volunteer_id)? {
                return Ok(None);
            }
            Ok(Some(next))
        })?;
        transition_applied("events.volunteer.enrolled", &volunteer_id);
        Ok(updated)
    }

    pub fn remove_volunteer_from_event(
        &self,
        actor: &Subject,
        event_id: EventId,
        volunteer_id: VolunteerId,
    ) -> WorkflowResult<Event> {
        let volunteer = self.stores.profiles.require(&volunteer_id)?;
        let updated = update_with(&self.stores.events, &event_id, |current| {
            self.authorize(
                actor,
                Action::RemoveVolunteerFromEvent,
                &Resource::EventVolunteer {
                    event: current,
                    volunteer: &volunteer,
                },
            )?;
            let mut next = current.clone();
            next.withdraw(volunteer_id);
            Ok(Some(next))
        })?;
        transition_applied("events.volunteer.withdrawn", &volunteer_id);
        Ok(updated)
    }

    pub fn create_task(&self, actor: &Subject, event_id: EventId, change: TaskChange) -> WorkflowResult<Task> {
        let status: TaskStatus = change.status.parse()?;
        let event = self.stores.events.require(&event_id)?;
        let assignee = self.stores.profiles.require(&change.assigned_to)?;
        self.authorize(
            actor,
            Action::CreateTask,
            &Resource::Task {
                event: &event,
                assignee: Some(&assignee),
            },
        )?;

        let mut task = Task::new(TaskId::new(), event_id, change.title, change.assigned_to, actor.id)?;
        task.description = change.description;
        task.status = status;
        task.due_date = change.due_date;

        self.stores.tasks.insert(task.clone())?;
        transition_applied("events.task.created", &task.id);
        Ok(task)
    }

    pub fn update_task(&self, actor: &Subject, task_id: TaskId, change: TaskChange) -> WorkflowResult<Task> {
        let status: TaskStatus = change.status.parse()?;
        let title = change.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("task title cannot be empty").into());
        }
        let assignee = self.stores.profiles.require(&change.assigned_to)?;

        let updated = update_with(&self.stores.tasks, &task_id, |current| {
            let event = self.stores.events.require(&current.event_id)?;
            self.authorize(
                actor,
                Action::UpdateTask,
                &Resource::Task {
                    event: &event,
                    assignee: Some(&assignee),
                },
            )?;
            Ok(Some(Task {
                title: title.clone(),
                description: change.description.clone(),
                assigned_to: change.assigned_to,
                status,
                due_date: change.due_date,
                ..current.clone()
            }))
        })?;
        transition_applied("events.task.updated", &task_id);
        Ok(updated)
    }

    pub fn delete_task(&self, actor: &Subject, task_id: TaskId) -> WorkflowResult<()> {
        let task = self.stores.tasks.require(&task_id)?;
        let event = self.stores.events.require(&task.event_id)?;
        self.authorize(actor, Action::DeleteTask, &Resource::Task { event: &event, assignee: None })?;

        self.stores.tasks.remove(&task_id)?;
        transition_applied("events.task.deleted", &task_id);
        Ok(())
    }

    /// Create or revise the coordinator's report for an event.
    ///
    /// `requested_status` is coerced: anything but `submitted` saves a draft.
    pub fn save_event_report(
        &self,
        actor: &Subject,
        event_id: EventId,
        content: ReportContent,
        requested_status: &str,
    ) -> WorkflowResult<EventReport> {
        let event = self.stores.events.require(&event_id)?;

        for _ in 0..MAX_SWAP_ATTEMPTS {
            let existing = self
                .stores
                .reports
                .find(&|r: &EventReport| r.event_id == event_id && r.author == actor.id)?;

            let Some(existing) = existing else {
                self.authorize(
                    actor,
                    Action::CreateEventReport,
                    &Resource::Report {
                        event: &event,
                        report: None,
                    },
                )?;
                let report = EventReport::create(
                    ReportId::new(),
                    event_id,
                    actor.id,
                    content.clone(),
                    requested_status,
                    Utc::now(),
                );
                match self.stores.reports.insert(report.clone()) {
                    Ok(()) => {
                        transition_applied(report_event_type(&report), &report.id);
                        return Ok(report);
                    }
                    // A concurrent first save won; revise that one instead.
                    Err(StoreError::Conflict(_)) => continue,
                    Err(err) => return Err(err.into()),
                }
            };

            let updated = update_with(&self.stores.reports, &existing.id, |current| {
                self.authorize(
                    actor,
                    Action::UpdateEventReport,
                    &Resource::Report {
                        event: &event,
                        report: Some(current),
                    },
                )?;
                Ok(Some(current.revise(content.clone(), requested_status, Utc::now())?))
            })?;
            transition_applied(report_event_type(&updated), &updated.id);
            return Ok(updated);
        }
        Err(StoreError::Conflict(format!("report for event {event_id} kept changing during save")).into())
    }

    pub fn view_report(&self, actor: &Subject, report_id: ReportId) -> WorkflowResult<EventReport> {
        let report = self.stores.reports.require(&report_id)?;
        let event = self.stores.events.require(&report.event_id)?;
        self.authorize(
            actor,
            Action::ViewReport,
            &Resource::Report {
                event: &event,
                report: Some(&report),
            },
        )?;
        Ok(report)
    }

    /// Reports on events inside the actor's scope; volunteers see none they did not write.
    pub fn visible_reports(&self, actor: &Subject) -> WorkflowResult<Vec<EventReport>> {
        self.authorize(actor, Action::ListReports, &Resource::None)?;
        let events = self.stores.events.list()?;
        let mut visible = apply_scope(&resolve_scope(actor), self.stores.reports.list()?, |report| {
            let ministry = events.iter().find(|e| e.id == report.event_id).and_then(|e| e.ministry);
            Membership::in_ministry(ministry).owned_by(report.author)
        });
        visible.sort_by_key(|r| r.id);
        Ok(visible)
    }

    /// Event membership including the users of its enrolled volunteers.
    pub(crate) fn event_membership(&self, event: &Event) -> WorkflowResult<Membership> {
        Ok(with_enrolled_owners(event, &self.stores.profiles.list()?))
    }
}

fn with_enrolled_owners(event: &Event, profiles: &[VolunteerProfile]) -> Membership {
    event.membership().with_owners(
        profiles
            .iter()
            .filter(|p| event.is_enrolled(p.id))
            .map(|p| p.user_id),
    )
}

fn report_event_type(report: &EventReport) -> &'static str {
    match report.status {
        ReportStatus::Submitted => "events.report.submitted",
        _ => "events.report.saved",
    }
}
