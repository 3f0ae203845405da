use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use ccvms_auth::{Role, Subject};
use ccvms_communications::Announcement;
use ccvms_core::MinistryId;
use ccvms_events::{Event, EventReport};
use ccvms_feedback::VolunteerEvaluation;
use ccvms_volunteers::VolunteerProfile;

use crate::scope::{Membership, Scoped};

/// Everything a subject can ask to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // accounts
    SuspendUser,
    DeleteUser,
    AssignRole,
    AssignMinistry,
    ListUsers,
    /// Users visible in the subject's scope (a directory, not administration).
    ListMembers,
    CreateUser,
    UpdateUser,

    // volunteers
    ApproveVolunteer,
    RejectVolunteer,
    CreateVolunteer,
    UpdateVolunteer,
    DeleteVolunteer,
    ViewVolunteer,
    ListVolunteers,

    // ministries
    CreateMinistry,
    UpdateMinistry,
    DeleteMinistry,
    ListMinistries,

    // events
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    ViewEvent,
    ListEvents,
    AddVolunteerToEvent,
    RemoveVolunteerFromEvent,
    CreateTask,
    UpdateTask,
    DeleteTask,
    CreateEventReport,
    UpdateEventReport,
    ViewReport,
    ListReports,

    // attendance
    MarkAttendance,
    UpdateAttendance,
    DeleteAttendance,
    BulkMarkAttendance,
    ViewAttendance,
    ListAttendance,

    // feedback
    CreateEvaluation,
    UpdateEvaluation,
    DeleteEvaluation,
    ViewEvaluation,
    ListEvaluations,
    SubmitEventFeedback,
    ViewEventFeedback,
    ListEventFeedback,

    // communications
    CreateAnnouncement,
    UpdateAnnouncement,
    DeleteAnnouncement,
    ViewAnnouncement,

    // reporting
    ViewReportsDashboard,
    ExportReports,
    ViewAuditLog,
}

impl Action {
    pub const ALL: [Action; 54] = [
        Action::SuspendUser,
        Action::DeleteUser,
        Action::AssignRole,
        Action::AssignMinistry,
        Action::ListUsers,
        Action::ListMembers,
        Action::CreateUser,
        Action::UpdateUser,
        Action::ApproveVolunteer,
        Action::RejectVolunteer,
        Action::CreateVolunteer,
        Action::UpdateVolunteer,
        Action::DeleteVolunteer,
        Action::ViewVolunteer,
        Action::ListVolunteers,
        Action::CreateMinistry,
        Action::UpdateMinistry,
        Action::DeleteMinistry,
        Action::ListMinistries,
        Action::CreateEvent,
        Action::UpdateEvent,
        Action::DeleteEvent,
        Action::ViewEvent,
        Action::ListEvents,
        Action::AddVolunteerToEvent,
        Action::RemoveVolunteerFromEvent,
        Action::CreateTask,
        Action::UpdateTask,
        Action::DeleteTask,
        Action::CreateEventReport,
        Action::UpdateEventReport,
        Action::ViewReport,
        Action::ListReports,
        Action::MarkAttendance,
        Action::UpdateAttendance,
        Action::DeleteAttendance,
        Action::BulkMarkAttendance,
        Action::ViewAttendance,
        Action::ListAttendance,
        Action::CreateEvaluation,
        Action::UpdateEvaluation,
        Action::DeleteEvaluation,
        Action::ViewEvaluation,
        Action::ListEvaluations,
        Action::SubmitEventFeedback,
        Action::ViewEventFeedback,
        Action::ListEventFeedback,
        Action::CreateAnnouncement,
        Action::UpdateAnnouncement,
        Action::DeleteAnnouncement,
        Action::ViewAnnouncement,
        Action::ViewReportsDashboard,
        Action::ExportReports,
        Action::ViewAuditLog,
    ];

    /// Read-only actions answered purely by scope.
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            Action::ViewVolunteer
                | Action::ViewEvent
                | Action::ViewReport
                | Action::ViewAttendance
                | Action::ViewEvaluation
                | Action::ViewEventFeedback
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Action::ListMembers
                | Action::ListVolunteers
                | Action::ListMinistries
                | Action::ListEvents
                | Action::ListReports
                | Action::ListAttendance
                | Action::ListEvaluations
                | Action::ListEventFeedback
        )
    }
}

/// What an action is applied to, already loaded by the caller.
///
/// The engine never reads storage, so each variant carries exactly the
/// related records the rules inspect.
#[derive(Debug, Clone)]
pub enum Resource<'a> {
    /// Collection-level or creation actions with no existing target.
    None,
    User(&'a Subject),
    RoleChange {
        target: &'a Subject,
        profile: Option<&'a VolunteerProfile>,
        new_role: Role,
    },
    MinistryAssignment {
        target: &'a Subject,
        ministry: Option<MinistryId>,
    },
    Volunteer(&'a VolunteerProfile),
    /// Profile create (`current == None`) or update, with the requested ministries.
    VolunteerChange {
        current: Option<&'a VolunteerProfile>,
        ministries: &'a BTreeSet<MinistryId>,
    },
    Event(&'a Event),
    EventVolunteer {
        event: &'a Event,
        volunteer: &'a VolunteerProfile,
    },
    Task {
        event: &'a Event,
        assignee: Option<&'a VolunteerProfile>,
    },
    Report {
        event: &'a Event,
        report: Option<&'a EventReport>,
    },
    Evaluation {
        volunteer: &'a VolunteerProfile,
        evaluation: Option<&'a VolunteerEvaluation>,
    },
    Announcement {
        announcement: &'a Announcement,
        /// The reader's own profile, used for ministry targeting.
        reader: Option<&'a VolunteerProfile>,
        now: DateTime<Utc>,
    },
    /// A record described only by its membership.
    Scoped(Membership),
}

impl Resource<'_> {
    /// Membership of the record, for view rules.
    pub fn membership(&self) -> Option<Membership> {
        match self {
            Resource::User(subject) => Some(subject.membership()),
            Resource::Volunteer(profile) => Some(profile.membership()),
            Resource::Event(event) => Some(event.membership()),
            Resource::EventVolunteer { event, volunteer } => {
                Some(Membership::for_event_volunteer(event, volunteer))
            }
            Resource::Report {
                event,
                report: Some(report),
            } => Some(Membership::for_report(event, report)),
            Resource::Evaluation { volunteer, .. } => Some(Membership::for_evaluation(volunteer)),
            Resource::Scoped(membership) => Some(membership.clone()),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Resource::None => "none",
            Resource::User(_) => "user",
            Resource::RoleChange { .. } => "role_change",
            Resource::MinistryAssignment { .. } => "ministry_assignment",
            Resource::Volunteer(_) => "volunteer",
            Resource::VolunteerChange { .. } => "volunteer_change",
            Resource::Event(_) => "event",
            Resource::EventVolunteer { .. } => "event_volunteer",
            Resource::Task { .. } => "task",
            Resource::Report { .. } => "report",
            Resource::Evaluation { .. } => "evaluation",
            Resource::Announcement { .. } => "announcement",
            Resource::Scoped(_) => "scoped",
        }
    }
}
