//! The single `decide()` funnel.
//!
//! Rules run in a fixed order per action: capability first, then
//! structural/ownership checks, then state invariants. The first failing
//! check determines the deny reason.

use ccvms_auth::{Capability, Role, Subject, has_capability};
use ccvms_core::{Decision, DenyReason, MinistryId};
use ccvms_events::{Event, ReportStatus};
use ccvms_volunteers::VolunteerProfile;

use crate::action::{Action, Resource};
use crate::scope::{Membership, ScopeDescriptor, resolve_scope};

type Rule = Result<(), DenyReason>;

/// Decide whether `subject` may perform `action` on `resource`.
///
/// Pure and total: an action paired with a resource shape it does not
/// understand is denied with `NOT_AUTHORIZED`.
pub fn decide(subject: &Subject, action: Action, resource: &Resource<'_>) -> Decision {
    evaluate(subject, action, resource).into()
}

fn evaluate(subject: &Subject, action: Action, resource: &Resource<'_>) -> Rule {
    // Self-protection holds even for accounts that cannot sign in.
    if let (Action::SuspendUser | Action::DeleteUser, Resource::User(target)) = (action, resource) {
        if target.id == subject.id {
            return Err(DenyReason::SelfActionForbidden);
        }
    }

    if !subject.can_login() {
        return Err(DenyReason::NotAuthorized);
    }

    match action {
        Action::SuspendUser | Action::DeleteUser => match resource {
            Resource::User(_) => require(subject, Capability::ManageAllUsers),
            _ => unsupported(),
        },
        Action::ListUsers | Action::CreateUser | Action::UpdateUser => {
            require(subject, Capability::ManageAllUsers)
        }
        Action::AssignRole => match resource {
            Resource::RoleChange {
                target,
                profile,
                new_role,
            } => assign_role(subject, target, *profile, *new_role),
            _ => unsupported(),
        },
        Action::AssignMinistry => match resource {
            Resource::MinistryAssignment { .. } => require(subject, Capability::AssignPriests),
            _ => unsupported(),
        },

        Action::ApproveVolunteer | Action::RejectVolunteer => match resource {
            Resource::Volunteer(profile) => {
                require(subject, Capability::ApproveVolunteers)?;
                if subject.role == Role::Priest && !profile.intersects(subject.managed_ministry()) {
                    return Err(DenyReason::OutOfScope);
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::CreateVolunteer | Action::UpdateVolunteer => match resource {
            Resource::VolunteerChange { current, ministries } => {
                require(subject, Capability::ManageVolunteers)?;
                if let Some(ministry) = bound_ministry(subject)? {
                    if current.is_some_and(|profile| !profile.serves_in(ministry)) {
                        return Err(DenyReason::OutOfScope);
                    }
                    if ministries.iter().any(|m| *m != ministry) {
                        return Err(DenyReason::OutOfScope);
                    }
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::DeleteVolunteer => match resource {
            Resource::Volunteer(profile) => {
                require(subject, Capability::ManageVolunteers)?;
                match bound_ministry(subject)? {
                    Some(ministry) if !profile.serves_in(ministry) => Err(DenyReason::OutOfScope),
                    _ => Ok(()),
                }
            }
            _ => unsupported(),
        },

        Action::CreateMinistry | Action::UpdateMinistry | Action::DeleteMinistry => {
            require(subject, Capability::ManageMinistries)
        }

        Action::CreateEvent => {
            require_role(subject, Role::Priest)?;
            require_ministry(subject).map(|_| ())
        }
        Action::UpdateEvent | Action::DeleteEvent => match resource {
            Resource::Event(event) => {
                require_role(subject, Role::Priest)?;
                let ministry = require_ministry(subject)?;
                if event.ministry != Some(ministry) {
                    return Err(DenyReason::OutOfScope);
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::AddVolunteerToEvent => match resource {
            Resource::EventVolunteer { event, volunteer } => {
                require_event_owner(subject, event)?;
                if !volunteer.intersects(event.ministry) {
                    return Err(DenyReason::OutOfScope);
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::RemoveVolunteerFromEvent => match resource {
            Resource::EventVolunteer { event, volunteer } => {
                require_event_owner(subject, event)?;
                if !event.is_enrolled(volunteer.id) {
                    return Err(DenyReason::TargetNotEnrolled);
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::CreateTask | Action::UpdateTask | Action::DeleteTask => match resource {
            Resource::Task { event, assignee } => {
                require_event_owner(subject, event)?;
                let needs_enrolment = action != Action::DeleteTask;
                match assignee {
                    Some(profile) if needs_enrolment && !event.is_enrolled(profile.id) => {
                        Err(DenyReason::TargetNotEnrolled)
                    }
                    _ => Ok(()),
                }
            }
            _ => unsupported(),
        },
        Action::CreateEventReport => match resource {
            Resource::Report { event, report: None } => require_event_owner(subject, event),
            _ => unsupported(),
        },
        Action::UpdateEventReport => match resource {
            Resource::Report {
                event,
                report: Some(report),
            } => {
                require_event_owner(subject, event)?;
                if report.event_id != event.id || report.author != subject.id {
                    return Err(DenyReason::OutOfScope);
                }
                if report.status == ReportStatus::Reviewed {
                    return Err(DenyReason::InvalidStateTransition);
                }
                Ok(())
            }
            _ => unsupported(),
        },

        Action::MarkAttendance | Action::UpdateAttendance | Action::DeleteAttendance => match resource {
            Resource::EventVolunteer { event, volunteer } => {
                require(subject, Capability::TrackAttendance)?;
                if !event.is_enrolled(volunteer.id) {
                    return Err(DenyReason::TargetNotEnrolled);
                }
                if let Some(ministry) = bound_ministry(subject)? {
                    if event.ministry != Some(ministry) || !volunteer.serves_in(ministry) {
                        return Err(DenyReason::OutOfScope);
                    }
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::BulkMarkAttendance => match resource {
            Resource::Event(event) => {
                require(subject, Capability::TrackAttendance)?;
                match bound_ministry(subject)? {
                    Some(ministry) if event.ministry != Some(ministry) => Err(DenyReason::OutOfScope),
                    _ => Ok(()),
                }
            }
            _ => unsupported(),
        },

        Action::CreateEvaluation => match resource {
            Resource::Evaluation { evaluation: None, .. } => require(subject, Capability::ProvideFeedback),
            _ => unsupported(),
        },
        Action::UpdateEvaluation | Action::DeleteEvaluation => match resource {
            Resource::Evaluation {
                evaluation: Some(evaluation),
                ..
            } => {
                require(subject, Capability::ProvideFeedback)?;
                if !evaluation.is_authored_by(subject.id) {
                    return Err(DenyReason::NotAuthorized);
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::SubmitEventFeedback => match resource {
            Resource::EventVolunteer { event, volunteer } => {
                if volunteer.user_id != subject.id {
                    return Err(DenyReason::NotAuthorized);
                }
                if !event.is_enrolled(volunteer.id) {
                    return Err(DenyReason::TargetNotEnrolled);
                }
                Ok(())
            }
            _ => unsupported(),
        },

        Action::CreateAnnouncement => require(subject, Capability::SendCommunications),
        Action::UpdateAnnouncement | Action::DeleteAnnouncement => match resource {
            Resource::Announcement { announcement, .. } => {
                require(subject, Capability::SendCommunications)?;
                if !subject.is_administrator() && announcement.created_by != subject.id {
                    return Err(DenyReason::NotAuthorized);
                }
                Ok(())
            }
            _ => unsupported(),
        },
        Action::ViewAnnouncement => match resource {
            Resource::Announcement {
                announcement,
                reader,
                now,
            } => {
                if subject.is_administrator() || announcement.created_by == subject.id {
                    return Ok(());
                }
                let ministries: Vec<MinistryId> = match subject.managed_ministry() {
                    Some(ministry) => vec![ministry],
                    None => reader
                        .filter(|profile| profile.user_id == subject.id)
                        .map(|profile| profile.ministries.iter().copied().collect())
                        .unwrap_or_default(),
                };
                if announcement.reaches(subject.role, ministries, *now) {
                    Ok(())
                } else {
                    Err(DenyReason::OutOfScope)
                }
            }
            _ => unsupported(),
        },

        Action::ViewReportsDashboard => require(subject, Capability::ViewReports),
        Action::ExportReports => require(subject, Capability::ExportReports),
        Action::ViewAuditLog => require(subject, Capability::ViewAuditLogs),

        Action::ViewVolunteer
        | Action::ViewEvent
        | Action::ViewReport
        | Action::ViewAttendance
        | Action::ViewEvaluation
        | Action::ViewEventFeedback => match resource.membership() {
            Some(membership) => view(subject, &membership),
            None => unsupported(),
        },
        Action::ListMembers
        | Action::ListVolunteers
        | Action::ListMinistries
        | Action::ListEvents
        | Action::ListReports
        | Action::ListAttendance
        | Action::ListEvaluations
        | Action::ListEventFeedback => list(subject),
    }
}

fn unsupported() -> Rule {
    Err(DenyReason::NotAuthorized)
}

fn require(subject: &Subject, capability: Capability) -> Rule {
    if has_capability(subject, capability) {
        Ok(())
    } else {
        Err(DenyReason::NotAuthorized)
    }
}

fn require_role(subject: &Subject, role: Role) -> Rule {
    if subject.role == role {
        Ok(())
    } else {
        Err(DenyReason::NotAuthorized)
    }
}

fn require_ministry(subject: &Subject) -> Result<MinistryId, DenyReason> {
    subject
        .managed_ministry()
        .ok_or(DenyReason::MissingMinistryAssignment)
}

/// `Some(ministry)` for bound priests/coordinators, `None` for unscoped roles.
fn bound_ministry(subject: &Subject) -> Result<Option<MinistryId>, DenyReason> {
    if subject.role.is_ministry_bound() {
        require_ministry(subject).map(Some)
    } else {
        Ok(None)
    }
}

/// Strict ownership: only the event's own coordinator.
fn require_event_owner(subject: &Subject, event: &Event) -> Rule {
    require_role(subject, Role::Coordinator)?;
    if event.is_coordinated_by(subject.id) {
        Ok(())
    } else {
        Err(DenyReason::OutOfScope)
    }
}

fn assign_role(
    subject: &Subject,
    target: &Subject,
    profile: Option<&VolunteerProfile>,
    new_role: Role,
) -> Rule {
    require(subject, Capability::AssignRoles)?;
    match subject.role {
        Role::Administrator => Ok(()),
        Role::Priest => {
            let ministry = require_ministry(subject)?;
            if target.role != Role::Volunteer {
                return Err(DenyReason::InvalidStateTransition);
            }
            if new_role != Role::Coordinator {
                return Err(DenyReason::NotAuthorized);
            }
            let profile = profile
                .filter(|profile| profile.user_id == target.id)
                .ok_or(DenyReason::TargetNotEnrolled)?;
            if !profile.serves_in(ministry) {
                return Err(DenyReason::OutOfScope);
            }
            Ok(())
        }
        Role::Coordinator | Role::Volunteer => Err(DenyReason::NotAuthorized),
    }
}

fn view(subject: &Subject, membership: &Membership) -> Rule {
    match resolve_scope(subject) {
        ScopeDescriptor::Empty => Err(DenyReason::MissingMinistryAssignment),
        scope if scope.permits(membership) => Ok(()),
        _ => Err(DenyReason::OutOfScope),
    }
}

fn list(subject: &Subject) -> Rule {
    match resolve_scope(subject) {
        ScopeDescriptor::Empty => Err(DenyReason::MissingMinistryAssignment),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;

    use ccvms_communications::{Announcement, AnnouncementDraft};
    use ccvms_core::{EvaluationId, EventId, ReportId, UserId, VolunteerId};
    use ccvms_events::{EventDraft, EventKind, EventReport, ReportContent};
    use ccvms_feedback::{Rating, VolunteerEvaluation};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn subject(role: Role, ministry: Option<MinistryId>) -> Subject {
        let subject = Subject::new(UserId::new(), role);
        match ministry {
            Some(m) => subject.with_ministry(m),
            None => subject,
        }
    }

    fn profile_for(user: &Subject, ministries: &[MinistryId]) -> VolunteerProfile {
        VolunteerProfile::new(VolunteerId::new(), user.id).with_ministries(ministries.iter().copied())
    }

    fn event(ministry: MinistryId, coordinator: Option<UserId>) -> Event {
        let start = now() + Duration::days(1);
        let draft = EventDraft {
            title: "Parish picnic".to_string(),
            description: String::new(),
            kind: EventKind::Celebration,
            ministry: None,
            coordinator,
            start,
            end: start + Duration::hours(3),
            location: "Hall".to_string(),
            max_volunteers: None,
        };
        Event::create_in_ministry(EventId::new(), draft, ministry).unwrap()
    }

    fn deny(reason: DenyReason) -> Decision {
        Decision::Deny(reason)
    }

    #[test]
    fn nobody_can_suspend_or_delete_themselves() {
        for role in Role::ALL {
            let me = subject(role, Some(MinistryId::new()));
            for action in [Action::SuspendUser, Action::DeleteUser] {
                assert_eq!(
                    decide(&me, action, &Resource::User(&me)),
                    deny(DenyReason::SelfActionForbidden),
                    "{role} {action:?}"
                );
            }
        }
    }

    #[test]
    fn suspending_others_needs_manage_all_users() {
        let admin = subject(Role::Administrator, None);
        let priest = subject(Role::Priest, Some(MinistryId::new()));
        let target = subject(Role::Volunteer, None);

        assert_eq!(decide(&admin, Action::SuspendUser, &Resource::User(&target)), Decision::Allow);
        assert_eq!(
            decide(&priest, Action::SuspendUser, &Resource::User(&target)),
            deny(DenyReason::NotAuthorized)
        );
    }

    #[test]
    fn accounts_that_cannot_sign_in_are_refused() {
        let mut admin = subject(Role::Administrator, None);
        admin.is_suspended = true;
        assert_eq!(decide(&admin, Action::ListUsers, &Resource::None), deny(DenyReason::NotAuthorized));

        let pending = Subject::signup_volunteer(UserId::new());
        assert_eq!(
            decide(&pending, Action::ListEvents, &Resource::None),
            deny(DenyReason::NotAuthorized)
        );
    }

    #[test]
    fn priest_promotes_volunteer_in_own_ministry() {
        let m = MinistryId::new();
        let priest = subject(Role::Priest, Some(m));
        let target = subject(Role::Volunteer, None);
        let profile = profile_for(&target, &[m]);

        let resource = Resource::RoleChange {
            target: &target,
            profile: Some(&profile),
            new_role: Role::Coordinator,
        };
        assert_eq!(decide(&priest, Action::AssignRole, &resource), Decision::Allow);
    }

    #[test]
    fn priest_promotion_checks_in_order() {
        let (m, n) = (MinistryId::new(), MinistryId::new());
        let priest = subject(Role::Priest, Some(m));
        let volunteer = subject(Role::Volunteer, None);
        let elsewhere = profile_for(&volunteer, &[n]);
        let coordinator = subject(Role::Coordinator, Some(m));

        let out_of_ministry = Resource::RoleChange {
            target: &volunteer,
            profile: Some(&elsewhere),
            new_role: Role::Coordinator,
        };
        assert_eq!(decide(&priest, Action::AssignRole, &out_of_ministry), deny(DenyReason::OutOfScope));

        let already_coordinator = Resource::RoleChange {
            target: &coordinator,
            profile: None,
            new_role: Role::Coordinator,
        };
        assert_eq!(
            decide(&priest, Action::AssignRole, &already_coordinator),
            deny(DenyReason::InvalidStateTransition)
        );

        let to_priest = Resource::RoleChange {
            target: &volunteer,
            profile: Some(&elsewhere),
            new_role: Role::Priest,
        };
        assert_eq!(decide(&priest, Action::AssignRole, &to_priest), deny(DenyReason::NotAuthorized));

        let no_profile = Resource::RoleChange {
            target: &volunteer,
            profile: None,
            new_role: Role::Coordinator,
        };
        assert_eq!(decide(&priest, Action::AssignRole, &no_profile), deny(DenyReason::TargetNotEnrolled));

        let unbound = subject(Role::Priest, None);
        assert_eq!(
            decide(&unbound, Action::AssignRole, &no_profile),
            deny(DenyReason::MissingMinistryAssignment)
        );
    }

    #[test]
    fn administrators_assign_any_role_and_coordinators_none() {
        let admin = subject(Role::Administrator, None);
        let coordinator = subject(Role::Coordinator, Some(MinistryId::new()));
        let target = subject(Role::Coordinator, None);
        let resource = Resource::RoleChange {
            target: &target,
            profile: None,
            new_role: Role::Administrator,
        };

        assert_eq!(decide(&admin, Action::AssignRole, &resource), Decision::Allow);
        assert_eq!(decide(&coordinator, Action::AssignRole, &resource), deny(DenyReason::NotAuthorized));
    }

    #[test]
    fn only_administrators_assign_ministries() {
        let admin = subject(Role::Administrator, None);
        let priest = subject(Role::Priest, Some(MinistryId::new()));
        let target = subject(Role::Priest, None);
        let resource = Resource::MinistryAssignment {
            target: &target,
            ministry: None,
        };

        assert_eq!(decide(&admin, Action::AssignMinistry, &resource), Decision::Allow);
        assert_eq!(decide(&priest, Action::AssignMinistry, &resource), deny(DenyReason::NotAuthorized));
    }

    #[test]
    fn priests_approve_only_their_ministry() {
        let (m, n) = (MinistryId::new(), MinistryId::new());
        let priest = subject(Role::Priest, Some(m));
        let unbound = subject(Role::Priest, None);
        let applicant = subject(Role::Volunteer, None);
        let mine = profile_for(&applicant, &[m, n]);
        let theirs = profile_for(&applicant, &[n]);

        assert_eq!(decide(&priest, Action::ApproveVolunteer, &Resource::Volunteer(&mine)), Decision::Allow);
        assert_eq!(
            decide(&priest, Action::RejectVolunteer, &Resource::Volunteer(&theirs)),
            deny(DenyReason::OutOfScope)
        );
        assert_eq!(
            decide(&unbound, Action::ApproveVolunteer, &Resource::Volunteer(&mine)),
            deny(DenyReason::OutOfScope)
        );

        let coordinator = subject(Role::Coordinator, Some(m));
        assert_eq!(
            decide(&coordinator, Action::ApproveVolunteer, &Resource::Volunteer(&mine)),
            deny(DenyReason::NotAuthorized)
        );
    }

    #[test]
    fn volunteer_management_stays_inside_the_ministry() {
        let (m, n) = (MinistryId::new(), MinistryId::new());
        let coordinator = subject(Role::Coordinator, Some(m));
        let owner = subject(Role::Volunteer, None);
        let current = profile_for(&owner, &[m]);

        let own: BTreeSet<_> = [m].into();
        let foreign: BTreeSet<_> = [m, n].into();

        let create = Resource::VolunteerChange {
            current: None,
            ministries: &own,
        };
        assert_eq!(decide(&coordinator, Action::CreateVolunteer, &create), Decision::Allow);

        let widen = Resource::VolunteerChange {
            current: Some(&current),
            ministries: &foreign,
        };
        assert_eq!(decide(&coordinator, Action::UpdateVolunteer, &widen), deny(DenyReason::OutOfScope));

        let unbound = subject(Role::Coordinator, None);
        assert_eq!(
            decide(&unbound, Action::CreateVolunteer, &create),
            deny(DenyReason::MissingMinistryAssignment)
        );

        let admin = subject(Role::Administrator, None);
        assert_eq!(decide(&admin, Action::UpdateVolunteer, &widen), Decision::Allow);
    }

    #[test]
    fn events_are_scheduled_by_bound_priests() {
        let m = MinistryId::new();
        let priest = subject(Role::Priest, Some(m));
        let unbound = subject(Role::Priest, None);
        let admin = subject(Role::Administrator, None);

        assert_eq!(decide(&priest, Action::CreateEvent, &Resource::None), Decision::Allow);
        assert_eq!(
            decide(&unbound, Action::CreateEvent, &Resource::None),
            deny(DenyReason::MissingMinistryAssignment)
        );
        assert_eq!(decide(&admin, Action::CreateEvent, &Resource::None), deny(DenyReason::NotAuthorized));

        let own = event(m, None);
        let other = event(MinistryId::new(), None);
        assert_eq!(decide(&priest, Action::UpdateEvent, &Resource::Event(&own)), Decision::Allow);
        assert_eq!(
            decide(&priest, Action::DeleteEvent, &Resource::Event(&other)),
            deny(DenyReason::OutOfScope)
        );
    }

    #[test]
    fn event_staffing_is_owned_by_the_coordinator() {
        let m = MinistryId::new();
        let coordinator = subject(Role::Coordinator, Some(m));
        let colleague = subject(Role::Coordinator, Some(m));
        let priest = subject(Role::Priest, Some(m));
        let volunteer = subject(Role::Volunteer, None);
        let profile = profile_for(&volunteer, &[m]);
        let stranger = profile_for(&volunteer, &[MinistryId::new()]);
        let mut owned = event(m, Some(coordinator.id));

        let add = Resource::EventVolunteer {
            event: &owned,
            volunteer: &profile,
        };
        assert_eq!(decide(&coordinator, Action::AddVolunteerToEvent, &add), Decision::Allow);
        assert_eq!(decide(&colleague, Action::AddVolunteerToEvent, &add), deny(DenyReason::OutOfScope));
        assert_eq!(decide(&priest, Action::AddVolunteerToEvent, &add), deny(DenyReason::NotAuthorized));

        let add_stranger = Resource::EventVolunteer {
            event: &owned,
            volunteer: &stranger,
        };
        assert_eq!(
            decide(&coordinator, Action::AddVolunteerToEvent, &add_stranger),
            deny(DenyReason::OutOfScope)
        );

        assert_eq!(
            decide(&coordinator, Action::RemoveVolunteerFromEvent, &add),
            deny(DenyReason::TargetNotEnrolled)
        );
        owned.enroll(profile.id).unwrap();
        let remove = Resource::EventVolunteer {
            event: &owned,
            volunteer: &profile,
        };
        assert_eq!(decide(&coordinator, Action::RemoveVolunteerFromEvent, &remove), Decision::Allow);
    }

    #[test]
    fn tasks_go_to_enrolled_volunteers() {
        let m = MinistryId::new();
        let coordinator = subject(Role::Coordinator, Some(m));
        let volunteer = subject(Role::Volunteer, None);
        let profile = profile_for(&volunteer, &[m]);
        let mut owned = event(m, Some(coordinator.id));

        let task = Resource::Task {
            event: &owned,
            assignee: Some(&profile),
        };
        assert_eq!(decide(&coordinator, Action::CreateTask, &task), deny(DenyReason::TargetNotEnrolled));
        assert_eq!(decide(&coordinator, Action::DeleteTask, &task), Decision::Allow);

        owned.enroll(profile.id).unwrap();
        let task = Resource::Task {
            event: &owned,
            assignee: Some(&profile),
        };
        assert_eq!(decide(&coordinator, Action::CreateTask, &task), Decision::Allow);
    }

    #[test]
    fn reviewed_reports_cannot_be_edited() {
        let m = MinistryId::new();
        let coordinator = subject(Role::Coordinator, Some(m));
        let owned = event(m, Some(coordinator.id));
        let mut report = EventReport::create(
            ReportId::new(),
            owned.id,
            coordinator.id,
            ReportContent::default(),
            "submitted",
            now(),
        );

        let create = Resource::Report {
            event: &owned,
            report: None,
        };
        assert_eq!(decide(&coordinator, Action::CreateEventReport, &create), Decision::Allow);

        let update = Resource::Report {
            event: &owned,
            report: Some(&report),
        };
        assert_eq!(decide(&coordinator, Action::UpdateEventReport, &update), Decision::Allow);

        report.status = ReportStatus::Reviewed;
        let update = Resource::Report {
            event: &owned,
            report: Some(&report),
        };
        assert_eq!(
            decide(&coordinator, Action::UpdateEventReport, &update),
            deny(DenyReason::InvalidStateTransition)
        );
    }

    #[test]
    fn attendance_requires_enrolment_for_every_role() {
        let m = MinistryId::new();
        let volunteer = subject(Role::Volunteer, None);
        let profile = profile_for(&volunteer, &[m]);
        let unenrolled = event(m, None);
        let resource = Resource::EventVolunteer {
            event: &unenrolled,
            volunteer: &profile,
        };

        for role in [Role::Administrator, Role::Priest, Role::Coordinator] {
            let marker = subject(role, Some(m));
            for action in [Action::MarkAttendance, Action::UpdateAttendance, Action::DeleteAttendance] {
                assert_eq!(
                    decide(&marker, action, &resource),
                    deny(DenyReason::TargetNotEnrolled),
                    "{role} {action:?}"
                );
            }
        }
    }

    #[test]
    fn attendance_is_ministry_scoped_for_staff() {
        let (m, n) = (MinistryId::new(), MinistryId::new());
        let volunteer = subject(Role::Volunteer, None);
        let profile = profile_for(&volunteer, &[m]);
        let mut e = event(m, None);
        e.enroll(profile.id).unwrap();
        let resource = Resource::EventVolunteer {
            event: &e,
            volunteer: &profile,
        };

        assert_eq!(
            decide(&subject(Role::Coordinator, Some(m)), Action::MarkAttendance, &resource),
            Decision::Allow
        );
        assert_eq!(
            decide(&subject(Role::Priest, Some(n)), Action::MarkAttendance, &resource),
            deny(DenyReason::OutOfScope)
        );
        assert_eq!(
            decide(&subject(Role::Administrator, None), Action::MarkAttendance, &resource),
            Decision::Allow
        );
        assert_eq!(
            decide(&subject(Role::Coordinator, Some(n)), Action::BulkMarkAttendance, &Resource::Event(&e)),
            deny(DenyReason::OutOfScope)
        );
    }

    #[test]
    fn only_the_evaluator_edits_an_evaluation() {
        let m = MinistryId::new();
        let author = subject(Role::Coordinator, Some(m));
        let other = subject(Role::Priest, Some(m));
        let volunteer = subject(Role::Volunteer, None);
        let profile = profile_for(&volunteer, &[m]);
        let evaluation = VolunteerEvaluation {
            id: EvaluationId::new(),
            volunteer_id: profile.id,
            event_id: None,
            evaluated_by: author.id,
            rating: Rating::try_from(4).unwrap(),
            comments: String::new(),
            created_at: now(),
        };

        let existing = Resource::Evaluation {
            volunteer: &profile,
            evaluation: Some(&evaluation),
        };
        assert_eq!(decide(&author, Action::UpdateEvaluation, &existing), Decision::Allow);
        assert_eq!(decide(&other, Action::DeleteEvaluation, &existing), deny(DenyReason::NotAuthorized));

        let fresh = Resource::Evaluation {
            volunteer: &profile,
            evaluation: None,
        };
        assert_eq!(decide(&other, Action::CreateEvaluation, &fresh), Decision::Allow);
        assert_eq!(decide(&volunteer, Action::CreateEvaluation, &fresh), deny(DenyReason::NotAuthorized));
    }

    #[test]
    fn volunteers_give_feedback_on_their_own_enrolments() {
        let m = MinistryId::new();
        let me = subject(Role::Volunteer, None);
        let someone = subject(Role::Volunteer, None);
        let mine = profile_for(&me, &[m]);
        let theirs = profile_for(&someone, &[m]);
        let mut e = event(m, None);

        let own = Resource::EventVolunteer {
            event: &e,
            volunteer: &mine,
        };
        assert_eq!(decide(&me, Action::SubmitEventFeedback, &own), deny(DenyReason::TargetNotEnrolled));

        e.enroll(mine.id).unwrap();
        e.enroll(theirs.id).unwrap();
        let own = Resource::EventVolunteer {
            event: &e,
            volunteer: &mine,
        };
        let other = Resource::EventVolunteer {
            event: &e,
            volunteer: &theirs,
        };
        assert_eq!(decide(&me, Action::SubmitEventFeedback, &own), Decision::Allow);
        assert_eq!(decide(&me, Action::SubmitEventFeedback, &other), deny(DenyReason::NotAuthorized));
    }

    #[test]
    fn announcements_reach_their_audience() {
        let (m, n) = (MinistryId::new(), MinistryId::new());
        let author = subject(Role::Coordinator, Some(m));
        let draft = AnnouncementDraft {
            title: "Choir rehearsal".to_string(),
            message: "Thursday 7pm".to_string(),
            priority: Default::default(),
            target_roles: "volunteer".to_string(),
            target_ministries: [m].into(),
            expires_at: Some(now() + Duration::days(7)),
        };
        let announcement =
            Announcement::create(ccvms_core::AnnouncementId::new(), author.id, draft, now()).unwrap();

        let reader = subject(Role::Volunteer, None);
        let in_choir = profile_for(&reader, &[m]);
        let in_youth = profile_for(&reader, &[n]);

        let view = |profile: &VolunteerProfile, at| {
            decide(
                &reader,
                Action::ViewAnnouncement,
                &Resource::Announcement {
                    announcement: &announcement,
                    reader: Some(profile),
                    now: at,
                },
            )
        };
        assert_eq!(view(&in_choir, now()), Decision::Allow);
        assert_eq!(view(&in_youth, now()), deny(DenyReason::OutOfScope));
        assert_eq!(view(&in_choir, now() + Duration::days(8)), deny(DenyReason::OutOfScope));

        let edit = Resource::Announcement {
            announcement: &announcement,
            reader: None,
            now: now(),
        };
        assert_eq!(decide(&author, Action::UpdateAnnouncement, &edit), Decision::Allow);
        assert_eq!(
            decide(&subject(Role::Priest, Some(m)), Action::DeleteAnnouncement, &edit),
            deny(DenyReason::NotAuthorized)
        );
        assert_eq!(
            decide(&subject(Role::Administrator, None), Action::DeleteAnnouncement, &edit),
            Decision::Allow
        );
    }

    #[test]
    fn views_follow_scope() {
        let (m, n) = (MinistryId::new(), MinistryId::new());
        let volunteer = subject(Role::Volunteer, None);
        let profile = profile_for(&volunteer, &[m]);
        let resource = Resource::Volunteer(&profile);

        assert_eq!(decide(&volunteer, Action::ViewVolunteer, &resource), Decision::Allow);
        assert_eq!(
            decide(&subject(Role::Volunteer, None), Action::ViewVolunteer, &resource),
            deny(DenyReason::OutOfScope)
        );
        assert_eq!(decide(&subject(Role::Priest, Some(m)), Action::ViewVolunteer, &resource), Decision::Allow);
        assert_eq!(
            decide(&subject(Role::Priest, Some(n)), Action::ViewVolunteer, &resource),
            deny(DenyReason::OutOfScope)
        );
        assert_eq!(
            decide(&subject(Role::Coordinator, None), Action::ListVolunteers, &Resource::None),
            deny(DenyReason::MissingMinistryAssignment)
        );
    }

    #[test]
    fn directory_lists_need_a_subject_who_can_log_in() {
        let mut admin = subject(Role::Administrator, None);
        for action in [Action::ListMembers, Action::ListMinistries] {
            assert_eq!(decide(&admin, action, &Resource::None), Decision::Allow);
        }

        admin.is_suspended = true;
        for action in [Action::ListMembers, Action::ListMinistries] {
            assert_eq!(decide(&admin, action, &Resource::None), deny(DenyReason::NotAuthorized));
        }
    }

    #[test]
    fn mismatched_resource_is_denied() {
        let admin = subject(Role::Administrator, None);
        assert_eq!(decide(&admin, Action::SuspendUser, &Resource::None), deny(DenyReason::NotAuthorized));
        assert_eq!(decide(&admin, Action::ViewReport, &Resource::None), deny(DenyReason::NotAuthorized));
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop::sample::select(Action::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            .. ProptestConfig::default()
        })]

        /// Property: self suspension is refused for every role and ministry binding.
        #[test]
        fn self_suspension_is_always_refused(role in arb_role(), bound in any::<bool>()) {
            let me = subject(role, bound.then(MinistryId::new));
            prop_assert_eq!(
                decide(&me, Action::SuspendUser, &Resource::User(&me)),
                deny(DenyReason::SelfActionForbidden)
            );
        }

        /// Property: a volunteer can only act on records tied to themselves.
        #[test]
        fn volunteers_are_denied_on_foreign_records(action in arb_action(), in_ministry in any::<bool>()) {
            let m = MinistryId::new();
            let me = subject(Role::Volunteer, None);
            let other = subject(Role::Volunteer, None);
            let memberships: Vec<MinistryId> = if in_ministry { vec![m] } else { Vec::new() };
            let others_profile = profile_for(&other, &memberships);
            let mut e = event(m, Some(UserId::new()));
            e.enroll(others_profile.id).unwrap();
            let report = EventReport::create(
                ReportId::new(), e.id, other.id, ReportContent::default(), "draft", now(),
            );
            let ministries: BTreeSet<MinistryId> = [m].into();

            let resources = [
                Resource::None,
                Resource::User(&other),
                Resource::RoleChange { target: &other, profile: Some(&others_profile), new_role: Role::Coordinator },
                Resource::MinistryAssignment { target: &other, ministry: Some(m) },
                Resource::Volunteer(&others_profile),
                Resource::VolunteerChange { current: Some(&others_profile), ministries: &ministries },
                Resource::Event(&e),
                Resource::EventVolunteer { event: &e, volunteer: &others_profile },
                Resource::Task { event: &e, assignee: Some(&others_profile) },
                Resource::Report { event: &e, report: Some(&report) },
                Resource::Evaluation { volunteer: &others_profile, evaluation: None },
            ];

            for resource in &resources {
                let decision = decide(&me, action, resource);
                if action.is_list() {
                    prop_assert!(decision.is_allowed());
                } else {
                    prop_assert!(!decision.is_allowed(), "{:?} on {} was allowed", action, resource.kind());
                }
            }
        }

        /// Property: unbound staff never see or touch ministry-scoped records.
        #[test]
        fn unbound_staff_are_denied_scoped_views(role in prop::sample::select(vec![Role::Priest, Role::Coordinator])) {
            let m = MinistryId::new();
            let unbound = subject(role, None);
            let owner = subject(Role::Volunteer, None);
            let profile = profile_for(&owner, &[m]);

            prop_assert_eq!(
                decide(&unbound, Action::ViewVolunteer, &Resource::Volunteer(&profile)),
                deny(DenyReason::MissingMinistryAssignment)
            );
            prop_assert!(!decide(&unbound, Action::ApproveVolunteer, &Resource::Volunteer(&profile)).is_allowed());
        }
    }
}
