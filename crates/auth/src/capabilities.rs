//! Static role → capability table.
//!
//! Capabilities are granted wholesale by role. The table below is the single
//! source of truth; [`has_capability`] is a pure lookup on `subject.role`.

use serde::{Deserialize, Serialize};

use crate::{Role, Subject};

/// A named permission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageVolunteers,
    ManageAllUsers,
    AssignRoles,
    ApproveVolunteers,
    ScheduleEvents,
    AssignVolunteersToEvents,
    TrackAttendance,
    SendCommunications,
    ViewReports,
    ExportReports,
    ViewAuditLogs,
    ManageMinistries,
    AssignPriests,
    MakeCoordinator,
    ProvideFeedback,
}

impl Capability {
    pub const ALL: [Capability; 15] = [
        Capability::ManageVolunteers,
        Capability::ManageAllUsers,
        Capability::AssignRoles,
        Capability::ApproveVolunteers,
        Capability::ScheduleEvents,
        Capability::AssignVolunteersToEvents,
        Capability::TrackAttendance,
        Capability::SendCommunications,
        Capability::ViewReports,
        Capability::ExportReports,
        Capability::ViewAuditLogs,
        Capability::ManageMinistries,
        Capability::AssignPriests,
        Capability::MakeCoordinator,
        Capability::ProvideFeedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageVolunteers => "manage_volunteers",
            Capability::ManageAllUsers => "manage_all_users",
            Capability::AssignRoles => "assign_roles",
            Capability::ApproveVolunteers => "approve_volunteers",
            Capability::ScheduleEvents => "schedule_events",
            Capability::AssignVolunteersToEvents => "assign_volunteers_to_events",
            Capability::TrackAttendance => "track_attendance",
            Capability::SendCommunications => "send_communications",
            Capability::ViewReports => "view_reports",
            Capability::ExportReports => "export_reports",
            Capability::ViewAuditLogs => "view_audit_logs",
            Capability::ManageMinistries => "manage_ministries",
            Capability::AssignPriests => "assign_priests",
            Capability::MakeCoordinator => "make_coordinator",
            Capability::ProvideFeedback => "provide_feedback",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMINISTRATOR: &[Capability] = &Capability::ALL;

const PRIEST: &[Capability] = &[
    Capability::ManageVolunteers,
    Capability::AssignRoles,
    Capability::ApproveVolunteers,
    Capability::ScheduleEvents,
    Capability::AssignVolunteersToEvents,
    Capability::TrackAttendance,
    Capability::SendCommunications,
    Capability::ViewReports,
    Capability::ExportReports,
    Capability::MakeCoordinator,
    Capability::ProvideFeedback,
];

const COORDINATOR: &[Capability] = &[
    Capability::ManageVolunteers,
    Capability::ScheduleEvents,
    Capability::AssignVolunteersToEvents,
    Capability::TrackAttendance,
    Capability::SendCommunications,
    Capability::ViewReports,
    Capability::ProvideFeedback,
];

const VOLUNTEER: &[Capability] = &[];

/// Capabilities granted to a role.
pub fn role_capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Administrator => ADMINISTRATOR,
        Role::Priest => PRIEST,
        Role::Coordinator => COORDINATOR,
        Role::Volunteer => VOLUNTEER,
    }
}

/// Whether `subject`'s role grants `capability`.
///
/// - No IO
/// - No panics
/// - Depends on `subject.role` alone
pub fn has_capability(subject: &Subject, capability: Capability) -> bool {
    role_capabilities(subject.role).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccvms_core::UserId;

    fn holders(capability: Capability) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| role_capabilities(*role).contains(&capability))
            .collect()
    }

    #[test]
    fn administrator_holds_every_capability() {
        for capability in Capability::ALL {
            assert!(role_capabilities(Role::Administrator).contains(&capability));
        }
    }

    #[test]
    fn volunteer_holds_nothing() {
        assert!(role_capabilities(Role::Volunteer).is_empty());
    }

    #[test]
    fn administrator_only_capabilities() {
        for capability in [
            Capability::ManageAllUsers,
            Capability::ViewAuditLogs,
            Capability::ManageMinistries,
            Capability::AssignPriests,
        ] {
            assert_eq!(holders(capability), vec![Role::Administrator], "{capability}");
        }
    }

    #[test]
    fn priest_but_not_coordinator_capabilities() {
        for capability in [
            Capability::AssignRoles,
            Capability::ApproveVolunteers,
            Capability::ExportReports,
            Capability::MakeCoordinator,
        ] {
            assert_eq!(holders(capability), vec![Role::Administrator, Role::Priest], "{capability}");
        }
    }

    #[test]
    fn staff_capabilities_exclude_volunteers() {
        for capability in [
            Capability::ManageVolunteers,
            Capability::ScheduleEvents,
            Capability::AssignVolunteersToEvents,
            Capability::TrackAttendance,
            Capability::SendCommunications,
            Capability::ViewReports,
            Capability::ProvideFeedback,
        ] {
            assert_eq!(
                holders(capability),
                vec![Role::Administrator, Role::Priest, Role::Coordinator],
                "{capability}"
            );
        }
    }

    #[test]
    fn lookup_ignores_everything_but_role() {
        let mut subject = Subject::new(UserId::new(), Role::Coordinator);
        subject.is_suspended = true;
        subject.assigned_ministry = None;
        assert!(has_capability(&subject, Capability::TrackAttendance));
        assert!(!has_capability(&subject, Capability::ApproveVolunteers));
    }
}
