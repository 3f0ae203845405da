use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccvms_core::{AttendanceId, DomainError, Entity, EventId, UserId, VolunteerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    #[default]
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "excused" => Ok(AttendanceStatus::Excused),
            other => Err(DomainError::validation(format!("unknown attendance status '{other}'"))),
        }
    }
}

/// Uniqueness key: at most one record per `(event, volunteer)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttendanceKey {
    pub event_id: EventId,
    pub volunteer_id: VolunteerId,
}

impl AttendanceKey {
    pub fn new(event_id: EventId, volunteer_id: VolunteerId) -> Self {
        Self {
            event_id,
            volunteer_id,
        }
    }
}

/// The mutable part of an attendance record, as submitted by a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub status: AttendanceStatus,
    pub notes: String,
}

impl AttendanceMark {
    /// Parse a caller-supplied status string.
    pub fn parse(status: &str, notes: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            status: status.parse()?,
            notes: notes.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: AttendanceId,
    pub event_id: EventId,
    pub volunteer_id: VolunteerId,
    pub status: AttendanceStatus,
    pub notes: String,
    pub marked_by: Option<UserId>,
    /// When the record was first created.
    pub marked_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.event_id, self.volunteer_id)
    }
}

impl Entity for Attendance {
    type Id = AttendanceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Create or overwrite the record for `key`.
///
/// An existing record keeps its id and `marked_at`; `status`, `notes` and
/// `marked_by` always reflect the latest mark.
pub fn upsert_attendance(
    existing: Option<&Attendance>,
    key: AttendanceKey,
    mark: AttendanceMark,
    actor: UserId,
    now: DateTime<Utc>,
) -> Attendance {
    match existing {
        Some(current) => Attendance {
            status: mark.status,
            notes: mark.notes,
            marked_by: Some(actor),
            updated_at: now,
            ..current.clone()
        },
        None => Attendance {
            id: AttendanceId::new(),
            event_id: key.event_id,
            volunteer_id: key.volunteer_id,
            status: mark.status,
            notes: mark.notes,
            marked_by: Some(actor),
            marked_at: now,
            updated_at: now,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = AttendanceMark::parse("sleeping", "").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn second_mark_overwrites_but_keeps_identity() {
        let key = AttendanceKey::new(EventId::new(), VolunteerId::new());
        let (first_marker, second_marker) = (UserId::new(), UserId::new());

        let first = upsert_attendance(
            None,
            key,
            AttendanceMark::parse("present", "on time").unwrap(),
            first_marker,
            t0(),
        );
        let second = upsert_attendance(
            Some(&first),
            key,
            AttendanceMark::parse("present", "left early").unwrap(),
            second_marker,
            t0() + Duration::hours(1),
        );

        assert_eq!(second.id, first.id);
        assert_eq!(second.key(), key);
        assert_eq!(second.marked_at, t0());
        assert_eq!(second.marked_by, Some(second_marker));
        assert_eq!(second.notes, "left early");
    }
}
