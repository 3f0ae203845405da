//! Attendance domain module.
//!
//! Attendance has no life cycle of its own: each `(event, volunteer)` pair is
//! a single mutable record, and marking it again overwrites the previous mark.

pub mod record;

pub use record::{Attendance, AttendanceKey, AttendanceMark, AttendanceStatus, upsert_attendance};
