//! Communications domain module: announcements and their target audience.
//!
//! Delivery (email, notifications) is an external collaborator; this crate
//! only models what was announced and to whom it is addressed.

pub mod announcement;

pub use announcement::{Announcement, AnnouncementDraft, Priority, parse_target_roles};
