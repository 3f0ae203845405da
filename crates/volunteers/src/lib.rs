//! Volunteers domain module.
//!
//! A volunteer profile is attached 1:1 to a user account and records the
//! ministries the volunteer serves in. Those memberships decide which
//! priest/coordinator scopes can see the volunteer.

pub mod profile;

pub use profile::VolunteerProfile;
