//! Ministries domain module.
//!
//! Ministries are the organizational units that own volunteers and events, and
//! the unit of delegated scoping for priests and coordinators. Pure domain
//! logic only (no IO, no storage).

pub mod ministry;
pub mod program;

pub use ministry::Ministry;
pub use program::Program;
