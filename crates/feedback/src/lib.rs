//! Feedback domain module: staff evaluations of volunteers and volunteers'
//! feedback on events.

pub mod evaluation;
pub mod event_feedback;

pub use evaluation::{Rating, VolunteerEvaluation};
pub use event_feedback::{EventFeedback, FeedbackDraft, upsert_feedback};
