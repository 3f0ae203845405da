use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccvms_core::{Entity, EventId, FeedbackId, VolunteerId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub feedback: String,
    pub suggestions: String,
    pub would_participate_again: bool,
}

/// A volunteer's feedback on an event; one per `(event, volunteer)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFeedback {
    pub id: FeedbackId,
    pub event_id: EventId,
    pub volunteer_id: VolunteerId,
    pub feedback: String,
    pub suggestions: String,
    pub would_participate_again: bool,
    pub submitted_at: DateTime<Utc>,
}

impl Entity for EventFeedback {
    type Id = FeedbackId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Create or overwrite the feedback for `(event_id, volunteer_id)`.
pub fn upsert_feedback(
    existing: Option<&EventFeedback>,
    event_id: EventId,
    volunteer_id: VolunteerId,
    draft: FeedbackDraft,
    now: DateTime<Utc>,
) -> EventFeedback {
    EventFeedback {
        id: existing.map_or_else(FeedbackId::new, |f| f.id),
        event_id,
        volunteer_id,
        feedback: draft.feedback,
        suggestions: draft.suggestions,
        would_participate_again: draft.would_participate_again,
        submitted_at: now,
    }
}
