use chrono::Utc;

use ccvms_auth::Subject;
use ccvms_core::{DenyReason, EvaluationId, EventId, VolunteerId};
use ccvms_feedback::{EventFeedback, FeedbackDraft, Rating, VolunteerEvaluation, upsert_feedback};
use ccvms_policy::{Action, Membership, Resource, Scoped, apply_scope, resolve_scope};

use super::{WorkflowError, WorkflowResult, Workflows, transition_applied, update_with};
use crate::store::EntityStore;

impl Workflows {
    /// Rate a volunteer, optionally for one event. `rating` must be 1..=5.
    pub fn create_evaluation(
        &self,
        actor: &Subject,
        volunteer_id: VolunteerId,
        event_id: Option<EventId>,
        rating: u8,
        comments: &str,
    ) -> WorkflowResult<VolunteerEvaluation> {
        let rating = Rating::try_from(rating)?;
        let volunteer = self.stores.profiles.require(&volunteer_id)?;
        if let Some(event_id) = &event_id {
            self.stores.events.require(event_id)?;
        }
        self.authorize(
            actor,
            Action::CreateEvaluation,
            &Resource::Evaluation {
                volunteer: &volunteer,
                evaluation: None,
            },
        )?;

        let evaluation = VolunteerEvaluation {
            id: EvaluationId::new(),
            volunteer_id,
            event_id,
            evaluated_by: actor.id,
            rating,
            comments: comments.to_string(),
            created_at: Utc::now(),
        };
        self.stores.evaluations.insert(evaluation.clone())?;
        transition_applied("feedback.evaluation.created", &evaluation.id);
        Ok(evaluation)
    }

    pub fn update_evaluation(
        &self,
        actor: &Subject,
        evaluation_id: EvaluationId,
        rating: u8,
        comments: &str,
    ) -> WorkflowResult<VolunteerEvaluation> {
        let rating = Rating::try_from(rating)?;
        let updated = update_with(&self.stores.evaluations, &evaluation_id, |current| {
            let volunteer = self.stores.profiles.require(&current.volunteer_id)?;
            self.authorize(
                actor,
                Action::UpdateEvaluation,
                &Resource::Evaluation {
                    volunteer: &volunteer,
                    evaluation: Some(current),
                },
            )?;
            Ok(Some(VolunteerEvaluation {
                rating,
                comments: comments.to_string(),
                ..current.clone()
            }))
        })?;
        transition_applied("feedback.evaluation.updated", &evaluation_id);
        Ok(updated)
    }

    pub fn delete_evaluation(&self, actor: &Subject, evaluation_id: EvaluationId) -> WorkflowResult<()> {
        let evaluation = self.stores.evaluations.require(&evaluation_id)?;
        let volunteer = self.stores.profiles.require(&evaluation.volunteer_id)?;
        self.authorize(
            actor,
            Action::DeleteEvaluation,
            &Resource::Evaluation {
                volunteer: &volunteer,
                evaluation: Some(&evaluation),
            },
        )?;

        self.stores.evaluations.remove(&evaluation_id)?;
        transition_applied("feedback.evaluation.deleted", &evaluation_id);
        Ok(())
    }

    /// Evaluations of volunteers inside the actor's scope; volunteers see their own.
    pub fn visible_evaluations(&self, actor: &Subject) -> WorkflowResult<Vec<VolunteerEvaluation>> {
        self.authorize(actor, Action::ListEvaluations, &Resource::None)?;
        let profiles = self.stores.profiles.list()?;
        let mut visible = apply_scope(&resolve_scope(actor), self.stores.evaluations.list()?, |evaluation| {
            profiles
                .iter()
                .find(|p| p.id == evaluation.volunteer_id)
                .map(Scoped::membership)
                .unwrap_or_default()
        });
        visible.sort_by_key(|e| e.created_at);
        Ok(visible)
    }

    /// A volunteer's own feedback on an event they served at.
    ///
    /// One record per `(event, volunteer)`; submitting again overwrites it.
    pub fn submit_event_feedback(
        &self,
        actor: &Subject,
        event_id: EventId,
        draft: FeedbackDraft,
    ) -> WorkflowResult<EventFeedback> {
        let event = self.stores.events.require(&event_id)?;
        let volunteer = self
            .stores
            .profile_of(actor.id)?
            .ok_or(WorkflowError::Denied(DenyReason::NotAuthorized))?;
        self.authorize(
            actor,
            Action::SubmitEventFeedback,
            &Resource::EventVolunteer {
                event: &event,
                volunteer: &volunteer,
            },
        )?;

        let now = Utc::now();
        let feedback = self.stores.feedback.upsert_with((event_id, volunteer.id), |existing| {
            upsert_feedback(existing, event_id, volunteer.id, draft, now)
        })?;
        transition_applied("feedback.event_feedback.submitted", &feedback.id);
        Ok(feedback)
    }

    /// Event feedback inside the actor's scope.
    pub fn visible_event_feedback(&self, actor: &Subject) -> WorkflowResult<Vec<EventFeedback>> {
        self.authorize(actor, Action::ListEventFeedback, &Resource::None)?;
        let events = self.stores.events.list()?;
        let profiles = self.stores.profiles.list()?;

        let mut visible = apply_scope(&resolve_scope(actor), self.stores.feedback.list()?, |feedback| {
            let ministry = events.iter().find(|e| e.id == feedback.event_id).and_then(|e| e.ministry);
            let owner = profiles.iter().find(|p| p.id == feedback.volunteer_id).map(|p| p.user_id);
            Membership::in_ministry(ministry).with_owners(owner)
        });
        visible.sort_by_key(|f| f.submitted_at);
        Ok(visible)
    }
}
