use chrono::Utc;

use ccvms_auth::Subject;
use ccvms_communications::{Announcement, AnnouncementDraft};
use ccvms_core::AnnouncementId;
use ccvms_policy::{Action, Decision, Resource, decide};

use super::{WorkflowResult, Workflows, transition_applied, update_with};
use crate::store::EntityStore;

impl Workflows {
    /// Publish an announcement. Target roles are validated first.
    pub fn create_announcement(&self, actor: &Subject, draft: AnnouncementDraft) -> WorkflowResult<Announcement> {
        let announcement = Announcement::create(AnnouncementId::new(), actor.id, draft, Utc::now())?;
        self.authorize(actor, Action::CreateAnnouncement, &Resource::None)?;

        self.stores.announcements.insert(announcement.clone())?;
        transition_applied("communications.announcement.created", &announcement.id);
        Ok(announcement)
    }

    pub fn update_announcement(
        &self,
        actor: &Subject,
        announcement_id: AnnouncementId,
        draft: AnnouncementDraft,
    ) -> WorkflowResult<Announcement> {
        let updated = update_with(&self.stores.announcements, &announcement_id, |current| {
            let revised = Announcement::create(current.id, current.created_by, draft.clone(), current.created_at)?;
            self.authorize(
                actor,
                Action::UpdateAnnouncement,
                &Resource::Announcement {
                    announcement: current,
                    reader: None,
                    now: Utc::now(),
                },
            )?;
            Ok(Some(Announcement {
                is_active: current.is_active,
                ..revised
            }))
        })?;
        transition_applied("communications.announcement.updated", &announcement_id);
        Ok(updated)
    }

    pub fn delete_announcement(&self, actor: &Subject, announcement_id: AnnouncementId) -> WorkflowResult<()> {
        let announcement = self.stores.announcements.require(&announcement_id)?;
        self.authorize(
            actor,
            Action::DeleteAnnouncement,
            &Resource::Announcement {
                announcement: &announcement,
                reader: None,
                now: Utc::now(),
            },
        )?;

        self.stores.announcements.remove(&announcement_id)?;
        transition_applied("communications.announcement.deleted", &announcement_id);
        Ok(())
    }

    /// Live announcements addressed to the actor, plus their own.
    ///
    /// Filtering is per record, so individual refusals are not audited.
    pub fn visible_announcements(&self, actor: &Subject) -> WorkflowResult<Vec<Announcement>> {
        let reader = self.stores.profile_of(actor.id)?;
        let now = Utc::now();

        let mut visible: Vec<Announcement> = self
            .stores
            .announcements
            .list()?
            .into_iter()
            .filter(|announcement| {
                let resource = Resource::Announcement {
                    announcement,
                    reader: reader.as_ref(),
                    now,
                };
                decide(actor, Action::ViewAnnouncement, &resource) == Decision::Allow
            })
            .collect();
        visible.sort_by(|a, b| b.priority.cmp(&a.priority).then(b.created_at.cmp(&a.created_at)));
        Ok(visible)
    }
}
