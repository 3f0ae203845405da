use std::collections::BTreeSet;

use ccvms_auth::Subject;
use ccvms_core::{MinistryId, UserId, VolunteerId};
use ccvms_policy::{Action, Resource, filter_scoped, resolve_scope};
use ccvms_volunteers::VolunteerProfile;

use super::{WorkflowResult, Workflows, transition_applied, update_with};
use crate::store::EntityStore;

/// Editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub skills: String,
    pub interests: String,
    pub availability: String,
}

impl Workflows {
    /// Attach a volunteer profile to an existing user.
    pub fn create_volunteer(
        &self,
        actor: &Subject,
        user_id: UserId,
        ministries: BTreeSet<MinistryId>,
        details: ProfileDetails,
    ) -> WorkflowResult<VolunteerProfile> {
        self.stores.users.require(&user_id)?;
        for ministry in &ministries {
            self.stores.ministries.require(ministry)?;
        }
        self.authorize(
            actor,
            Action::CreateVolunteer,
            &Resource::VolunteerChange {
                current: None,
                ministries: &ministries,
            },
        )?;

        let mut profile = VolunteerProfile::new(VolunteerId::new(), user_id).with_ministries(ministries);
        profile.skills = details.skills;
        profile.interests = details.interests;
        profile.availability = details.availability;

        self.stores.profiles.insert(profile.clone())?;
        transition_applied("volunteers.profile.created", &profile.id);
        Ok(profile)
    }

    /// Replace a profile's ministries and details.
    pub fn update_volunteer(
        &self,
        actor: &Subject,
        volunteer_id: VolunteerId,
        ministries: BTreeSet<MinistryId>,
        details: ProfileDetails,
    ) -> WorkflowResult<VolunteerProfile> {
        for ministry in &ministries {
            self.stores.ministries.require(ministry)?;
        }

        let updated = update_with(&self.stores.profiles, &volunteer_id, |current| {
            self.authorize(
                actor,
                Action::UpdateVolunteer,
                &Resource::VolunteerChange {
                    current: Some(current),
                    ministries: &ministries,
                },
            )?;
            Ok(Some(VolunteerProfile {
                ministries: ministries.clone(),
                skills: details.skills.clone(),
                interests: details.interests.clone(),
                availability: details.availability.clone(),
                ..current.clone()
            }))
        })?;

        transition_applied("volunteers.profile.updated", &volunteer_id);
        Ok(updated)
    }

    pub fn delete_volunteer(&self, actor: &Subject, volunteer_id: VolunteerId) -> WorkflowResult<()> {
        let profile = self.stores.profiles.require(&volunteer_id)?;
        self.authorize(actor, Action::DeleteVolunteer, &Resource::Volunteer(&profile))?;

        self.stores.profiles.remove(&volunteer_id)?;
        transition_applied("volunteers.profile.deleted", &volunteer_id);
        Ok(())
    }

    pub fn view_volunteer(&self, actor: &Subject, volunteer_id: VolunteerId) -> WorkflowResult<VolunteerProfile> {
        let profile = self.stores.profiles.require(&volunteer_id)?;
        self.authorize(actor, Action::ViewVolunteer, &Resource::Volunteer(&profile))?;
        Ok(profile)
    }

    /// Profiles inside the actor's scope.
    pub fn visible_volunteers(&self, actor: &Subject) -> WorkflowResult<Vec<VolunteerProfile>> {
        self.authorize(actor, Action::ListVolunteers, &Resource::None)?;
        let mut visible = filter_scoped(&resolve_scope(actor), self.stores.profiles.list()?);
        visible.sort_by_key(|p| p.id);
        Ok(visible)
    }
}
