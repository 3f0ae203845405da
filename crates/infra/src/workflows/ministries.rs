use chrono::NaiveDate;

use ccvms_auth::Subject;
use ccvms_core::{MinistryId, ProgramId, UserId};
use ccvms_ministries::{Ministry, Program};
use ccvms_policy::{Action, Resource, ScopeDescriptor, filter_scoped, resolve_scope};

use super::{WorkflowResult, Workflows, transition_applied, update_with};
use crate::store::EntityStore;

impl Workflows {
    pub fn create_ministry(
        &self,
        actor: &Subject,
        name: &str,
        description: &str,
        leader: Option<UserId>,
    ) -> WorkflowResult<Ministry> {
        let mut ministry = Ministry::new(MinistryId::new(), name)?.with_description(description);
        ministry.leader = leader;
        self.authorize(actor, Action::CreateMinistry, &Resource::None)?;

        self.stores.ministries.insert(ministry.clone())?;
        transition_applied("ministries.ministry.created", &ministry.id);
        Ok(ministry)
    }

    pub fn rename_ministry(
        &self,
        actor: &Subject,
        ministry_id: MinistryId,
        name: &str,
        description: &str,
    ) -> WorkflowResult<Ministry> {
        let renamed = Ministry::new(ministry_id, name)?;
        let updated = update_with(&self.stores.ministries, &ministry_id, |current| {
            self.authorize(actor, Action::UpdateMinistry, &Resource::None)?;
            Ok(Some(Ministry {
                name: renamed.name.clone(),
                description: description.to_string(),
                ..current.clone()
            }))
        })?;
        transition_applied("ministries.ministry.updated", &ministry_id);
        Ok(updated)
    }

    /// Deactivate a ministry. Records that reference it keep the id.
    pub fn deactivate_ministry(&self, actor: &Subject, ministry_id: MinistryId) -> WorkflowResult<Ministry> {
        let updated = update_with(&self.stores.ministries, &ministry_id, |current| {
            self.authorize(actor, Action::DeleteMinistry, &Resource::None)?;
            if !current.is_active {
                return Ok(None);
            }
            let mut next = current.clone();
            next.deactivate();
            Ok(Some(next))
        })?;
        transition_applied("ministries.ministry.deactivated", &ministry_id);
        Ok(updated)
    }

    /// Ministries the actor can see. Volunteers see the ones they serve in.
    pub fn visible_ministries(&self, actor: &Subject) -> WorkflowResult<Vec<Ministry>> {
        self.authorize(actor, Action::ListMinistries, &Resource::None)?;
        let scope = resolve_scope(actor);
        let ministries = self.stores.ministries.list()?;
        let visible = match scope {
            ScopeDescriptor::SelfOnly(user) => {
                let serving = self.profile_or_blank(user)?.ministries;
                ministries.into_iter().filter(|m| serving.contains(&m.id)).collect()
            }
            _ => filter_scoped(&scope, ministries),
        };
        Ok(visible)
    }

    /// Create a program run by exactly one existing ministry.
    pub fn create_program(
        &self,
        actor: &Subject,
        ministry_id: MinistryId,
        name: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        coordinator: Option<UserId>,
    ) -> WorkflowResult<Program> {
        let mut program = Program::new(ProgramId::new(), ministry_id, name, start_date, end_date)?;
        program.coordinator = coordinator;
        self.authorize(actor, Action::UpdateMinistry, &Resource::None)?;
        self.stores.ministries.require(&ministry_id)?;

        self.stores.programs.insert(program.clone())?;
        transition_applied("ministries.program.created", &program.id);
        Ok(program)
    }
}
