use std::collections::BTreeSet;

use ccvms_auth::{ApprovalDecision, ApprovalStatus, Role, Subject, SubjectCommand, SubjectEvent};
use ccvms_core::{DenyReason, MinistryId, UserId, VolunteerId};
use ccvms_policy::{Action, Resource, filter_scoped, resolve_scope};
use ccvms_volunteers::VolunteerProfile;

use super::{MAX_SWAP_ATTEMPTS, WorkflowError, WorkflowResult, Workflows, transition_applied, update_with};
use crate::store::{EntityStore, StoreError, Swap};

impl Workflows {
    /// Self-service signup: a pending, inactive volunteer with a profile.
    pub fn register_volunteer(
        &self,
        user_id: UserId,
        ministries: BTreeSet<MinistryId>,
    ) -> WorkflowResult<(Subject, VolunteerProfile)> {
        for ministry in &ministries {
            self.stores.ministries.require(ministry)?;
        }

        let subject = Subject::signup_volunteer(user_id);
        let profile = VolunteerProfile::new(VolunteerId::new(), user_id).with_ministries(ministries);

        self.stores.users.insert(subject.clone())?;
        if let Err(err) = self.stores.profiles.insert(profile.clone()) {
            self.stores.users.remove(&user_id)?;
            return Err(err.into());
        }

        transition_applied("accounts.volunteer.registered", &user_id);
        Ok((subject, profile))
    }

    pub fn create_user(&self, actor: &Subject, user: Subject) -> WorkflowResult<Subject> {
        self.authorize(actor, Action::CreateUser, &Resource::None)?;
        self.stores.users.insert(user.clone())?;
        transition_applied("accounts.user.created", &user.id);
        Ok(user)
    }

    pub fn list_users(&self, actor: &Subject) -> WorkflowResult<Vec<Subject>> {
        self.authorize(actor, Action::ListUsers, &Resource::None)?;
        let mut users = self.stores.users.list()?;
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    /// Users visible to `actor`: everyone for administrators, their own
    /// ministry's staff for bound staff, themselves for volunteers.
    pub fn visible_users(&self, actor: &Subject) -> WorkflowResult<Vec<Subject>> {
        self.authorize(actor, Action::ListMembers, &Resource::None)?;
        let scope = resolve_scope(actor);
        Ok(filter_scoped(&scope, self.stores.users.list()?))
    }

    /// Approve or reject a volunteer whose status the approver saw as `seen`.
    ///
    /// The write is a compare-and-set on `seen`. If another decision landed
    /// first, the same outcome is reported as a no-op and a contradicting one
    /// as `ALREADY_DECIDED`. Re-approving a rejected volunteer therefore needs
    /// `seen == Rejected`.
    pub fn decide_approval(
        &self,
        actor: &Subject,
        user_id: UserId,
        seen: ApprovalStatus,
        decision: ApprovalDecision,
    ) -> WorkflowResult<Subject> {
        let mut snapshot = self.stores.users.require(&user_id)?;
        let profile = self.profile_or_blank(user_id)?;
        let action = match decision {
            ApprovalDecision::Approve => Action::ApproveVolunteer,
            ApprovalDecision::Reject => Action::RejectVolunteer,
        };
        self.authorize(actor, action, &Resource::Volunteer(&profile))?;

        if snapshot.approval_status != seen {
            return settled_elsewhere(snapshot, decision);
        }

        for _ in 0..MAX_SWAP_ATTEMPTS {
            let events = snapshot.handle(&SubjectCommand::Decide(decision), &self.config)?;
            if events.is_empty() {
                return Ok(snapshot);
            }

            let mut next = snapshot.clone();
            for event in &events {
                next.apply(event);
            }

            match self.stores.users.compare_and_swap(&snapshot, next.clone())? {
                Swap::Applied => {
                    for event in &events {
                        transition_applied(event.event_type(), &user_id);
                    }
                    return Ok(next);
                }
                Swap::Stale(None) => return Err(StoreError::NotFound.into()),
                Swap::Stale(Some(current)) if current.approval_status == seen => {
                    // Something other than the approval status changed; retry on fresh state.
                    snapshot = current;
                }
                Swap::Stale(Some(current)) => return settled_elsewhere(current, decision),
            }
        }
        Err(StoreError::Conflict(format!("user {user_id} kept changing during approval")).into())
    }

    pub fn toggle_suspension(&self, actor: &Subject, user_id: UserId) -> WorkflowResult<Subject> {
        self.apply_subject_command(actor, user_id, |target| {
            self.authorize(actor, Action::SuspendUser, &Resource::User(target))?;
            Ok(SubjectCommand::ToggleSuspension { actor: actor.id })
        })
    }

    pub fn delete_user(&self, actor: &Subject, user_id: UserId) -> WorkflowResult<()> {
        let target = self.stores.users.require(&user_id)?;
        self.authorize(actor, Action::DeleteUser, &Resource::User(&target))?;

        if let Some(profile) = self.stores.profile_of(user_id)? {
            self.stores.profiles.remove(&profile.id)?;
        }
        self.stores.users.remove(&user_id)?;
        transition_applied("accounts.user.deleted", &user_id);
        Ok(())
    }

    /// Change a user's role. `raw_role` is validated before any policy check.
    ///
    /// A priest promoting a volunteer also binds the new coordinator to the
    /// priest's ministry.
    pub fn assign_role(&self, actor: &Subject, user_id: UserId, raw_role: &str) -> WorkflowResult<Subject> {
        let role: Role = raw_role.parse()?;
        let profile = self.stores.profile_of(user_id)?;

        self.apply_subject_command(actor, user_id, |target| {
            self.authorize(
                actor,
                Action::AssignRole,
                &Resource::RoleChange {
                    target,
                    profile: profile.as_ref(),
                    new_role: role,
                },
            )?;
            Ok(SubjectCommand::AssignRole {
                role,
                actor_role: actor.role,
                actor_ministry: actor.managed_ministry(),
            })
        })
    }

    /// Bind (or with `None`, clear) a user's ministry.
    pub fn assign_ministry(
        &self,
        actor: &Subject,
        user_id: UserId,
        ministry: Option<MinistryId>,
    ) -> WorkflowResult<Subject> {
        if let Some(id) = &ministry {
            self.stores.ministries.require(id)?;
        }

        self.apply_subject_command(actor, user_id, |target| {
            self.authorize(actor, Action::AssignMinistry, &Resource::MinistryAssignment { target, ministry })?;
            Ok(SubjectCommand::AssignMinistry { ministry })
        })
    }

    fn apply_subject_command<F>(&self, actor: &Subject, user_id: UserId, command_for: F) -> WorkflowResult<Subject>
    where
        F: Fn(&Subject) -> WorkflowResult<SubjectCommand>,
    {
        let mut applied: Vec<SubjectEvent> = Vec::new();
        let updated = update_with(&self.stores.users, &user_id, |target| {
            let command = command_for(target)?;
            let events = target.handle(&command, &self.config)?;
            let mut next = target.clone();
            for event in &events {
                next.apply(event);
            }
            applied = events;
            Ok(Some(next))
        })?;

        for event in &applied {
            transition_applied(event.event_type(), &user_id);
        }
        tracing::trace!(actor = %actor.id, user_id = %user_id, events = applied.len(), "subject updated");
        Ok(updated)
    }

    /// The user's profile, or an empty one (no ministries) when they have none.
    pub(crate) fn profile_or_blank(&self, user_id: UserId) -> WorkflowResult<VolunteerProfile> {
        Ok(self
            .stores
            .profile_of(user_id)?
            .unwrap_or_else(|| VolunteerProfile::new(VolunteerId::default(), user_id)))
    }
}

/// Outcome when the stored status no longer matches what the approver saw.
fn settled_elsewhere(current: Subject, decision: ApprovalDecision) -> WorkflowResult<Subject> {
    if current.approval_status == decision.target_status() {
        tracing::debug!(user_id = %current.id, "concurrent identical approval decision");
        return Ok(current);
    }
    tracing::info!(
        user_id = %current.id,
        status = current.approval_status.as_str(),
        "approval already decided by a concurrent writer"
    );
    Err(WorkflowError::Denied(DenyReason::AlreadyDecided))
}
