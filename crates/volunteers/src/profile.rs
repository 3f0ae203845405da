use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ccvms_core::{Entity, MinistryId, UserId, VolunteerId};

/// Volunteer-specific record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerProfile {
    pub id: VolunteerId,
    pub user_id: UserId,
    pub ministries: BTreeSet<MinistryId>,
    pub skills: String,
    pub interests: String,
    pub availability: String,
    pub is_active: bool,
}

impl VolunteerProfile {
    pub fn new(id: VolunteerId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            ministries: BTreeSet::new(),
            skills: String::new(),
            interests: String::new(),
            availability: String::new(),
            is_active: true,
        }
    }

    pub fn with_ministries(mut self, ministries: impl IntoIterator<Item = MinistryId>) -> Self {
        self.ministries.extend(ministries);
        self
    }

    pub fn serves_in(&self, ministry: MinistryId) -> bool {
        self.ministries.contains(&ministry)
    }

    /// Whether the profile shares a ministry with an optional scoping ministry.
    ///
    /// `None` never intersects.
    pub fn intersects(&self, ministry: Option<MinistryId>) -> bool {
        ministry.is_some_and(|m| self.serves_in(m))
    }

    /// Returns `true` if the membership was newly added.
    pub fn join(&mut self, ministry: MinistryId) -> bool {
        self.ministries.insert(ministry)
    }

    pub fn leave(&mut self, ministry: MinistryId) -> bool {
        self.ministries.remove(&ministry)
    }
}

impl Entity for VolunteerProfile {
    type Id = VolunteerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
