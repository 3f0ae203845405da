use core::str::FromStr;

use serde::{Deserialize, Serialize};

use ccvms_core::DomainError;

/// The four-tier role hierarchy.
///
/// Roles are a closed set; unknown role names are rejected at parse time so
/// that policy evaluation only ever sees valid values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Priest,
    Coordinator,
    Volunteer,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::Priest,
        Role::Coordinator,
        Role::Volunteer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Priest => "priest",
            Role::Coordinator => "coordinator",
            Role::Volunteer => "volunteer",
        }
    }

    /// Whether `assigned_ministry` carries scoping meaning for this role.
    pub fn is_ministry_bound(&self) -> bool {
        matches!(self, Role::Priest | Role::Coordinator)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "administrator" => Ok(Role::Administrator),
            "priest" => Ok(Role::Priest),
            "coordinator" => Ok(Role::Coordinator),
            "volunteer" => Ok(Role::Volunteer),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles_case_insensitively() {
        assert_eq!("Priest".parse::<Role>().unwrap(), Role::Priest);
        assert_eq!(" volunteer ".parse::<Role>().unwrap(), Role::Volunteer);
    }

    #[test]
    fn rejects_unknown_role() {
        let err = "bishop".parse::<Role>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn only_priest_and_coordinator_are_ministry_bound() {
        let bound: Vec<Role> = Role::ALL.into_iter().filter(Role::is_ministry_bound).collect();
        assert_eq!(bound, vec![Role::Priest, Role::Coordinator]);
    }
}
