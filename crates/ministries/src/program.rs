use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ccvms_core::{DomainError, DomainResult, Entity, MinistryId, ProgramId, UserId};

/// A recurring program run by exactly one ministry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub ministry: MinistryId,
    pub coordinator: Option<UserId>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl Program {
    pub fn new(
        id: ProgramId,
        ministry: MinistryId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("program name cannot be empty"));
        }
        if let Some(end) = end_date {
            if end < start_date {
                return Err(DomainError::validation("program ends before it starts"));
            }
        }
        Ok(Self {
            id,
            name,
            ministry,
            coordinator: None,
            start_date,
            end_date,
            is_active: true,
        })
    }

    /// Whether the program runs on `date`.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.is_active && date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }
}

impl Entity for Program {
    type Id = ProgramId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
