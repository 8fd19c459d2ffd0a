//! Fee schedules
//!
//! A fee is a rate that applies from its effective date onwards. Who it
//! applies to and for which discipline are tagged scopes rather than
//! "empty means everyone" strings; adapters translate stored blanks into
//! the wildcard variants at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{FeeId, Money, StudentId};

use crate::class::SessionType;
use crate::error::BillingError;

/// Which students a fee applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "student_id", rename_all = "snake_case")]
pub enum FeeScope {
    /// Default rate for every student
    Global,
    /// Rate for one student only
    ForStudent(StudentId),
}

impl FeeScope {
    /// Builds a scope from an optional stored student reference
    pub fn from_stored(student_id: Option<StudentId>) -> Self {
        match student_id {
            Some(id) => FeeScope::ForStudent(id),
            None => FeeScope::Global,
        }
    }

    /// Returns true if a fee with this scope may bill the given student
    pub fn covers(&self, student_id: StudentId) -> bool {
        match self {
            FeeScope::Global => true,
            FeeScope::ForStudent(id) => *id == student_id,
        }
    }

    pub fn student_id(&self) -> Option<StudentId> {
        match self {
            FeeScope::Global => None,
            FeeScope::ForStudent(id) => Some(*id),
        }
    }
}

/// Which disciplines a fee applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "discipline", rename_all = "snake_case")]
pub enum DisciplineScope {
    /// Any discipline
    Any,
    /// Exactly this discipline (case-sensitive)
    Specific(String),
}

impl DisciplineScope {
    /// Builds a scope from a stored label; absent or blank labels are wildcards
    pub fn from_stored(discipline: Option<&str>) -> Self {
        match discipline.map(str::trim) {
            Some(label) if !label.is_empty() => DisciplineScope::Specific(label.to_string()),
            _ => DisciplineScope::Any,
        }
    }

    pub fn matches(&self, discipline: &str) -> bool {
        match self {
            DisciplineScope::Any => true,
            DisciplineScope::Specific(label) => label == discipline,
        }
    }

    pub fn is_specific(&self) -> bool {
        matches!(self, DisciplineScope::Specific(_))
    }

    /// Returns the label, or None for the wildcard
    pub fn label(&self) -> Option<&str> {
        match self {
            DisciplineScope::Any => None,
            DisciplineScope::Specific(label) => Some(label),
        }
    }
}

/// How a fee is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeType {
    /// Charged per class attended; the only type the per-class resolver uses
    Hourly,
    /// Recurring plan, recorded but not billed per class
    Subscription,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Hourly => "hourly",
            FeeType::Subscription => "subscription",
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(FeeType::Hourly),
            "subscription" => Ok(FeeType::Subscription),
            other => Err(BillingError::InvalidRecord(format!(
                "unknown fee type '{}'",
                other
            ))),
        }
    }
}

/// A billing rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub id: FeeId,
    pub scope: FeeScope,
    pub discipline: DisciplineScope,
    pub session_type: SessionType,
    pub fee_type: FeeType,
    pub amount: Money,
    /// First instant the rate is in force
    pub effective_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Fee {
    /// Creates a global, any-discipline hourly fee
    pub fn hourly(session_type: SessionType, amount: Money, effective_at: DateTime<Utc>) -> Self {
        Self {
            id: FeeId::new_v7(),
            scope: FeeScope::Global,
            discipline: DisciplineScope::Any,
            session_type,
            fee_type: FeeType::Hourly,
            amount,
            effective_at,
            deleted: false,
        }
    }

    /// Restricts the fee to one student
    pub fn for_student(mut self, student_id: StudentId) -> Self {
        self.scope = FeeScope::ForStudent(student_id);
        self
    }

    /// Restricts the fee to one discipline
    pub fn for_discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = DisciplineScope::from_stored(Some(&discipline.into()));
        self
    }

    pub fn with_fee_type(mut self, fee_type: FeeType) -> Self {
        self.fee_type = fee_type;
        self
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_discipline_is_wildcard() {
        assert_eq!(DisciplineScope::from_stored(None), DisciplineScope::Any);
        assert_eq!(DisciplineScope::from_stored(Some("")), DisciplineScope::Any);
        assert_eq!(DisciplineScope::from_stored(Some("  ")), DisciplineScope::Any);
        assert_eq!(
            DisciplineScope::from_stored(Some("violin")),
            DisciplineScope::Specific("violin".to_string())
        );
    }

    #[test]
    fn test_discipline_match_is_case_sensitive() {
        let scope = DisciplineScope::Specific("Piano".to_string());
        assert!(scope.matches("Piano"));
        assert!(!scope.matches("piano"));
        assert!(DisciplineScope::Any.matches("piano"));
    }

    #[test]
    fn test_fee_scope_covers() {
        let student = StudentId::new();
        assert!(FeeScope::Global.covers(student));
        assert!(FeeScope::ForStudent(student).covers(student));
        assert!(!FeeScope::ForStudent(StudentId::new()).covers(student));
    }
}
