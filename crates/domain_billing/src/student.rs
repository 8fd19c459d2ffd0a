//! Student records

use serde::{Deserialize, Serialize};

use core_kernel::{Currency, StudentId};

/// A student on the teacher's roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    /// Currency the student is billed in
    pub currency: Currency,
    #[serde(default)]
    pub deleted: bool,
}

impl Student {
    pub fn new(name: impl Into<String>, email: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: StudentId::new_v7(),
            name: name.into(),
            email: email.into(),
            currency,
            deleted: false,
        }
    }

    /// Returns true unless the record has been soft-deleted
    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}
