//! Scheduled classes
//!
//! A class is one teaching session on a given date. Every enrolled student is
//! billed for it independently, at whatever fee resolves for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClassId, StudentId};

use crate::error::BillingError;

/// Format of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    /// Private lesson, normally exactly one student
    #[serde(rename = "1-1")]
    OneToOne,
    /// Group lesson
    #[serde(rename = "group")]
    Group,
}

impl SessionType {
    /// Returns the stored label
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::OneToOne => "1-1",
            SessionType::Group => "group",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1-1" => Ok(SessionType::OneToOne),
            "group" => Ok(SessionType::Group),
            other => Err(BillingError::InvalidRecord(format!(
                "unknown session type '{}'",
                other
            ))),
        }
    }
}

/// A scheduled class occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub title: String,
    /// Free-text label such as "piano" or "guitar"
    pub discipline: String,
    pub session_type: SessionType,
    pub scheduled_at: DateTime<Utc>,
    pub student_ids: Vec<StudentId>,
    #[serde(default)]
    pub deleted: bool,
}

impl Class {
    pub fn new(
        title: impl Into<String>,
        discipline: impl Into<String>,
        session_type: SessionType,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ClassId::new_v7(),
            title: title.into(),
            discipline: discipline.into(),
            session_type,
            scheduled_at,
            student_ids: Vec::new(),
            deleted: false,
        }
    }

    /// Enrolls a student
    pub fn with_student(mut self, student_id: StudentId) -> Self {
        if !self.student_ids.contains(&student_id) {
            self.student_ids.push(student_id);
        }
        self
    }

    pub fn enrolls(&self, student_id: StudentId) -> bool {
        self.student_ids.contains(&student_id)
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}
