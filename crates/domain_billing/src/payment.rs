//! Received payments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PaymentId, StudentId};

/// A payment received from a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub student_id: StudentId,
    pub amount: Money,
    pub transaction_at: DateTime<Utc>,
    /// Free text, e.g. "bank transfer" or "cash"
    pub method: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl Payment {
    pub fn new(
        student_id: StudentId,
        amount: Money,
        transaction_at: DateTime<Utc>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            id: PaymentId::new_v7(),
            student_id,
            amount,
            transaction_at,
            method: method.into(),
            notes: None,
            deleted: false,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_active(&self) -> bool {
        !self.deleted
    }
}
