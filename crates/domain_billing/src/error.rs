//! Billing domain errors

use thiserror::Error;

use core_kernel::{PortError, StudentId, TemporalError};

/// Errors that can occur in the billing domain
///
/// A class without a matching fee is not an error; it surfaces as a billing
/// issue on the report instead.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The requested date range is missing a bound or reversed
    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] TemporalError),

    /// Statement requested for a student that does not exist
    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    /// A stored record could not be interpreted
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The data store failed while fetching collections
    #[error("Data store error: {0}")]
    DataStore(#[from] PortError),
}

impl BillingError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::StudentNotFound(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, BillingError::InvalidDateRange(_))
    }
}
