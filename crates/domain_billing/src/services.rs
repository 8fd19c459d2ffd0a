//! Billing domain services
//!
//! [`BillingService`] fetches the collections a report needs through the
//! data port and runs the pure resolver over them. It holds no state of its
//! own beyond the port handle, so one instance can serve concurrent requests.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use core_kernel::{DateRange, HealthCheckResult, OperationMetadata, StudentId};

use crate::error::BillingError;
use crate::ports::BillingDataPort;
use crate::statement::{compute_statement, Statement};
use crate::summary::{compute_billing_summary, BillingSummary};

/// Buffer of the channel returned by [`BillingService::watch_summary`]
const WATCH_BUFFER: usize = 8;

/// Service producing billing reports from a data port
#[derive(Clone)]
pub struct BillingService {
    port: Arc<dyn BillingDataPort>,
}

impl std::fmt::Debug for BillingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingService").finish_non_exhaustive()
    }
}

impl BillingService {
    /// Creates a service backed by the given port
    pub fn new(port: Arc<dyn BillingDataPort>) -> Self {
        Self { port }
    }

    /// Returns the underlying port
    pub fn port(&self) -> &Arc<dyn BillingDataPort> {
        &self.port
    }

    /// Computes the billing summary for a date range
    ///
    /// # Errors
    ///
    /// - `BillingError::InvalidDateRange` if the range is reversed; no data is fetched
    /// - `BillingError::DataStore` if any collection cannot be loaded
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let range = DateRange::new(june_1, june_30)?;
    /// let summary = service.billing_summary(range).await?;
    /// for row in summary.students_with_issues() {
    ///     println!("{} has classes without a fee", row.student_name);
    /// }
    /// ```
    pub async fn billing_summary(&self, range: DateRange) -> Result<BillingSummary, BillingError> {
        let range = validate(range)?;
        let metadata = || Some(OperationMetadata::default().with_context("report", "billing_summary"));

        let students = self.port.list_students(metadata()).await?;
        let classes = self.port.list_classes(Some(range.clone()), metadata()).await?;
        let fees = self.port.list_fees(metadata()).await?;
        let payments = self.port.list_payments(Some(range.clone()), metadata()).await?;

        Ok(compute_billing_summary(&range, &students, &classes, &fees, &payments))
    }

    /// Computes one student's statement for a date range
    ///
    /// # Errors
    ///
    /// - `BillingError::InvalidDateRange` if the range is reversed; no data is fetched
    /// - `BillingError::StudentNotFound` if the student is unknown or deleted
    /// - `BillingError::DataStore` if any collection cannot be loaded
    pub async fn statement(
        &self,
        student_id: StudentId,
        range: DateRange,
    ) -> Result<Statement, BillingError> {
        let range = validate(range)?;
        let metadata = || {
            Some(
                OperationMetadata::default()
                    .with_context("report", "statement")
                    .with_context("student_id", student_id.to_string()),
            )
        };

        let student = self.port.get_student(student_id, metadata()).await?;
        if student.as_ref().map_or(true, |s| !s.is_active()) {
            return Err(BillingError::StudentNotFound(student_id));
        }

        let classes = self.port.list_classes(Some(range.clone()), metadata()).await?;
        let fees = self.port.list_fees(metadata()).await?;
        let payments = self.port.list_payments(Some(range.clone()), metadata()).await?;

        compute_statement(student_id, &range, student.as_ref(), &classes, &fees, &payments)
    }

    /// Streams a fresh summary now and after every data change
    ///
    /// The first message is computed immediately. The background task stops
    /// when the receiver is dropped or the change feed closes. A lagged
    /// subscription triggers a single recompute rather than one per missed event.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidDateRange` before spawning anything if the
    /// range is reversed.
    pub fn watch_summary(
        &self,
        range: DateRange,
    ) -> Result<mpsc::Receiver<Result<BillingSummary, BillingError>>, BillingError> {
        let range = validate(range)?;
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);
        let mut changes = self.port.subscribe();
        let service = self.clone();

        tokio::spawn(async move {
            loop {
                let summary = service.billing_summary(range.clone()).await;
                if tx.send(summary).await.is_err() {
                    tracing::debug!("Summary watcher dropped; stopping");
                    return;
                }

                tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!("Summary watcher dropped; stopping");
                        return;
                    }
                    event = changes.recv() => match event {
                        Ok(event) => {
                            tracing::debug!(collection = event.collection.as_str(), "Recomputing summary after change");
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Summary watcher lagged behind change feed");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Change feed closed; stopping summary watcher");
                            return;
                        }
                    },
                }
            }
        });

        Ok(rx)
    }

    /// Reports the health of the underlying data port
    pub async fn health(&self) -> HealthCheckResult {
        self.port.health_check().await
    }
}

// DateRange fields are public and deserializable, so re-check the ordering here.
fn validate(range: DateRange) -> Result<DateRange, BillingError> {
    Ok(DateRange::with_timezone(range.start, range.end, range.timezone)?)
}
