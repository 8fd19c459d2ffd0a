//! PostgreSQL Billing Store
//!
//! Implements `BillingDataPort` on top of [`BillingRepository`] and relays
//! the database's `LISTEN/NOTIFY` change feed to in-process subscribers.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, DataEnvironment, PostgresBillingStore};
//! use std::sync::Arc;
//!
//! let pool = create_pool(DatabaseConfig::new(url).environment(DataEnvironment::Production)).await?;
//! let store = Arc::new(PostgresBillingStore::new(pool));
//! let _listener = store.spawn_change_listener().await?;
//! let service = BillingService::new(store);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgListener;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use core_kernel::{
    AdapterHealth, ClassId, Currency, DateRange, DomainPort, FeeId, HealthCheckResult,
    HealthCheckable, Money, OperationMetadata, PaymentId, PortError, StudentId,
};
use domain_billing::ports::CHANGE_FEED_CAPACITY;
use domain_billing::{
    BillingDataPort, ChangeEvent, Class, Collection, DisciplineScope, Fee, FeeScope, FeeType,
    Payment, SessionType, Student,
};

use crate::error::DatabaseError;
use crate::repositories::billing::{BillingRepository, ClassRow, FeeRow, PaymentRow, StudentRow};

/// Channel the migration triggers notify on; the payload is the table name
pub const CHANGE_CHANNEL: &str = "billing_changes";

const ADAPTER_ID: &str = "postgres-billing-store";

/// PostgreSQL-backed implementation of the BillingDataPort trait
#[derive(Debug, Clone)]
pub struct PostgresBillingStore {
    repository: BillingRepository,
    changes: broadcast::Sender<ChangeEvent>,
}

impl PostgresBillingStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            repository: BillingRepository::new(pool),
            changes,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &BillingRepository {
        &self.repository
    }

    /// Starts relaying database notifications to subscribers
    ///
    /// The task runs until aborted. Lost connections are re-established by
    /// the listener; failures in between are logged and retried after a pause.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::ListenerFailed` if the initial LISTEN fails
    pub async fn spawn_change_listener(&self) -> Result<JoinHandle<()>, DatabaseError> {
        let mut listener = PgListener::connect_with(self.repository.pool())
            .await
            .map_err(|e| DatabaseError::ListenerFailed(e.to_string()))?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(|e| DatabaseError::ListenerFailed(e.to_string()))?;
        info!(channel = CHANGE_CHANNEL, "Listening for billing changes");

        let changes = self.changes.clone();
        Ok(tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => match Collection::from_name(notification.payload()) {
                        Some(collection) => {
                            debug!(collection = collection.as_str(), "Change notification received");
                            // No subscribers is fine
                            let _ = changes.send(ChangeEvent { collection });
                        }
                        None => warn!(payload = notification.payload(), "Ignoring unknown change payload"),
                    },
                    Err(e) => {
                        warn!(error = %e, "Change listener error; retrying");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }))
    }
}

impl DomainPort for PostgresBillingStore {}

#[async_trait]
impl HealthCheckable for PostgresBillingStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = self.repository.ping().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(()) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };
        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl BillingDataPort for PostgresBillingStore {
    #[instrument(skip(self, metadata), fields(operation = metadata.as_ref().map(tracing::field::display)))]
    async fn list_students(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Student>, PortError> {
        let rows = self.repository.list_students().await?;
        debug!(count = rows.len(), "Fetched students");
        rows.into_iter()
            .map(|row| Student::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, metadata), fields(student_id = %id, operation = metadata.as_ref().map(tracing::field::display)))]
    async fn get_student(
        &self,
        id: StudentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Student>, PortError> {
        let row = self.repository.get_student(id.into()).await?;
        Ok(row.map(Student::try_from).transpose()?)
    }

    #[instrument(skip(self, metadata), fields(operation = metadata.as_ref().map(tracing::field::display)))]
    async fn list_classes(
        &self,
        filter: Option<DateRange>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Class>, PortError> {
        let bounds = filter.map(|r| (r.starts_at(), r.ends_at()));
        let rows = self.repository.list_classes(bounds).await?;
        debug!(count = rows.len(), "Fetched classes");
        rows.into_iter()
            .map(|row| Class::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, metadata), fields(operation = metadata.as_ref().map(tracing::field::display)))]
    async fn list_fees(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Fee>, PortError> {
        let rows = self.repository.list_fees().await?;
        debug!(count = rows.len(), "Fetched fees");
        rows.into_iter()
            .map(|row| Fee::try_from(row).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, metadata), fields(operation = metadata.as_ref().map(tracing::field::display)))]
    async fn list_payments(
        &self,
        filter: Option<DateRange>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Payment>, PortError> {
        let bounds = filter.map(|r| (r.starts_at(), r.ends_at()));
        let rows = self.repository.list_payments(bounds).await?;
        debug!(count = rows.len(), "Fetched payments");
        rows.into_iter()
            .map(|row| Payment::try_from(row).map_err(PortError::from))
            .collect()
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

// ============================================================================
// Row conversions
// ============================================================================

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    code.parse::<Currency>()
        .map_err(|e| DatabaseError::InvalidValue(e.to_string()))
}

fn parse_money(amount: rust_decimal::Decimal, currency: &str) -> Result<Money, DatabaseError> {
    Money::non_negative(amount, parse_currency(currency)?)
        .map_err(|e| DatabaseError::InvalidValue(e.to_string()))
}

fn parse_session_type(value: &str) -> Result<SessionType, DatabaseError> {
    value
        .parse::<SessionType>()
        .map_err(|e| DatabaseError::InvalidValue(e.to_string()))
}

impl TryFrom<StudentRow> for Student {
    type Error = DatabaseError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        Ok(Student {
            id: StudentId::from(row.student_id),
            currency: parse_currency(&row.currency)?,
            name: row.name,
            email: row.email,
            deleted: row.deleted,
        })
    }
}

impl TryFrom<ClassRow> for Class {
    type Error = DatabaseError;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        Ok(Class {
            id: ClassId::from(row.class_id),
            session_type: parse_session_type(&row.session_type)?,
            title: row.title,
            discipline: row.discipline,
            scheduled_at: row.scheduled_at,
            student_ids: row.student_ids.into_iter().map(StudentId::from).collect(),
            deleted: row.deleted,
        })
    }
}

impl TryFrom<FeeRow> for Fee {
    type Error = DatabaseError;

    fn try_from(row: FeeRow) -> Result<Self, Self::Error> {
        Ok(Fee {
            id: FeeId::from(row.fee_id),
            scope: FeeScope::from_stored(row.student_id.map(StudentId::from)),
            discipline: DisciplineScope::from_stored(row.discipline.as_deref()),
            session_type: parse_session_type(&row.session_type)?,
            fee_type: row
                .fee_type
                .parse::<FeeType>()
                .map_err(|e| DatabaseError::InvalidValue(e.to_string()))?,
            amount: parse_money(row.amount, &row.currency)?,
            effective_at: row.effective_at,
            deleted: row.deleted,
        })
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from(row.payment_id),
            student_id: StudentId::from(row.student_id),
            amount: parse_money(row.amount, &row.currency)?,
            transaction_at: row.transaction_at,
            method: row.method,
            notes: row.notes,
            deleted: row.deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn fee_row(student_id: Option<Uuid>, discipline: Option<&str>) -> FeeRow {
        FeeRow {
            fee_id: Uuid::new_v4(),
            student_id,
            discipline: discipline.map(str::to_string),
            session_type: "1-1".to_string(),
            fee_type: "hourly".to_string(),
            amount: dec!(45.00),
            currency: "GBP".to_string(),
            effective_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            deleted: false,
        }
    }

    #[test]
    fn test_fee_row_wildcards() {
        let fee = Fee::try_from(fee_row(None, Some(""))).unwrap();
        assert_eq!(fee.scope, FeeScope::Global);
        assert_eq!(fee.discipline, DisciplineScope::Any);

        let fee = Fee::try_from(fee_row(None, None)).unwrap();
        assert_eq!(fee.discipline, DisciplineScope::Any);
    }

    #[test]
    fn test_fee_row_specific_scopes() {
        let student = Uuid::new_v4();
        let fee = Fee::try_from(fee_row(Some(student), Some("violin"))).unwrap();
        assert_eq!(fee.scope, FeeScope::ForStudent(StudentId::from(student)));
        assert_eq!(fee.discipline, DisciplineScope::Specific("violin".to_string()));
        assert_eq!(fee.amount.currency(), Currency::GBP);
    }

    #[test]
    fn test_unknown_fee_type_is_rejected() {
        let mut row = fee_row(None, None);
        row.fee_type = "monthly".to_string();
        assert!(matches!(Fee::try_from(row), Err(DatabaseError::InvalidValue(_))));
    }

    #[test]
    fn test_negative_payment_amount_is_rejected() {
        let row = PaymentRow {
            payment_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            amount: dec!(-5),
            currency: "USD".to_string(),
            transaction_at: Utc::now(),
            method: "cash".to_string(),
            notes: None,
            deleted: false,
        };
        assert!(Payment::try_from(row).is_err());
    }

    #[test]
    fn test_class_row_conversion() {
        let enrolled = Uuid::new_v4();
        let row = ClassRow {
            class_id: Uuid::new_v4(),
            title: "Ensemble".to_string(),
            discipline: "violin".to_string(),
            session_type: "group".to_string(),
            scheduled_at: Utc::now(),
            student_ids: vec![enrolled],
            deleted: true,
        };

        let class = Class::try_from(row).unwrap();
        assert_eq!(class.session_type, SessionType::Group);
        assert!(class.enrolls(StudentId::from(enrolled)));
        assert!(!class.is_active());
    }

    #[test]
    fn test_student_row_with_unsupported_currency() {
        let row = StudentRow {
            student_id: Uuid::new_v4(),
            name: "Kai".to_string(),
            email: "kai@example.com".to_string(),
            currency: "JPY".to_string(),
            deleted: false,
        };
        let error = PortError::from(Student::try_from(row).unwrap_err());
        assert!(matches!(error, PortError::Transformation { .. }));
    }
}
