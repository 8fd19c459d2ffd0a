//! Billing Domain Ports
//!
//! The billing resolver never talks to a database. Request handlers fetch
//! the four collections through [`BillingDataPort`] and hand the snapshots
//! to the pure functions in this crate.
//!
//! # Adapters
//!
//! - **PostgreSQL**: `infra_db::PostgresBillingStore`
//! - **In-memory**: [`mock::MockBillingPort`], for tests and local demos
//!
//! Adapters return records exactly as stored, soft-deleted ones included;
//! the resolver is the single place that filters them out.
//!
//! # Live updates
//!
//! [`BillingDataPort::subscribe`] hands out a receiver of [`ChangeEvent`]s.
//! A caller that wants live reports re-runs the resolver whenever an event
//! arrives; the resolver itself holds no state between calls.
//!
//! ```rust,ignore
//! let mut changes = port.subscribe();
//! while changes.recv().await.is_ok() {
//!     let summary = service.billing_summary(range.clone()).await?;
//!     publish(summary);
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use core_kernel::{
    DateRange, DomainPort, HealthCheckable, OperationMetadata, PortError, StudentId,
};

use crate::class::Class;
use crate::fee::Fee;
use crate::payment::Payment;
use crate::student::Student;

/// Capacity of change-feed channels; slow subscribers see `Lagged` and should refetch
pub const CHANGE_FEED_CAPACITY: usize = 256;

/// The collection a change touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Students,
    Classes,
    Fees,
    Payments,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Classes => "classes",
            Collection::Fees => "fees",
            Collection::Payments => "payments",
        }
    }

    /// Parses a collection (table) name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "students" => Some(Collection::Students),
            "classes" => Some(Collection::Classes),
            "fees" => Some(Collection::Fees),
            "payments" => Some(Collection::Payments),
            _ => None,
        }
    }
}

/// Notification that a collection changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
}

/// Data store operations the billing reports depend on
#[async_trait]
pub trait BillingDataPort: DomainPort + HealthCheckable {
    /// Lists every student on the roster
    async fn list_students(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Student>, PortError>;

    /// Retrieves one student, or None if no such record exists
    async fn get_student(
        &self,
        id: StudentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Student>, PortError>;

    /// Lists classes, optionally only those scheduled within the range
    async fn list_classes(
        &self,
        filter: Option<DateRange>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Class>, PortError>;

    /// Lists every fee; fees are never date-filtered
    async fn list_fees(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Fee>, PortError>;

    /// Lists payments, optionally only those made within the range
    async fn list_payments(
        &self,
        filter: Option<DateRange>,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Payment>, PortError>;

    /// Subscribes to change notifications
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Mock implementation of BillingDataPort for testing
///
/// Stores records in insertion order so that repeated reads are stable.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, ClassId, FeeId, HealthCheckResult, PaymentId};

    /// In-memory mock implementation of BillingDataPort
    #[derive(Debug)]
    pub struct MockBillingPort {
        students: RwLock<Vec<Student>>,
        classes: RwLock<Vec<Class>>,
        fees: RwLock<Vec<Fee>>,
        payments: RwLock<Vec<Payment>>,
        unavailable: AtomicBool,
        changes: broadcast::Sender<ChangeEvent>,
        operations: RwLock<Vec<OperationMetadata>>,
    }

    impl Default for MockBillingPort {
        fn default() -> Self {
            let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
            Self {
                students: RwLock::default(),
                classes: RwLock::default(),
                fees: RwLock::default(),
                payments: RwLock::default(),
                unavailable: AtomicBool::new(false),
                changes,
                operations: RwLock::default(),
            }
        }
    }

    fn upsert<T>(records: &mut Vec<T>, record: T, same: impl Fn(&T) -> bool) {
        match records.iter_mut().find(|r| same(r)) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    impl MockBillingPort {
        /// Creates an empty mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a mock port pre-populated with the given collections
        pub async fn with_data(
            students: Vec<Student>,
            classes: Vec<Class>,
            fees: Vec<Fee>,
            payments: Vec<Payment>,
        ) -> Self {
            let port = Self::new();
            *port.students.write().await = students;
            *port.classes.write().await = classes;
            *port.fees.write().await = fees;
            *port.payments.write().await = payments;
            port
        }

        /// Makes every read fail as if the backend were down
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub async fn upsert_student(&self, student: Student) {
            let id = student.id;
            upsert(&mut *self.students.write().await, student, |s| s.id == id);
            self.notify(Collection::Students);
        }

        pub async fn upsert_class(&self, class: Class) {
            let id = class.id;
            upsert(&mut *self.classes.write().await, class, |c| c.id == id);
            self.notify(Collection::Classes);
        }

        pub async fn upsert_fee(&self, fee: Fee) {
            let id = fee.id;
            upsert(&mut *self.fees.write().await, fee, |f| f.id == id);
            self.notify(Collection::Fees);
        }

        pub async fn upsert_payment(&self, payment: Payment) {
            let id = payment.id;
            upsert(&mut *self.payments.write().await, payment, |p| p.id == id);
            self.notify(Collection::Payments);
        }

        /// Flags a class as deleted; returns false if it does not exist
        pub async fn soft_delete_class(&self, id: ClassId) -> bool {
            let mut classes = self.classes.write().await;
            let Some(record) = classes.iter_mut().find(|c| c.id == id) else {
                return false;
            };
            record.deleted = true;
            drop(classes);

            self.notify(Collection::Classes);
            true
        }

        /// Flags a fee as deleted; returns false if it does not exist
        pub async fn soft_delete_fee(&self, id: FeeId) -> bool {
            let mut fees = self.fees.write().await;
            let Some(record) = fees.iter_mut().find(|f| f.id == id) else {
                return false;
            };
            record.deleted = true;
            drop(fees);

            self.notify(Collection::Fees);
            true
        }

        /// Flags a payment as deleted; returns false if it does not exist
        pub async fn soft_delete_payment(&self, id: PaymentId) -> bool {
            let mut payments = self.payments.write().await;
            let Some(record) = payments.iter_mut().find(|p| p.id == id) else {
                return false;
            };
            record.deleted = true;
            drop(payments);

            self.notify(Collection::Payments);
            true
        }

        /// Metadata of every read served so far, oldest first
        pub async fn recorded_operations(&self) -> Vec<OperationMetadata> {
            self.operations.read().await.clone()
        }

        async fn record(&self, metadata: Option<OperationMetadata>) {
            if let Some(metadata) = metadata {
                self.operations.write().await.push(metadata);
            }
        }

        fn notify(&self, collection: Collection) {
            // No receivers is fine
            let _ = self.changes.send(ChangeEvent { collection });
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(PortError::service_unavailable("mock-billing-port"));
            }
            Ok(())
        }
    }

    impl DomainPort for MockBillingPort {}

    #[async_trait]
    impl HealthCheckable for MockBillingPort {
        async fn health_check(&self) -> HealthCheckResult {
            let (status, message) = if self.unavailable.load(Ordering::SeqCst) {
                (AdapterHealth::Unhealthy, "Mock adapter marked unavailable")
            } else {
                (AdapterHealth::Healthy, "Mock adapter always healthy")
            };
            HealthCheckResult {
                adapter_id: "mock-billing-port".to_string(),
                status,
                latency_ms: 0,
                message: Some(message.to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl BillingDataPort for MockBillingPort {
        async fn list_students(
            &self,
            metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Student>, PortError> {
            self.record(metadata).await;
            self.check_available()?;
            Ok(self.students.read().await.clone())
        }

        async fn get_student(
            &self,
            id: StudentId,
            metadata: Option<OperationMetadata>,
        ) -> Result<Option<Student>, PortError> {
            self.record(metadata).await;
            self.check_available()?;
            Ok(self.students.read().await.iter().find(|s| s.id == id).cloned())
        }

        async fn list_classes(
            &self,
            filter: Option<DateRange>,
            metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Class>, PortError> {
            self.record(metadata).await;
            self.check_available()?;
            Ok(self
                .classes
                .read()
                .await
                .iter()
                .filter(|c| filter.as_ref().map_or(true, |r| r.contains(c.scheduled_at)))
                .cloned()
                .collect())
        }

        async fn list_fees(&self, metadata: Option<OperationMetadata>) -> Result<Vec<Fee>, PortError> {
            self.record(metadata).await;
            self.check_available()?;
            Ok(self.fees.read().await.clone())
        }

        async fn list_payments(
            &self,
            filter: Option<DateRange>,
            metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Payment>, PortError> {
            self.record(metadata).await;
            self.check_available()?;
            Ok(self
                .payments
                .read()
                .await
                .iter()
                .filter(|p| filter.as_ref().map_or(true, |r| r.contains(p.transaction_at)))
                .cloned()
                .collect())
        }

        fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
            self.changes.subscribe()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::MockBillingPort;
    use chrono::{NaiveDate, TimeZone, Utc};
    use core_kernel::{AdapterHealth, Currency};

    use crate::class::SessionType;

    #[tokio::test]
    async fn test_mock_port_get_student() {
        let student = Student::new("Asha", "asha@example.com", Currency::INR);
        let port = MockBillingPort::with_data(vec![student.clone()], vec![], vec![], vec![]).await;

        let found = port.get_student(student.id, None).await.unwrap();
        assert_eq!(found, Some(student));

        let missing = port.get_student(StudentId::new(), None).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_mock_port_filters_classes_by_range() {
        let june = Class::new(
            "June", "piano", SessionType::OneToOne,
            Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap(),
        );
        let july = Class::new(
            "July", "piano", SessionType::OneToOne,
            Utc.with_ymd_and_hms(2024, 7, 10, 15, 0, 0).unwrap(),
        );
        let port = MockBillingPort::with_data(vec![], vec![june.clone(), july], vec![], vec![]).await;
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
        .unwrap();

        let classes = port.list_classes(Some(range), None).await.unwrap();
        assert_eq!(classes, vec![june]);
        assert_eq!(port.list_classes(None, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_port_publishes_changes() {
        let port = MockBillingPort::new();
        let mut changes = port.subscribe();

        port.upsert_student(Student::new("Ben", "ben@example.com", Currency::GBP)).await;

        let event = changes.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Students);
    }

    #[tokio::test]
    async fn test_mock_port_unavailable() {
        let port = MockBillingPort::new();
        port.set_unavailable(true);

        let result = port.list_fees(None).await;
        assert!(matches!(result, Err(PortError::ServiceUnavailable { .. })));
        assert_eq!(port.health_check().await.status, AdapterHealth::Unhealthy);
    }

    #[tokio::test]
    async fn test_mock_port_soft_delete_flags_record_and_notifies() {
        let class = Class::new(
            "Violin", "violin", SessionType::Group,
            Utc.with_ymd_and_hms(2024, 6, 12, 17, 0, 0).unwrap(),
        );
        let port = MockBillingPort::with_data(vec![], vec![class.clone()], vec![], vec![]).await;
        let mut changes = port.subscribe();

        assert!(!port.soft_delete_class(core_kernel::ClassId::new()).await);
        assert!(changes.try_recv().is_err());

        assert!(port.soft_delete_class(class.id).await);
        assert_eq!(changes.recv().await.unwrap().collection, Collection::Classes);

        let stored = port.list_classes(None, None).await.unwrap();
        assert!(stored[0].deleted);
    }

    #[tokio::test]
    async fn test_mock_port_records_operation_metadata() {
        let port = MockBillingPort::new();
        let metadata = OperationMetadata::default().with_context("report", "billing_summary");

        port.list_fees(Some(metadata.clone())).await.unwrap();
        port.list_students(None).await.unwrap();

        assert_eq!(port.recorded_operations().await, vec![metadata]);
    }

    #[test]
    fn test_collection_names_round_trip() {
        for collection in [Collection::Students, Collection::Classes, Collection::Fees, Collection::Payments] {
            assert_eq!(Collection::from_name(collection.as_str()), Some(collection));
        }
        assert_eq!(Collection::from_name("invoices"), None);
    }
}
