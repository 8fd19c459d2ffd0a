//! Billing repository implementation
//!
//! Raw access to the four tutoring collections. Rows are returned exactly as
//! stored, soft-deleted ones included; mapping to domain types happens in
//! the adapter.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository over the students, classes, fees and payments tables
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Lists every student in creation order
    pub async fn list_students(&self) -> Result<Vec<StudentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT student_id, name, email, currency, deleted
            FROM students
            ORDER BY created_at, student_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Retrieves a single student by ID, if present
    pub async fn get_student(&self, student_id: Uuid) -> Result<Option<StudentRow>, DatabaseError> {
        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT student_id, name, email, currency, deleted
            FROM students
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Lists classes, restricted to `[from, to]` when both bounds are given
    pub async fn list_classes(
        &self,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<ClassRow>, DatabaseError> {
        let (from, to) = split_bounds(bounds);
        let rows = sqlx::query_as::<_, ClassRow>(
            r#"
            SELECT class_id, title, discipline, session_type, scheduled_at, student_ids, deleted
            FROM classes
            WHERE ($1::timestamptz IS NULL OR scheduled_at >= $1)
              AND ($2::timestamptz IS NULL OR scheduled_at <= $2)
            ORDER BY created_at, class_id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Lists every fee; fees are never date-filtered
    pub async fn list_fees(&self) -> Result<Vec<FeeRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, FeeRow>(
            r#"
            SELECT fee_id, student_id, discipline, session_type, fee_type,
                   amount, currency, effective_at, deleted
            FROM fees
            ORDER BY created_at, fee_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Lists payments, restricted to `[from, to]` when both bounds are given
    pub async fn list_payments(
        &self,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let (from, to) = split_bounds(bounds);
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT payment_id, student_id, amount, currency, transaction_at,
                   method, notes, deleted
            FROM payments
            WHERE ($1::timestamptz IS NULL OR transaction_at >= $1)
              AND ($2::timestamptz IS NULL OR transaction_at <= $2)
            ORDER BY created_at, payment_id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Round-trips a trivial query
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

fn split_bounds(
    bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match bounds {
        Some((from, to)) => (Some(from), Some(to)),
        None => (None, None),
    }
}

/// Database row for students
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentRow {
    pub student_id: Uuid,
    pub name: String,
    pub email: String,
    pub currency: String,
    pub deleted: bool,
}

/// Database row for classes
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassRow {
    pub class_id: Uuid,
    pub title: String,
    pub discipline: String,
    pub session_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub student_ids: Vec<Uuid>,
    pub deleted: bool,
}

/// Database row for fees
///
/// `student_id` and `discipline` are nullable; NULL (or a blank discipline)
/// is the wildcard.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeeRow {
    pub fee_id: Uuid,
    pub student_id: Option<Uuid>,
    pub discipline: Option<String>,
    pub session_type: String,
    pub fee_type: String,
    pub amount: Decimal,
    pub currency: String,
    pub effective_at: DateTime<Utc>,
    pub deleted: bool,
}

/// Database row for payments
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub student_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_at: DateTime<Utc>,
    pub method: String,
    pub notes: Option<String>,
    pub deleted: bool,
}
