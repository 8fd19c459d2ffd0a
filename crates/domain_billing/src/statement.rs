//! Student statements
//!
//! A statement lists one student's classes in a date range, each with the
//! fee that priced it, alongside the payments they made. Totals are left to
//! the consumer; [`StatementTotals`] is the helper for that.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DateRange, StudentId};

use crate::class::Class;
use crate::error::BillingError;
use crate::fee::Fee;
use crate::payment::Payment;
use crate::resolution::{charge_for, resolve_fee};
use crate::student::Student;

/// One class on a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementItem {
    pub class: Class,
    /// None when no fee was in effect for the class
    pub fee: Option<Fee>,
    pub charge: Decimal,
}

impl StatementItem {
    pub fn is_unresolved(&self) -> bool {
        self.fee.is_none()
    }
}

/// A student's statement for a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub student: Student,
    pub range: DateRange,
    /// Ordered by class date
    pub items: Vec<StatementItem>,
    pub payments: Vec<Payment>,
}

/// Totals derived from a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementTotals {
    pub total_charges: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
    pub unresolved_items: usize,
}

impl StatementTotals {
    pub fn from_statement(statement: &Statement) -> Self {
        let total_charges: Decimal = statement.items.iter().map(|i| i.charge).sum();
        let total_paid: Decimal = statement.payments.iter().map(|p| p.amount.amount()).sum();

        Self {
            total_charges,
            total_paid,
            balance: total_charges - total_paid,
            unresolved_items: statement.items.iter().filter(|i| i.is_unresolved()).count(),
        }
    }
}

/// Computes a statement for one student
///
/// # Errors
///
/// Returns `BillingError::StudentNotFound` when `student` is absent, soft-deleted,
/// or does not carry `student_id`. A class with no fee is not an error; its
/// line item simply has no fee and a zero charge.
pub fn compute_statement(
    student_id: StudentId,
    range: &DateRange,
    student: Option<&Student>,
    classes: &[Class],
    fees: &[Fee],
    payments: &[Payment],
) -> Result<Statement, BillingError> {
    let student = student
        .filter(|s| s.id == student_id && s.is_active())
        .ok_or(BillingError::StudentNotFound(student_id))?;

    let fees: Vec<&Fee> = fees
        .iter()
        .filter(|f| f.is_active() && f.scope.covers(student_id))
        .collect();

    let mut items: Vec<StatementItem> = classes
        .iter()
        .filter(|c| c.is_active() && c.enrolls(student_id) && range.contains(c.scheduled_at))
        .map(|class| {
            let fee = resolve_fee(class, fees.iter().copied());
            StatementItem {
                class: class.clone(),
                fee: fee.cloned(),
                charge: charge_for(fee),
            }
        })
        .collect();
    items.sort_by_key(|item| item.class.scheduled_at);

    let payments: Vec<Payment> = payments
        .iter()
        .filter(|p| p.is_active() && p.student_id == student_id && range.contains(p.transaction_at))
        .cloned()
        .collect();

    tracing::debug!(
        %student_id,
        start = %range.start,
        end = %range.end,
        items = items.len(),
        payments = payments.len(),
        "Computed student statement"
    );

    Ok(Statement {
        student: student.clone(),
        range: range.clone(),
        items,
        payments,
    })
}
