//! Billing summary
//!
//! Aggregates what each student was charged and paid over a date range, plus
//! the teacher-wide totals.

use icu_collator::{Collator, CollatorOptions};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use core_kernel::{Currency, DateRange, StudentId};

use crate::class::Class;
use crate::fee::Fee;
use crate::payment::Payment;
use crate::resolution::{charge_for, resolve_fee_for_student};
use crate::student::Student;

/// One student's line in the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentBillingRow {
    pub student_id: StudentId,
    pub student_name: String,
    pub currency: Currency,
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    /// `total_billed - total_paid`; positive means the student owes money
    pub balance: Decimal,
    /// Set when at least one class had no fee in effect
    pub has_billing_issues: bool,
}

/// Billing totals for a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub range: DateRange,
    pub total_accrued: Decimal,
    pub total_realized: Decimal,
    pub total_outstanding: Decimal,
    /// Sorted by student name in roster order (see [`NameCollation`])
    pub students: Vec<StudentBillingRow>,
}

impl BillingSummary {
    /// Rows that need a fee schedule added
    pub fn students_with_issues(&self) -> impl Iterator<Item = &StudentBillingRow> {
        self.students.iter().filter(|row| row.has_billing_issues)
    }
}

/// Roster ordering for student names
///
/// Uses the Unicode root collation, so "bob" sorts before "Émile" and both
/// before "Zed". Without collation data it falls back to comparing
/// lowercased names.
pub struct NameCollation {
    collator: Option<Collator>,
}

impl NameCollation {
    pub fn new() -> Self {
        let collator = Collator::try_new(&Default::default(), CollatorOptions::new())
            .map_err(|e| tracing::warn!(error = ?e, "Collation data unavailable; ordering names by lowercase"))
            .ok();
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl Default for NameCollation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NameCollation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameCollation")
            .field("collator", &self.collator.is_some())
            .finish()
    }
}

struct Accumulator<'a> {
    student: &'a Student,
    total_billed: Decimal,
    total_paid: Decimal,
    has_billing_issues: bool,
}

/// Computes the billing summary for a date range
///
/// Only students with a class or a payment in the range appear. Soft-deleted
/// records of any kind are ignored. Students referenced by classes or
/// payments but missing from (or deleted in) the roster are left out.
pub fn compute_billing_summary(
    range: &DateRange,
    students: &[Student],
    classes: &[Class],
    fees: &[Fee],
    payments: &[Payment],
) -> BillingSummary {
    let classes: Vec<&Class> = classes
        .iter()
        .filter(|c| c.is_active() && range.contains(c.scheduled_at))
        .collect();
    let payments: Vec<&Payment> = payments
        .iter()
        .filter(|p| p.is_active() && range.contains(p.transaction_at))
        .collect();
    let fees: Vec<&Fee> = fees.iter().filter(|f| f.is_active()).collect();

    let roster: HashMap<StudentId, &Student> = students
        .iter()
        .filter(|s| s.is_active())
        .map(|s| (s.id, s))
        .collect();

    let mut accumulators: HashMap<StudentId, Accumulator<'_>> = HashMap::new();
    let involved = classes
        .iter()
        .flat_map(|c| c.student_ids.iter().copied())
        .chain(payments.iter().map(|p| p.student_id));
    for student_id in involved {
        if accumulators.contains_key(&student_id) {
            continue;
        }
        match roster.get(&student_id) {
            Some(&student) => {
                accumulators.insert(
                    student_id,
                    Accumulator {
                        student,
                        total_billed: Decimal::ZERO,
                        total_paid: Decimal::ZERO,
                        has_billing_issues: false,
                    },
                );
            }
            None => {
                tracing::warn!(%student_id, "Skipping billing records for unknown or deleted student");
            }
        }
    }

    for class in &classes {
        for student_id in &class.student_ids {
            let Some(acc) = accumulators.get_mut(student_id) else {
                continue;
            };
            let fee = resolve_fee_for_student(class, *student_id, &fees);
            match fee {
                Some(fee) => warn_on_currency_mismatch(acc.student, fee.amount.currency(), "fee"),
                None => {
                    tracing::warn!(
                        class_id = %class.id,
                        %student_id,
                        discipline = %class.discipline,
                        "Class has no fee in effect; flagging billing issue"
                    );
                    acc.has_billing_issues = true;
                }
            }
            acc.total_billed += charge_for(fee);
        }
    }

    for payment in &payments {
        if let Some(acc) = accumulators.get_mut(&payment.student_id) {
            warn_on_currency_mismatch(acc.student, payment.amount.currency(), "payment");
            acc.total_paid += payment.amount.amount();
        }
    }

    let mut rows: Vec<StudentBillingRow> = accumulators
        .into_values()
        .map(|acc| StudentBillingRow {
            student_id: acc.student.id,
            student_name: acc.student.name.clone(),
            currency: acc.student.currency,
            total_billed: acc.total_billed,
            total_paid: acc.total_paid,
            balance: acc.total_billed - acc.total_paid,
            has_billing_issues: acc.has_billing_issues,
        })
        .collect();
    let names = NameCollation::new();
    rows.sort_by(|a, b| {
        names
            .compare(&a.student_name, &b.student_name)
            .then_with(|| a.student_name.cmp(&b.student_name))
            .then_with(|| a.student_id.cmp(&b.student_id))
    });

    let total_accrued: Decimal = rows.iter().map(|r| r.total_billed).sum();
    let total_realized: Decimal = rows.iter().map(|r| r.total_paid).sum();

    tracing::debug!(
        start = %range.start,
        end = %range.end,
        classes = classes.len(),
        payments = payments.len(),
        students = rows.len(),
        "Computed billing summary"
    );

    BillingSummary {
        range: range.clone(),
        total_accrued,
        total_realized,
        total_outstanding: total_accrued - total_realized,
        students: rows,
    }
}

// Amounts are summed as recorded; a mismatch is a data-entry problem worth surfacing in logs.
fn warn_on_currency_mismatch(student: &Student, currency: Currency, source: &str) {
    if student.currency != currency {
        tracing::warn!(
            student_id = %student.id,
            student_currency = %student.currency,
            record_currency = %currency,
            source,
            "Record currency differs from student currency"
        );
    }
}
