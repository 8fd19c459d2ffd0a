//! Custom Test Assertions
//!
//! Assertion helpers for billing reports that give more meaningful failure
//! messages than a plain `assert_eq!` on a whole summary.

use core_kernel::{Money, StudentId};
use domain_billing::{BillingSummary, NameCollation, Statement, StatementTotals, StudentBillingRow};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts `balance == total_billed - total_paid` for a row
pub fn assert_row_balanced(row: &StudentBillingRow) {
    assert_eq!(
        row.balance,
        row.total_billed - row.total_paid,
        "Row for {} ({}) is unbalanced: billed={}, paid={}, balance={}",
        row.student_name,
        row.student_id,
        row.total_billed,
        row.total_paid,
        row.balance
    );
}

/// Asserts that the summary totals agree with its rows and with each other
pub fn assert_summary_consistent(summary: &BillingSummary) {
    let billed: Decimal = summary.students.iter().map(|r| r.total_billed).sum();
    let paid: Decimal = summary.students.iter().map(|r| r.total_paid).sum();

    assert_eq!(summary.total_accrued, billed, "total_accrued differs from sum of rows");
    assert_eq!(summary.total_realized, paid, "total_realized differs from sum of rows");
    assert_eq!(
        summary.total_outstanding,
        summary.total_accrued - summary.total_realized,
        "total_outstanding differs from accrued - realized"
    );

    for row in &summary.students {
        assert_row_balanced(row);
    }

    let collation = NameCollation::new();
    let names: Vec<&str> = summary.students.iter().map(|r| r.student_name.as_str()).collect();
    assert!(
        names.windows(2).all(|pair| collation.compare(pair[0], pair[1]).is_le()),
        "Rows are not in roster order: {:?}",
        names
    );
}

/// Returns the summary row for a student, panicking with context if missing
pub fn row_for(summary: &BillingSummary, student_id: StudentId) -> &StudentBillingRow {
    summary
        .students
        .iter()
        .find(|r| r.student_id == student_id)
        .unwrap_or_else(|| panic!("No summary row for student {}", student_id))
}

/// Asserts that a student has no row in the summary
pub fn assert_no_row(summary: &BillingSummary, student_id: StudentId) {
    assert!(
        summary.students.iter().all(|r| r.student_id != student_id),
        "Expected no summary row for student {}",
        student_id
    );
}

/// Asserts statement items are in non-decreasing date order
pub fn assert_statement_ordered(statement: &Statement) {
    let dates: Vec<_> = statement.items.iter().map(|i| i.class.scheduled_at).collect();
    assert!(
        dates.windows(2).all(|pair| pair[0] <= pair[1]),
        "Statement items are not in date order: {:?}",
        dates
    );
}

/// Asserts the statement totals
pub fn assert_statement_totals(statement: &Statement, charges: Decimal, paid: Decimal) {
    let totals = StatementTotals::from_statement(statement);
    assert_eq!(totals.total_charges, charges, "Unexpected total charges");
    assert_eq!(totals.total_paid, paid, "Unexpected total paid");
    assert_eq!(totals.balance, charges - paid, "Unexpected balance");
}
