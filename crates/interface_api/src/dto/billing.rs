//! Billing DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{Currency, DateRange, Money, Timezone};
use domain_billing::{
    BillingError, BillingSummary, Payment, Statement, StatementItem, StatementTotals,
    StudentBillingRow,
};

/// Query string shared by both reports: `?from=YYYY-MM-DD&to=YYYY-MM-DD[&tz=Area/City]`
///
/// Bounds stay raw strings here so a malformed day is reported through
/// [`crate::error::ApiError`] rather than the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub tz: Option<String>,
}

impl ReportQuery {
    /// Builds the report range, falling back to the configured time zone
    pub fn into_range(self, default_timezone: Timezone) -> Result<DateRange, BillingError> {
        let timezone = match self.tz.as_deref() {
            Some(name) => name.parse::<Timezone>()?,
            None => default_timezone,
        };
        let from = self
            .from
            .as_deref()
            .map(|value| DateRange::parse_bound("from", value))
            .transpose()?;
        let to = self
            .to
            .as_deref()
            .map(|value| DateRange::parse_bound("to", value))
            .transpose()?;
        Ok(DateRange::from_bounds(from, to, timezone)?)
    }
}

#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub timezone: String,
}

impl From<&DateRange> for RangeResponse {
    fn from(range: &DateRange) -> Self {
        Self {
            from: range.start,
            to: range.end,
            timezone: range.timezone.name().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentRowResponse {
    pub student_id: Uuid,
    pub student_name: String,
    pub currency: Currency,
    pub currency_symbol: &'static str,
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
    pub has_billing_issues: bool,
}

impl From<&StudentBillingRow> for StudentRowResponse {
    fn from(row: &StudentBillingRow) -> Self {
        Self {
            student_id: row.student_id.into(),
            student_name: row.student_name.clone(),
            currency: row.currency,
            currency_symbol: row.currency.symbol(),
            total_billed: row.total_billed,
            total_paid: row.total_paid,
            balance: row.balance,
            has_billing_issues: row.has_billing_issues,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillingSummaryResponse {
    pub range: RangeResponse,
    pub total_accrued: Decimal,
    pub total_realized: Decimal,
    pub total_outstanding: Decimal,
    pub students_with_issues: usize,
    pub students: Vec<StudentRowResponse>,
}

impl From<BillingSummary> for BillingSummaryResponse {
    fn from(summary: BillingSummary) -> Self {
        Self {
            range: RangeResponse::from(&summary.range),
            total_accrued: summary.total_accrued,
            total_realized: summary.total_realized,
            total_outstanding: summary.total_outstanding,
            students_with_issues: summary.students_with_issues().count(),
            students: summary.students.iter().map(StudentRowResponse::from).collect(),
        }
    }
}

/// A monetary amount with a ready-to-render label
#[derive(Debug, Serialize)]
pub struct AmountResponse {
    pub amount: Decimal,
    pub currency: Currency,
    pub display: String,
}

impl From<Money> for AmountResponse {
    fn from(money: Money) -> Self {
        Self {
            amount: money.amount(),
            currency: money.currency(),
            display: money.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementItemResponse {
    pub class_id: Uuid,
    pub title: String,
    pub discipline: String,
    pub session_type: String,
    pub scheduled_at: DateTime<Utc>,
    /// None when no fee was in effect
    pub fee_id: Option<Uuid>,
    pub rate: Option<AmountResponse>,
    pub charge: Decimal,
}

impl From<&StatementItem> for StatementItemResponse {
    fn from(item: &StatementItem) -> Self {
        Self {
            class_id: item.class.id.into(),
            title: item.class.title.clone(),
            discipline: item.class.discipline.clone(),
            session_type: item.class.session_type.to_string(),
            scheduled_at: item.class.scheduled_at,
            fee_id: item.fee.as_ref().map(|f| f.id.into()),
            rate: item.fee.as_ref().map(|f| AmountResponse::from(f.amount)),
            charge: item.charge,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub amount: AmountResponse,
    pub transaction_at: DateTime<Utc>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id.into(),
            amount: AmountResponse::from(payment.amount),
            transaction_at: payment.transaction_at,
            method: payment.method.clone(),
            notes: payment.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementTotalsResponse {
    pub total_charges: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
    pub unresolved_items: usize,
}

impl From<StatementTotals> for StatementTotalsResponse {
    fn from(totals: StatementTotals) -> Self {
        Self {
            total_charges: totals.total_charges,
            total_paid: totals.total_paid,
            balance: totals.balance,
            unresolved_items: totals.unresolved_items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatementResponse {
    pub student_id: Uuid,
    pub student_name: String,
    pub email: String,
    pub currency: Currency,
    pub currency_symbol: &'static str,
    pub range: RangeResponse,
    pub items: Vec<StatementItemResponse>,
    pub payments: Vec<PaymentResponse>,
    pub totals: StatementTotalsResponse,
}

impl From<Statement> for StatementResponse {
    fn from(statement: Statement) -> Self {
        let totals = StatementTotals::from_statement(&statement);
        Self {
            student_id: statement.student.id.into(),
            currency: statement.student.currency,
            currency_symbol: statement.student.currency.symbol(),
            range: RangeResponse::from(&statement.range),
            items: statement.items.iter().map(StatementItemResponse::from).collect(),
            payments: statement.payments.iter().map(PaymentResponse::from).collect(),
            totals: totals.into(),
            student_name: statement.student.name,
            email: statement.student.email,
        }
    }
}
