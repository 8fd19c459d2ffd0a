//! Test Data Builders
//!
//! Provides builder patterns for constructing billing records with sensible
//! defaults. Tests specify only the fields they care about.

use chrono::{DateTime, Utc};
use core_kernel::{Currency, Money, StudentId};
use domain_billing::{
    Class, DisciplineScope, Fee, FeeScope, FeeType, Payment, SessionType, Student,
};
use rust_decimal::Decimal;

use crate::fixtures::{MoneyFixtures, TemporalFixtures};

/// Builder for students
pub struct StudentBuilder {
    name: String,
    email: String,
    currency: Currency,
    deleted: bool,
}

impl Default for StudentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentBuilder {
    pub fn new() -> Self {
        Self {
            name: "Test Student".to_string(),
            email: "student@example.com".to_string(),
            currency: Currency::USD,
            deleted: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn build(self) -> Student {
        let mut student = Student::new(self.name, self.email, self.currency);
        student.deleted = self.deleted;
        student
    }
}

/// Builder for classes
pub struct ClassBuilder {
    title: String,
    discipline: String,
    session_type: SessionType,
    scheduled_at: DateTime<Utc>,
    student_ids: Vec<StudentId>,
    deleted: bool,
}

impl Default for ClassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassBuilder {
    /// A one-to-one piano lesson on June 5th with nobody enrolled
    pub fn new() -> Self {
        Self {
            title: "Lesson".to_string(),
            discipline: "piano".to_string(),
            session_type: SessionType::OneToOne,
            scheduled_at: TemporalFixtures::june_lesson(5),
            student_ids: Vec::new(),
            deleted: false,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = discipline.into();
        self
    }

    pub fn group(mut self) -> Self {
        self.session_type = SessionType::Group;
        self
    }

    pub fn at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = scheduled_at;
        self
    }

    pub fn enroll(mut self, student_id: StudentId) -> Self {
        self.student_ids.push(student_id);
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn build(self) -> Class {
        let mut class = Class::new(self.title, self.discipline, self.session_type, self.scheduled_at);
        for student_id in self.student_ids {
            class = class.with_student(student_id);
        }
        class.deleted = self.deleted;
        class
    }
}

/// Builder for fees
pub struct FeeBuilder {
    scope: FeeScope,
    discipline: DisciplineScope,
    session_type: SessionType,
    fee_type: FeeType,
    amount: Money,
    effective_at: DateTime<Utc>,
    deleted: bool,
}

impl Default for FeeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeBuilder {
    /// A global, any-discipline, one-to-one hourly fee of 60 USD effective since January
    pub fn new() -> Self {
        Self {
            scope: FeeScope::Global,
            discipline: DisciplineScope::Any,
            session_type: SessionType::OneToOne,
            fee_type: FeeType::Hourly,
            amount: MoneyFixtures::usd_60(),
            effective_at: TemporalFixtures::fee_schedule_start(),
            deleted: false,
        }
    }

    pub fn for_student(mut self, student_id: StudentId) -> Self {
        self.scope = FeeScope::ForStudent(student_id);
        self
    }

    pub fn discipline(mut self, discipline: impl Into<String>) -> Self {
        self.discipline = DisciplineScope::Specific(discipline.into());
        self
    }

    pub fn group(mut self) -> Self {
        self.session_type = SessionType::Group;
        self
    }

    pub fn subscription(mut self) -> Self {
        self.fee_type = FeeType::Subscription;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Money::new(amount, self.amount.currency());
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.amount = Money::new(self.amount.amount(), currency);
        self
    }

    pub fn effective(mut self, effective_at: DateTime<Utc>) -> Self {
        self.effective_at = effective_at;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn build(self) -> Fee {
        let mut fee = Fee::hourly(self.session_type, self.amount, self.effective_at)
            .with_fee_type(self.fee_type);
        fee.scope = self.scope;
        fee.discipline = self.discipline;
        fee.deleted = self.deleted;
        fee
    }
}

/// Builder for payments
pub struct PaymentBuilder {
    student_id: StudentId,
    amount: Money,
    transaction_at: DateTime<Utc>,
    method: String,
    notes: Option<String>,
    deleted: bool,
}

impl PaymentBuilder {
    /// A 60 USD cash payment on June 6th
    pub fn new(student_id: StudentId) -> Self {
        Self {
            student_id,
            amount: MoneyFixtures::usd_60(),
            transaction_at: TemporalFixtures::june_lesson(6),
            method: "cash".to_string(),
            notes: None,
            deleted: false,
        }
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Money::new(amount, self.amount.currency());
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.amount = Money::new(self.amount.amount(), currency);
        self
    }

    pub fn at(mut self, transaction_at: DateTime<Utc>) -> Self {
        self.transaction_at = transaction_at;
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn build(self) -> Payment {
        let mut payment = Payment::new(self.student_id, self.amount, self.transaction_at, self.method);
        payment.notes = self.notes;
        payment.deleted = self.deleted;
        payment
    }
}
