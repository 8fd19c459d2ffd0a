//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the billing reports. These fixtures
//! are consistent and predictable: every date sits in June 2024 unless the
//! name says otherwise.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{Currency, DateRange, Money};
use domain_billing::ports::mock::MockBillingPort;
use domain_billing::{Class, Fee, Payment, SessionType, Student};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A typical one-to-one hourly rate
    pub fn usd_60() -> Money {
        Money::new(dec!(60.00), Currency::USD)
    }

    pub fn usd_40() -> Money {
        Money::new(dec!(40.00), Currency::USD)
    }

    /// Rupee amount for currency mismatch tests
    pub fn inr_1500() -> Money {
        Money::new(dec!(1500.00), Currency::INR)
    }
}

/// Fixture for dates and instants
pub struct TemporalFixtures;

impl TemporalFixtures {
    pub fn june_1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    pub fn june_30() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    /// The whole of June 2024, read in UTC
    pub fn june_range() -> DateRange {
        DateRange::new(Self::june_1(), Self::june_30()).unwrap()
    }

    /// Midnight UTC on the given 2024 day
    pub fn day_2024(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 0, 0, 0).unwrap()
    }

    /// An afternoon lesson slot in June 2024
    pub fn june_lesson(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 16, 0, 0).unwrap()
    }

    /// When the standing fee schedule took effect
    pub fn fee_schedule_start() -> DateTime<Utc> {
        Self::day_2024(1, 1)
    }
}

/// A small consistent data set: one piano student, one lesson, one fee, one payment
#[derive(Debug, Clone)]
pub struct PianoScenario {
    pub student: Student,
    pub class: Class,
    pub fee: Fee,
    pub payment: Payment,
}

impl PianoScenario {
    /// Student billed 60 USD for a June lesson and paying 60 USD the next day
    pub fn new() -> Self {
        let student = Student::new("Priya Raman", "priya@example.com", Currency::USD);
        let class = Class::new(
            "Piano basics",
            "piano",
            SessionType::OneToOne,
            TemporalFixtures::june_lesson(5),
        )
        .with_student(student.id);
        let fee = Fee::hourly(
            SessionType::OneToOne,
            MoneyFixtures::usd_60(),
            TemporalFixtures::fee_schedule_start(),
        )
        .for_discipline("piano");
        let payment = Payment::new(
            student.id,
            MoneyFixtures::usd_60(),
            TemporalFixtures::june_lesson(6),
            "bank transfer",
        );

        Self { student, class, fee, payment }
    }

    /// Loads the scenario into a fresh in-memory port
    pub async fn into_mock_port(self) -> MockBillingPort {
        MockBillingPort::with_data(
            vec![self.student],
            vec![self.class],
            vec![self.fee],
            vec![self.payment],
        )
        .await
    }
}

impl Default for PianoScenario {
    fn default() -> Self {
        Self::new()
    }
}
