//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating billing data sets that keep
//! referential integrity: every class and payment points at a generated
//! student, so properties exercise resolution rather than orphan handling.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{Currency, DateRange, Money, StudentId};
use domain_billing::{
    Class, DisciplineScope, Fee, FeeScope, FeeType, Payment, SessionType, Student,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

const DISCIPLINES: [&str; 3] = ["piano", "guitar", "violin"];

/// Strategy for generating supported Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

/// Strategy for generating non-negative amounts with two decimal places
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    amount_strategy().prop_map(|amount| Money::new(amount, Currency::USD))
}

/// Strategy for generating instants within 2024, at hour granularity
pub fn instant_2024_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..366 * 24).prop_map(|hours| {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    })
}

/// Strategy for generating valid UTC date ranges within 2024
pub fn date_range_strategy() -> impl Strategy<Value = DateRange> {
    (0i64..366, 0i64..120).prop_map(|(start_offset, length)| {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(start_offset);
        DateRange::new(start, start + Duration::days(length)).unwrap()
    })
}

pub fn session_type_strategy() -> impl Strategy<Value = SessionType> {
    prop_oneof![Just(SessionType::OneToOne), Just(SessionType::Group)]
}

/// Discipline scope, roughly one in three being the wildcard
pub fn discipline_scope_strategy() -> impl Strategy<Value = DisciplineScope> {
    prop_oneof![
        1 => Just(DisciplineScope::Any),
        2 => prop::sample::select(DISCIPLINES.to_vec())
            .prop_map(|d| DisciplineScope::Specific(d.to_string())),
    ]
}

/// Strategy for generating names
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}".prop_map(|s| s)
}

/// A generated set of the four collections
#[derive(Debug, Clone)]
pub struct BillingDataset {
    pub students: Vec<Student>,
    pub classes: Vec<Class>,
    pub fees: Vec<Fee>,
    pub payments: Vec<Payment>,
}

impl BillingDataset {
    /// Returns a copy with a soft-deleted twin of every class, fee and payment appended
    ///
    /// The twins may carry any data; since they are deleted, reports over the
    /// result must match reports over `self`.
    pub fn with_deleted_noise(&self, noise: &BillingDataset) -> BillingDataset {
        let mut extended = self.clone();
        extended.classes.extend(noise.classes.iter().cloned().map(|mut c| {
            c.deleted = true;
            c
        }));
        extended.fees.extend(noise.fees.iter().cloned().map(|mut f| {
            f.deleted = true;
            f
        }));
        extended.payments.extend(noise.payments.iter().cloned().map(|mut p| {
            p.deleted = true;
            p
        }));
        extended
    }

    pub fn active_student_ids(&self) -> Vec<StudentId> {
        self.students.iter().filter(|s| s.is_active()).map(|s| s.id).collect()
    }
}

fn class_strategy(student_ids: Vec<StudentId>) -> impl Strategy<Value = Class> {
    (
        prop::sample::select(DISCIPLINES.to_vec()),
        session_type_strategy(),
        instant_2024_strategy(),
        prop::sample::subsequence(student_ids.clone(), 0..=student_ids.len()),
    )
        .prop_map(|(discipline, session_type, scheduled_at, enrolled)| {
            enrolled.into_iter().fold(
                Class::new("Generated", discipline, session_type, scheduled_at),
                Class::with_student,
            )
        })
}

fn fee_strategy(student_ids: Vec<StudentId>) -> impl Strategy<Value = Fee> {
    (
        proptest::option::of(prop::sample::select(student_ids)),
        discipline_scope_strategy(),
        session_type_strategy(),
        prop::bool::weighted(0.85),
        usd_money_strategy(),
        instant_2024_strategy(),
    )
        .prop_map(|(student, discipline, session_type, hourly, amount, effective_at)| {
            let mut fee = Fee::hourly(session_type, amount, effective_at);
            fee.scope = FeeScope::from_stored(student);
            fee.discipline = discipline;
            if !hourly {
                fee.fee_type = FeeType::Subscription;
            }
            fee
        })
}

fn payment_strategy(student_ids: Vec<StudentId>) -> impl Strategy<Value = Payment> {
    (prop::sample::select(student_ids), usd_money_strategy(), instant_2024_strategy())
        .prop_map(|(student_id, amount, transaction_at)| {
            Payment::new(student_id, amount, transaction_at, "cash")
        })
}

/// Strategy for generating a referentially consistent data set
pub fn billing_dataset_strategy() -> impl Strategy<Value = BillingDataset> {
    prop::collection::vec(name_strategy(), 1..5)
        .prop_map(|names| {
            names
                .into_iter()
                .map(|name| {
                    let email = format!("{}@example.com", name.to_lowercase());
                    Student::new(name, email, Currency::USD)
                })
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|students| {
            let ids: Vec<StudentId> = students.iter().map(|s| s.id).collect();
            (
                Just(students),
                prop::collection::vec(class_strategy(ids.clone()), 0..12),
                prop::collection::vec(fee_strategy(ids.clone()), 0..8),
                prop::collection::vec(payment_strategy(ids), 0..8),
            )
        })
        .prop_map(|(students, classes, fees, payments)| BillingDataset {
            students,
            classes,
            fees,
            payments,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_range_is_ordered(range in date_range_strategy()) {
            prop_assert!(range.start <= range.end);
        }

        #[test]
        fn generated_records_reference_generated_students(data in billing_dataset_strategy()) {
            let ids = data.active_student_ids();
            for class in &data.classes {
                prop_assert!(class.student_ids.iter().all(|id| ids.contains(id)));
            }
            for payment in &data.payments {
                prop_assert!(ids.contains(&payment.student_id));
            }
        }
    }
}
