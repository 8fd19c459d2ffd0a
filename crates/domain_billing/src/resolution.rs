//! Fee resolution
//!
//! Picks the single fee that prices a class. A fee qualifies when it is an
//! hourly rate for the class's session type, its discipline is either the
//! wildcard or exactly the class's discipline, and it was already in effect
//! when the class took place.
//!
//! Among qualifying fees:
//!
//! 1. a discipline-specific fee beats a wildcard one, however old it is;
//! 2. within the same tier the latest effective date wins;
//! 3. on an exact date tie a student-specific fee beats a global default,
//!    and after that the fee seen first wins.
//!
//! No qualifying fee is a normal outcome: the class is charged nothing and
//! reports flag the gap so the teacher can add the missing rate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use core_kernel::StudentId;

use crate::class::Class;
use crate::fee::{Fee, FeeScope, FeeType};

/// Returns true if the fee can price this class
pub fn is_candidate(fee: &Fee, class: &Class) -> bool {
    fee.fee_type == FeeType::Hourly
        && fee.session_type == class.session_type
        && fee.discipline.matches(&class.discipline)
        && fee.effective_at <= class.scheduled_at
}

/// Selects the authoritative fee for a class among the given fees
///
/// The caller passes fees that are already restricted to the student being
/// billed (their own plus global defaults) and free of soft-deleted records.
pub fn resolve_fee<'a, I>(class: &Class, fees: I) -> Option<&'a Fee>
where
    I: IntoIterator<Item = &'a Fee>,
{
    fees.into_iter()
        .filter(|fee| is_candidate(fee, class))
        .fold(None, |best: Option<&'a Fee>, fee| match best {
            Some(current) if precedence(current) >= precedence(fee) => Some(current),
            _ => Some(fee),
        })
}

/// Resolves the fee for one enrolled student, considering only fees that cover them
pub fn resolve_fee_for_student<'a>(
    class: &Class,
    student_id: StudentId,
    fees: &[&'a Fee],
) -> Option<&'a Fee> {
    let resolved = resolve_fee(
        class,
        fees.iter().copied().filter(|fee| fee.scope.covers(student_id)),
    );

    if resolved.is_none() {
        tracing::trace!(
            class_id = %class.id,
            student_id = %student_id,
            discipline = %class.discipline,
            session_type = %class.session_type,
            "No fee in effect for class"
        );
    }

    resolved
}

/// Amount charged for a class given its resolved fee
pub fn charge_for(fee: Option<&Fee>) -> Decimal {
    fee.map(|f| f.amount.amount()).unwrap_or(Decimal::ZERO)
}

fn precedence(fee: &Fee) -> (bool, DateTime<Utc>, bool) {
    (
        fee.discipline.is_specific(),
        fee.effective_at,
        matches!(fee.scope, FeeScope::ForStudent(_)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    use crate::class::SessionType;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn guitar_class() -> Class {
        Class::new("Lesson", "guitar", SessionType::OneToOne, at(2024, 6, 1))
    }

    #[test]
    fn test_specific_discipline_beats_newer_wildcard() {
        let wildcard = Fee::hourly(SessionType::OneToOne, usd(dec!(50)), at(2024, 5, 1));
        let specific = Fee::hourly(SessionType::OneToOne, usd(dec!(40)), at(2024, 1, 1))
            .for_discipline("guitar");
        let fees = [wildcard, specific.clone()];

        let resolved = resolve_fee(&guitar_class(), &fees).unwrap();
        assert_eq!(resolved.id, specific.id);
        assert_eq!(charge_for(Some(resolved)), dec!(40));
    }

    #[test]
    fn test_latest_effective_date_wins_within_tier() {
        let older = Fee::hourly(SessionType::OneToOne, usd(dec!(40)), at(2024, 1, 1))
            .for_discipline("guitar");
        let newer = Fee::hourly(SessionType::OneToOne, usd(dec!(45)), at(2024, 3, 1))
            .for_discipline("guitar");
        let fees = [newer, older];

        let resolved = resolve_fee(&guitar_class(), &fees);
        assert_eq!(charge_for(resolved), dec!(45));
    }

    #[test]
    fn test_future_fee_is_never_selected() {
        let future = Fee::hourly(SessionType::OneToOne, usd(dec!(55)), at(2024, 7, 1))
            .for_discipline("guitar");

        let resolved = resolve_fee(&guitar_class(), std::iter::once(&future));
        assert!(resolved.is_none());
        assert_eq!(charge_for(resolved), Decimal::ZERO);
    }

    #[test]
    fn test_fee_effective_at_class_time_applies() {
        let same_instant = Fee::hourly(SessionType::OneToOne, usd(dec!(30)), at(2024, 6, 1));
        assert!(is_candidate(&same_instant, &guitar_class()));
    }

    #[test]
    fn test_subscription_fee_never_prices_a_class() {
        let subscription = Fee::hourly(SessionType::OneToOne, usd(dec!(200)), at(2024, 1, 1))
            .for_discipline("guitar")
            .with_fee_type(FeeType::Subscription);

        assert!(resolve_fee(&guitar_class(), std::iter::once(&subscription)).is_none());
    }

    #[test]
    fn test_session_type_must_match_exactly() {
        let group = Fee::hourly(SessionType::Group, usd(dec!(20)), at(2024, 1, 1));
        assert!(resolve_fee(&guitar_class(), std::iter::once(&group)).is_none());
    }

    #[test]
    fn test_other_discipline_is_ignored() {
        let piano = Fee::hourly(SessionType::OneToOne, usd(dec!(60)), at(2024, 1, 1))
            .for_discipline("piano");
        assert!(resolve_fee(&guitar_class(), std::iter::once(&piano)).is_none());
    }

    #[test]
    fn test_student_fee_beats_global_on_same_date() {
        let student = StudentId::new();
        let global = Fee::hourly(SessionType::OneToOne, usd(dec!(50)), at(2024, 1, 1));
        let personal = Fee::hourly(SessionType::OneToOne, usd(dec!(35)), at(2024, 1, 1))
            .for_student(student);
        let class = guitar_class().with_student(student);
        let fees = [&global, &personal];

        let resolved = resolve_fee_for_student(&class, student, &fees).unwrap();
        assert_eq!(resolved.id, personal.id);
    }

    #[test]
    fn test_other_students_fee_is_not_considered() {
        let student = StudentId::new();
        let someone_else = Fee::hourly(SessionType::OneToOne, usd(dec!(35)), at(2024, 1, 1))
            .for_student(StudentId::new());
        let class = guitar_class().with_student(student);

        assert!(resolve_fee_for_student(&class, student, &[&someone_else]).is_none());
    }

    #[test]
    fn test_exact_tie_keeps_first_fee() {
        let first = Fee::hourly(SessionType::OneToOne, usd(dec!(41)), at(2024, 1, 1));
        let second = Fee::hourly(SessionType::OneToOne, usd(dec!(42)), at(2024, 1, 1));
        let fees = [first.clone(), second];

        assert_eq!(resolve_fee(&guitar_class(), &fees).unwrap().id, first.id);
    }
}
