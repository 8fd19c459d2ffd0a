//! Billing Domain - Fee Resolution and Reports
//!
//! This crate turns a tutor's raw records (students, classes, fee schedules
//! and payments) into the two reports the back office shows:
//!
//! - **Billing summary**: accrued, realized and outstanding totals for a date
//!   range, with one row per student that had activity in it
//! - **Student statement**: one student's classes with the fee that priced
//!   each of them, plus their payments
//!
//! # Fee Resolution
//!
//! Every enrolled student is charged for every class independently. The rate
//! comes from the single hourly fee that matches the class's session type and
//! discipline and was in effect at class time:
//!
//! - a fee for the exact discipline outranks a wildcard fee of any age
//! - otherwise the most recently effective fee wins
//! - a student's own fee beats the global default on the same date
//!
//! A class with no matching fee is charged nothing and flagged, never rejected.
//!
//! # Example
//!
//! ```rust
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use core_kernel::{Currency, DateRange, Money};
//! use domain_billing::{compute_billing_summary, Class, Fee, Payment, SessionType, Student};
//! use rust_decimal_macros::dec;
//!
//! let student = Student::new("Priya", "priya@example.com", Currency::USD);
//! let class = Class::new(
//!     "Scales",
//!     "piano",
//!     SessionType::OneToOne,
//!     Utc.with_ymd_and_hms(2024, 6, 5, 16, 0, 0).unwrap(),
//! )
//! .with_student(student.id);
//! let fee = Fee::hourly(
//!     SessionType::OneToOne,
//!     Money::new(dec!(60), Currency::USD),
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//! )
//! .for_discipline("piano");
//! let payment = Payment::new(
//!     student.id,
//!     Money::new(dec!(60), Currency::USD),
//!     Utc.with_ymd_and_hms(2024, 6, 6, 9, 0, 0).unwrap(),
//!     "card",
//! );
//!
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
//! )
//! .unwrap();
//! let summary = compute_billing_summary(&range, &[student], &[class], &[fee], &[payment]);
//!
//! assert_eq!(summary.total_accrued, dec!(60));
//! assert_eq!(summary.total_outstanding, dec!(0));
//! ```

pub mod student;
pub mod class;
pub mod fee;
pub mod payment;
pub mod resolution;
pub mod summary;
pub mod statement;
pub mod ports;
pub mod services;
pub mod error;

pub use student::Student;
pub use class::{Class, SessionType};
pub use fee::{DisciplineScope, Fee, FeeScope, FeeType};
pub use payment::Payment;
pub use resolution::{charge_for, resolve_fee, resolve_fee_for_student};
pub use summary::{compute_billing_summary, BillingSummary, NameCollation, StudentBillingRow};
pub use statement::{compute_statement, Statement, StatementItem, StatementTotals};
pub use ports::{BillingDataPort, ChangeEvent, Collection};
pub use services::BillingService;
pub use error::BillingError;
