//! Core Kernel - Foundational types for the tutoring back office
//!
//! This crate provides the building blocks shared by the billing domain,
//! its adapters and the HTTP layer:
//! - Money and the supported billing currencies
//! - Inclusive date ranges read in a timezone
//! - Typed identifiers for students, classes, fees and payments
//! - Port error and health-check primitives

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, currency_symbol};
pub use temporal::{DateRange, Timezone, TemporalError};
pub use identifiers::{StudentId, ClassId, FeeId, PaymentId};
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
    OperationMetadata,
};
