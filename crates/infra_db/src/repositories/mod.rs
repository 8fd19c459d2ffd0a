//! Repository implementations for domain entities
//!
//! Repositories encapsulate SQL queries and return plain row types.
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate
//! builds without a live database.

pub mod billing;

pub use billing::BillingRepository;
