//! Domain Adapters
//!
//! This module provides adapter implementations for domain ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillingStore;
//! use domain_billing::BillingDataPort;
//!
//! let store = PostgresBillingStore::new(pool);
//! let fees = store.list_fees(None).await?;
//! ```

pub mod billing;

pub use billing::{PostgresBillingStore, CHANGE_CHANNEL};
