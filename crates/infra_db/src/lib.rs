//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL data store for the tutor desk using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL and
//! return row types, adapters implement domain ports on top of them.
//!
//! # Data Environments
//!
//! Development, pre-production and production data share one database and
//! live in separate schemas. The environment is part of [`DatabaseConfig`]
//! and fixed for the lifetime of the pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DataEnvironment, DatabaseConfig, PostgresBillingStore};
//!
//! let config = DatabaseConfig::new("postgres://localhost/tutor_desk")
//!     .environment(DataEnvironment::Development);
//! let pool = create_pool(config).await?;
//! run_migrations(&pool, DataEnvironment::Development).await?;
//! let store = PostgresBillingStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, DatabaseConfig, DataEnvironment, create_pool, run_migrations};
pub use error::DatabaseError;
pub use repositories::BillingRepository;
pub use adapters::{PostgresBillingStore, CHANGE_CHANNEL};
