//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the package store and actor directory ports,
//! backed by PostgreSQL via `diesel-async` with `bb8` pooling.
//!
//! - **Thin adapters**: implementations translate between Diesel rows and
//!   domain types. Transition and authorization rules stay in the domain.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Explicit transactions**: `DieselPackageStore::apply_scan` owns the
//!   transaction boundary for one scan.
//!
//! # Example
//!
//! ```ignore
//! use courier::outbound::persistence::{DbPool, DieselPackageStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/courier")).await?;
//! let store = DieselPackageStore::new(pool);
//! ```

mod diesel_actor_directory;
pub(crate) mod diesel_helpers;
mod diesel_package_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_actor_directory::DieselActorDirectory;
pub use diesel_package_store::DieselPackageStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
