//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed package store and actor directory
//!   using Diesel ORM
//! - **notifier**: transition notifier emitting structured tracing records
//!
//! Adapters convert between domain types and infrastructure-specific
//! representations. They contain no business logic.

pub mod notifier;
pub mod persistence;
