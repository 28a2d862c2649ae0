//! Shared helpers for Diesel adapter implementations.
//!
//! Adapters supply their port's error constructors so pool and Diesel
//! failures are translated in one place.

use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into an adapter-specific connection error constructor.
pub fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into query/connection constructors.
///
/// Database messages are logged at `debug` and replaced with stable
/// messages so SQL details never reach callers.
pub fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            query("serialization failure")
        }
        _ => query("database error"),
    }
}

/// Cast a stored version (`INTEGER`, constrained `>= 1`) to the domain type.
#[expect(
    clippy::cast_sign_loss,
    reason = "version column carries a CHECK (version >= 1) constraint"
)]
pub fn cast_version(version: i32) -> u32 {
    version as u32
}

/// Cast a domain version to the stored column type.
#[expect(
    clippy::cast_possible_wrap,
    reason = "versions grow by one per scan and stay far below i32::MAX"
)]
pub fn cast_version_for_db(version: u32) -> i32 {
    version as i32
}
