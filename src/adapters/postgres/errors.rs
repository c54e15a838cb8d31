//! sqlx error mapping shared by the PostgreSQL adapters.

use crate::ports::{PersistenceError, StoreError};

/// True for failures where the database was unreachable or overloaded,
/// as opposed to a statement that will fail the same way again.
pub(crate) fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

pub(crate) fn store_error(context: &str, err: sqlx::Error) -> StoreError {
    if is_connection_error(&err) {
        StoreError::Connection(format!("{}: {}", context, err))
    } else {
        StoreError::Unexpected(format!("{}: {}", context, err))
    }
}

pub(crate) fn persistence_error(context: &str, err: sqlx::Error) -> PersistenceError {
    if is_connection_error(&err) {
        PersistenceError::Connection(format!("{}: {}", context, err))
    } else {
        PersistenceError::Unexpected(format!("{}: {}", context, err))
    }
}
