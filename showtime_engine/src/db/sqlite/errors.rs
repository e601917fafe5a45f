use thiserror::Error;

use crate::{db_types::BookingId, traits::BookingStoreError};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Cannot insert duplicate booking {0}")]
    DuplicateBooking(BookingId),
}

impl From<SqliteDatabaseError> for BookingStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DuplicateBooking(id) => BookingStoreError::DuplicateBooking(id),
            SqliteDatabaseError::MigrationError(e) => BookingStoreError::ConnectionError(e.to_string()),
            SqliteDatabaseError::DriverError(e) => BookingStoreError::QueryError(e.to_string()),
        }
    }
}
