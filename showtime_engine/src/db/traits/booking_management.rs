use thiserror::Error;

use crate::db_types::{Booking, BookingId, BookingUpdate, NewBooking};

#[derive(Debug, Clone, Error)]
pub enum BookingStoreError {
    #[error("Could not connect to the booking store. {0}")]
    ConnectionError(String),
    #[error("Booking store query failed. {0}")]
    QueryError(String),
    #[error("Booking {0} already exists")]
    DuplicateBooking(BookingId),
}

/// The `BookingManagement` trait defines the behaviour for reading and writing booking records in the store backend.
#[allow(async_fn_in_trait)]
pub trait BookingManagement {
    /// Fetch a single booking. Returns `None` if there is no booking with the given id.
    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BookingStoreError>;

    /// All bookings, newest first.
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, BookingStoreError>;

    /// Apply a partial update to a booking.
    ///
    /// This is a best-effort write: updating a booking that does not exist is not an error, and nothing stops the same
    /// update being applied twice. Returns the number of records that were changed (0 or 1).
    async fn update_booking(&self, id: &BookingId, update: BookingUpdate) -> Result<u64, BookingStoreError>;

    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingStoreError>;
}

#[allow(async_fn_in_trait)]
pub trait StoreConnection {
    /// Make sure a connection to the store exists, opening one if this is the first call.
    async fn ensure_connected(&self) -> Result<(), BookingStoreError>;
}
