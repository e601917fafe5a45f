use std::fmt::Debug;

use crate::{
    db_types::Booking,
    traits::{BookingManagement, BookingStoreError},
};

/// Read access to bookings.
pub struct BookingsApi<B> {
    db: B,
}

impl<B> Debug for BookingsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BookingsApi")
    }
}

impl<B> BookingsApi<B>
where B: BookingManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Every booking, newest first.
    pub async fn all_bookings(&self) -> Result<Vec<Booking>, BookingStoreError> {
        self.db.fetch_bookings().await
    }
}
