use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{bookings, new_pool, run_migrations, SqliteDatabaseError};
use crate::{
    db_types::{Booking, BookingId, BookingUpdate, NewBooking},
    traits::{BookingManagement, BookingStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connect to the database at `url` and bring its schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        run_migrations(&pool).await?;
        debug!("🗃️ Connected to {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl BookingManagement for SqliteDatabase {
    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BookingStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let booking = bookings::fetch_booking(id, &mut conn).await?;
        Ok(booking)
    }

    async fn fetch_bookings(&self) -> Result<Vec<Booking>, BookingStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let result = bookings::fetch_bookings(&mut conn).await?;
        Ok(result)
    }

    async fn update_booking(&self, id: &BookingId, update: BookingUpdate) -> Result<u64, BookingStoreError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let rows = bookings::update_booking(id, update, &mut conn).await?;
        Ok(rows)
    }

    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingStoreError> {
        let mut tx = self.pool.begin().await.map_err(SqliteDatabaseError::from)?;
        let booking = bookings::insert_booking(booking, &mut tx).await?;
        tx.commit().await.map_err(SqliteDatabaseError::from)?;
        Ok(booking)
    }
}
