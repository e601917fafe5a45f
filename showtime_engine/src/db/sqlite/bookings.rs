use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Booking, BookingId, BookingUpdate, NewBooking},
};

const BOOKING_COLUMNS: &str =
    "id, user_id, show_id, amount, booked_seats, is_paid, payment_link, created_at, updated_at";

/// Inserts a new booking into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_booking(booking: NewBooking, conn: &mut SqliteConnection) -> Result<Booking, SqliteDatabaseError> {
    if fetch_booking(&booking.id, conn).await?.is_some() {
        return Err(SqliteDatabaseError::DuplicateBooking(booking.id));
    }
    let sql = format!(
        "INSERT INTO bookings (id, user_id, show_id, amount, booked_seats, payment_link) VALUES ($1, $2, $3, $4, $5, \
         $6) RETURNING {BOOKING_COLUMNS}"
    );
    let record = sqlx::query_as::<_, Booking>(&sql)
        .bind(&booking.id)
        .bind(&booking.user_id)
        .bind(&booking.show_id)
        .bind(booking.amount)
        .bind(Json(&booking.booked_seats))
        .bind(&booking.payment_link)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Booking {} has been saved in the DB", record.id);
    Ok(record)
}

pub async fn fetch_booking(id: &BookingId, conn: &mut SqliteConnection) -> Result<Option<Booking>, SqliteDatabaseError> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
    let booking = sqlx::query_as::<_, Booking>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(booking)
}

pub async fn fetch_bookings(conn: &mut SqliteConnection) -> Result<Vec<Booking>, SqliteDatabaseError> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, rowid DESC");
    let bookings = sqlx::query_as::<_, Booking>(&sql).fetch_all(conn).await?;
    trace!("🗃️ Fetched {} bookings", bookings.len());
    Ok(bookings)
}

/// Applies the non-empty fields of `update` to the booking. Missing bookings are silently ignored; the number of
/// changed rows is returned so callers can tell if they care.
pub async fn update_booking(
    id: &BookingId,
    update: BookingUpdate,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    if update.is_empty() {
        trace!("🗃️ Empty update for booking {id}. Nothing to do.");
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE bookings SET updated_at = CURRENT_TIMESTAMP");
    if let Some(is_paid) = update.is_paid {
        builder.push(", is_paid = ").push_bind(is_paid);
    }
    if let Some(link) = update.payment_link {
        builder.push(", payment_link = ").push_bind(link);
    }
    builder.push(" WHERE id = ").push_bind(id.as_str());
    let result = builder.build().execute(conn).await?;
    let rows = result.rows_affected();
    if rows == 0 {
        debug!("🗃️ Update for booking {id} matched no records");
    } else {
        trace!("🗃️ Booking {id} updated");
    }
    Ok(rows)
}
