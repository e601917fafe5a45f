mod booking_id;
mod secret;

pub use booking_id::{BookingId, BookingIdError, MAX_BOOKING_ID_LEN};
pub use secret::Secret;
