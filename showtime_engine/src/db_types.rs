use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use showtime_common::BookingId;
pub use sqlx::types::Json;
use sqlx::FromRow;

/// The role string that grants access to admin routes.
pub const ADMIN_ROLE: &str = "admin";

//--------------------------------------     Booking       -----------------------------------------------------------
/// A seat booking for a show. Bookings are created by the storefront; this engine only ever flips them to paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: String,
    pub show_id: String,
    /// Total price in the minor unit of the storefront currency
    pub amount: i64,
    pub booked_seats: Json<Vec<String>>,
    pub is_paid: bool,
    /// The hosted checkout link handed to the customer. Cleared once the payment completes.
    pub payment_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Booking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.is_paid { "paid" } else { "unpaid" };
        write!(f, "Booking {} for show {} ({} seats, {status})", self.id, self.show_id, self.booked_seats.len())
    }
}

//--------------------------------------     NewBooking       --------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub id: BookingId,
    pub user_id: String,
    pub show_id: String,
    pub amount: i64,
    pub booked_seats: Vec<String>,
    pub payment_link: String,
}

impl NewBooking {
    pub fn new(id: BookingId, user_id: &str, show_id: &str, amount: i64) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            show_id: show_id.to_string(),
            amount,
            booked_seats: Vec::new(),
            payment_link: String::default(),
        }
    }

    pub fn with_seats<S: Into<String>>(mut self, seats: impl IntoIterator<Item = S>) -> Self {
        self.booked_seats = seats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_payment_link<S: Into<String>>(mut self, link: S) -> Self {
        self.payment_link = link.into();
        self
    }
}

//--------------------------------------     BookingUpdate       -----------------------------------------------------
/// A partial update of a booking. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    pub is_paid: Option<bool>,
    pub payment_link: Option<String>,
}

impl BookingUpdate {
    /// The update applied when the payment provider reports a completed checkout: the booking is paid and the
    /// checkout link is no longer valid.
    pub fn mark_paid() -> Self {
        Self { is_paid: Some(true), payment_link: Some(String::default()) }
    }

    pub fn is_empty(&self) -> bool {
        self.is_paid.is_none() && self.payment_link.is_none()
    }
}

//--------------------------------------     Principal       ---------------------------------------------------------
/// The authenticated user behind a request, as resolved by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    pub fn new<S: Into<String>>(user_id: S) -> Self {
        Self { user_id: user_id.into() }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_id)
    }
}
