use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db_types::{Booking, BookingId};

/// Name of the event emitted once a booking's payment has been confirmed by the payment provider.
pub const SHOW_BOOKED_EVENT: &str = "app/show.booked";

/// A named event with a JSON payload, as understood by the external event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

impl DomainEvent {
    pub fn new<S: Into<String>>(name: S, data: Value) -> Self {
        Self { name: name.into(), data }
    }

    /// The `bookingId` field of the payload, if present and valid.
    pub fn booking_id(&self) -> Option<BookingId> {
        self.data.get("bookingId").and_then(Value::as_str).and_then(|s| s.parse().ok())
    }
}

impl Display for DomainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowBookedEvent {
    pub booking_id: BookingId,
}

impl ShowBookedEvent {
    pub fn new(booking_id: BookingId) -> Self {
        Self { booking_id }
    }
}

impl From<ShowBookedEvent> for DomainEvent {
    fn from(event: ShowBookedEvent) -> Self {
        DomainEvent::new(SHOW_BOOKED_EVENT, json!({ "bookingId": event.booking_id }))
    }
}

/// Delivered to in-process hooks once the booking-confirmation job has loaded a freshly paid booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmedEvent {
    pub booking: Booking,
}

impl BookingConfirmedEvent {
    pub fn new(booking: Booking) -> Self {
        Self { booking }
    }
}
