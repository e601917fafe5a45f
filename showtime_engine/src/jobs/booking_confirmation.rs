use log::*;
use serde_json::{json, Value};

use crate::{
    events::{BookingConfirmedEvent, DomainEvent, EventProducers, SHOW_BOOKED_EVENT},
    jobs::{JobDefinition, JobError, JobRegistry},
    traits::BookingManagement,
};

pub const BOOKING_CONFIRMATION_JOB: &str = "booking-confirmation";

/// Register the job that runs whenever a show has been booked and paid for.
pub fn register_booking_confirmation<B>(registry: &mut JobRegistry, db: B, producers: EventProducers)
where B: BookingManagement + Clone + Send + Sync + 'static {
    let definition = JobDefinition::new(BOOKING_CONFIRMATION_JOB, "Booking confirmation", SHOW_BOOKED_EVENT);
    registry.register(definition, move |event| {
        let db = db.clone();
        let producers = producers.clone();
        async move { confirm_booking(&db, &producers, event).await }
    });
}

/// Load the booking named in the event and hand it to the `on_show_booked` hooks.
pub async fn confirm_booking<B: BookingManagement>(
    db: &B,
    producers: &EventProducers,
    event: DomainEvent,
) -> Result<Value, JobError> {
    let booking_id = event.booking_id().ok_or(JobError::MissingBookingId)?;
    let booking = db.fetch_booking(&booking_id).await?.ok_or_else(|| JobError::BookingNotFound(booking_id))?;
    if !booking.is_paid {
        warn!("⚙️ Booking {} was announced as booked, but it is not marked as paid", booking.id);
    }
    let (id, is_paid) = (booking.id.clone(), booking.is_paid);
    let notified = producers.notify_show_booked(BookingConfirmedEvent::new(booking)).await;
    info!("⚙️ Booking {id} confirmed. {notified} hook subscribers notified");
    Ok(json!({ "bookingId": id, "isPaid": is_paid, "notified": notified }))
}
