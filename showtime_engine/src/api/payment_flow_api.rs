use std::fmt::Debug;

use log::*;

use crate::{
    api::errors::PaymentFlowError,
    db_types::{BookingId, BookingUpdate},
    events::{EventPublisher, ShowBookedEvent},
    traits::BookingManagement,
};

/// `PaymentFlowApi` handles what happens once the payment provider has confirmed a checkout.
///
/// The store write and the event publish are independent. If publishing fails after the write succeeded, the booking
/// stays paid and the error is returned to the caller.
pub struct PaymentFlowApi<B, P> {
    db: B,
    publisher: P,
}

impl<B, P> Debug for PaymentFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B, P> PaymentFlowApi<B, P> {
    pub fn new(db: B, publisher: P) -> Self {
        Self { db, publisher }
    }
}

impl<B, P> PaymentFlowApi<B, P>
where
    B: BookingManagement,
    P: EventPublisher,
{
    /// Mark the booking as paid, clear its checkout link, and publish `app/show.booked`.
    ///
    /// There is no existence or already-paid check. A duplicate delivery repeats the update and publishes again.
    /// Returns the number of bookings the store reported as modified (0 if the booking does not exist).
    pub async fn confirm_booking_payment(&self, booking_id: &BookingId) -> Result<u64, PaymentFlowError> {
        let updated = self.db.update_booking(booking_id, BookingUpdate::mark_paid()).await?;
        if updated == 0 {
            warn!("🔄️💳️ Payment confirmed for booking {booking_id}, but the store has no such booking");
        } else {
            debug!("🔄️💳️ Booking {booking_id} marked as paid");
        }
        let event = ShowBookedEvent::new(booking_id.clone());
        self.publisher.publish(event.into()).await?;
        info!("🔄️💳️ Payment for booking {booking_id} processed");
        Ok(updated)
    }
}
