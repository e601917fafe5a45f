use log::*;
use showtime_engine::{events::EventPublisher, traits::BookingManagement, PaymentFlowApi};

use crate::{
    errors::WebhookHandlerError,
    integrations::stripe::{booking_id_from_checkout_session, StripeEvent, CHECKOUT_SESSION_COMPLETED},
};

/// Act on a verified payment event. Only completed checkouts change anything.
pub async fn handle_stripe_event<B, P>(
    api: &PaymentFlowApi<B, P>,
    event: &StripeEvent,
) -> Result<(), WebhookHandlerError>
where
    B: BookingManagement,
    P: EventPublisher,
{
    match event.event_type.as_str() {
        CHECKOUT_SESSION_COMPLETED => {
            let booking_id = booking_id_from_checkout_session(&event.data.object)?;
            info!("💳️ Checkout completed for booking {booking_id} ({})", event.id);
            api.confirm_booking_payment(&booking_id).await?;
            Ok(())
        },
        other => {
            debug!("💳️ Ignoring unhandled payment event type {other} ({})", event.id);
            Ok(())
        },
    }
}
