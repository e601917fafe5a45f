use thiserror::Error;

use crate::{events::EventBusError, traits::BookingStoreError};

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("Could not update the booking. {0}")]
    StoreError(#[from] BookingStoreError),
    #[error("The booking was updated, but the event could not be published. {0}")]
    PublishError(#[from] EventBusError),
}
