use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use showtime_engine::{jobs::JobError, BookingStoreError, PaymentFlowError};
use thiserror::Error;

use crate::integrations::stripe::CheckoutMetadataError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("The booking store is not available. {0}")]
    StoreUnavailable(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Request signature invalid or not provided. {0}")]
    InvalidSignature(String),
    #[error("Job failed. {0}")]
    JobFailed(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::JobFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<BookingStoreError> for ServerError {
    fn from(e: BookingStoreError) -> Self {
        match e {
            BookingStoreError::ConnectionError(s) => Self::StoreUnavailable(s),
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<JobError> for ServerError {
    fn from(e: JobError) -> Self {
        match e {
            JobError::UnknownJob(id) => Self::NoRecordFound(format!("No job with id {id} is registered")),
            e => Self::JobFailed(e.to_string()),
        }
    }
}

/// Failures after a webhook's signature has been accepted. All of them are reported to the provider as a 500.
#[derive(Debug, Error)]
pub enum WebhookHandlerError {
    #[error("{0}")]
    Metadata(#[from] CheckoutMetadataError),
    #[error("{0}")]
    PaymentFlow(#[from] PaymentFlowError),
}
