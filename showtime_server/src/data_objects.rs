use std::fmt::Display;

use serde::{Deserialize, Serialize};
use showtime_engine::{
    db_types::Booking,
    events::DomainEvent,
    jobs::JobDescription,
};

/// The `{success, message}` envelope the front end expects from the admin routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IsAdminResponse {
    pub success: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingsResponse {
    pub success: bool,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
}

//-------------------------------------------   Job dispatcher  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobIntrospection {
    pub function_count: usize,
    pub functions: Vec<JobDescription>,
}

impl From<Vec<JobDescription>> for JobIntrospection {
    fn from(functions: Vec<JobDescription>) -> Self {
        Self { function_count: functions.len(), functions }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRegistration {
    pub message: String,
    pub functions: Vec<JobDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvokeJobParams {
    pub fn_id: String,
}

/// The body the event bus posts when it calls a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInvocation {
    pub event: DomainEvent,
}
