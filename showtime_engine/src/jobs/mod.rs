//! Background jobs invoked by the event bus.
//!
//! The bus learns which jobs exist by introspecting the [`JobRegistry`], and calls back into the server whenever one
//! of their trigger events is published. The server then looks the job up by id and runs it with the triggering
//! event.
mod booking_confirmation;
mod registry;

pub use booking_confirmation::{confirm_booking, register_booking_confirmation, BOOKING_CONFIRMATION_JOB};
pub use registry::{JobDefinition, JobDescription, JobError, JobFn, JobRegistry, JobTrigger};
