//! Domain events.
//!
//! Two kinds of events live here:
//! * [`DomainEvent`]s are sent to the external event bus through an [`EventPublisher`]. The bus is responsible for
//!   delivery and retries; the job dispatcher receives them back later.
//! * In-process hooks ([`EventHooks`]) let the server react to a confirmed booking without any network round trip.
mod channel;
mod event_types;
mod hooks;
mod publisher;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use publisher::{http_timeout_from_env, EventBusClient, EventBusConfig, EventBusError, EventPublisher};
