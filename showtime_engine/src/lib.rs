//! Showtime booking engine
//!
//! The engine holds everything the booking gateway does that is not HTTP: the booking store, the clients for the
//! external event bus and identity provider, and the small amount of business logic that ties them together.
//!
//! The library is divided into these sections:
//! 1. Booking storage ([`mod@db`]). [`BookingManagement`] is the store contract; [`SqliteDatabase`] implements it, and
//!    [`LazyBookingStore`] wraps any implementation so that it only connects on first use.
//! 2. Events ([`mod@events`]). [`EventPublisher`] sends domain events to the external bus. In-process hooks let the
//!    server react to a confirmed booking.
//! 3. Identity ([`mod@identity`]). Role lookups against the identity provider.
//! 4. The public API ([`mod@api`]), which combines the above: confirming a payment, checking admin access and listing
//!    bookings.
//! 5. Background jobs ([`mod@jobs`]) that the event bus calls back into.
pub mod api;
pub mod db;
pub mod db_types;
pub mod events;
pub mod identity;
pub mod jobs;

pub use api::{
    access_api::{AccessApi, AccessDecision},
    bookings_api::BookingsApi,
    errors::PaymentFlowError,
    payment_flow_api::PaymentFlowApi,
};
#[cfg(feature = "sqlite")]
pub use db::connector::sqlite_connector;
pub use db::connector::{ConnectionManager, ConnectionState, Connector, LazyBookingStore};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{db::SqliteDatabase, SqliteDatabaseError};
pub use db::traits;
pub use events::{EventBusClient, EventBusConfig, EventBusError, EventPublisher};
pub use identity::{IdentityClient, IdentityConfig, IdentityError, IdentityLookup};
pub use traits::{BookingManagement, BookingStoreError, StoreConnection};
