//! # Booking engine public API
//!
//! Each API wraps the backend traits it needs, so callers pick only the functionality they want:
//!
//! * [`payment_flow_api`] reacts to a confirmed payment: it flips the booking to paid and announces it on the event bus.
//! * [`access_api`] decides whether a principal may use the admin routes.
//! * [`bookings_api`] is the read side used by the admin routes and background jobs.
//!
//! The pattern for using all the APIs is the same. An instance is created by supplying backends that implement the
//! traits the API requires:
//!
//! ```rust,ignore
//! use showtime_engine::{BookingsApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/showtime.db", 5).await?;
//! let api = BookingsApi::new(db);
//! let bookings = api.all_bookings().await?;
//! ```
pub mod access_api;
pub mod bookings_api;
pub mod errors;
pub mod payment_flow_api;
