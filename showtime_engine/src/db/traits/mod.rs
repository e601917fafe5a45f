//! #  Booking store contracts.
//!
//! The [`BookingManagement`] trait is the only thing the rest of the engine knows about the booking store. The SQLite
//! backend implements it directly, and [`crate::LazyBookingStore`] implements it by connecting to the backend on first
//! use.
//!
//! [`StoreConnection`] is implemented by anything that can be asked to make sure the store is reachable. The liveness
//! and job-dispatcher routes use it to warm up the connection before doing anything else.
mod booking_management;

pub use booking_management::{BookingManagement, BookingStoreError, StoreConnection};
