//! # Showtime server
//! This crate hosts the HTTP front end of the Showtime booking gateway. It is responsible for:
//! * Receiving payment webhooks, verifying their signatures, and marking the paid booking as such.
//! * Guarding the admin routes, so that only users with the `admin` role can reach them.
//! * Serving the job dispatcher endpoint that the event bus calls back into.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/`: Liveness. Opens the booking store connection if it is not open yet.
//! * `/api/stripe`: The payment provider's webhook.
//! * `/api/inngest`: The job dispatcher (`GET` introspection, `PUT` sync, `POST` invoke).
//! * `/api/admin/is-admin` and `/api/admin/all-bookings`: Admin-only routes.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook;
