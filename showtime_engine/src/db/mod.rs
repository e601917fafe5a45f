pub mod connector;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;
