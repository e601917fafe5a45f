//! Lazy, single-flight connection to the booking store.
//!
//! The server does not connect to the store at start-up. Instead, the first request that needs the store triggers the
//! connection, and every later request reuses it. Concurrent first requests share the same connection attempt: one of
//! them runs the connector while the others wait for its result.
//!
//! ```text
//!   Uninitialized ──(first request)──► Connecting ──(ok)──► Ready
//!         ▲                                │
//!         └────────────(error)─────────────┘
//! ```
//!
//! There is no transition out of `Ready`. If the underlying pool loses its connection, the pool itself is responsible
//! for reconnecting.
use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use futures_util::{future::BoxFuture, FutureExt};
use log::*;
use tokio::sync::OnceCell;

use crate::{
    db_types::{Booking, BookingId, BookingUpdate, NewBooking},
    traits::{BookingManagement, BookingStoreError, StoreConnection},
};

/// A function that opens a new connection to the store.
pub type Connector<S> = Arc<dyn Fn() -> BoxFuture<'static, Result<S, BookingStoreError>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Ready,
}

pub struct ConnectionManager<S> {
    connector: Connector<S>,
    store: OnceCell<S>,
    connecting: AtomicBool,
}

impl<S> Debug for ConnectionManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionManager ({:?})", self.state())
    }
}

impl<S> ConnectionManager<S> {
    pub fn new(connector: Connector<S>) -> Self {
        Self { connector, store: OnceCell::new(), connecting: AtomicBool::new(false) }
    }

    pub fn state(&self) -> ConnectionState {
        if self.store.initialized() {
            ConnectionState::Ready
        } else if self.connecting.load(Ordering::SeqCst) {
            ConnectionState::Connecting
        } else {
            ConnectionState::Uninitialized
        }
    }
}

impl<S: Clone> ConnectionManager<S> {
    /// Returns a handle to the store, connecting first if necessary.
    pub async fn connect(&self) -> Result<S, BookingStoreError> {
        if let Some(store) = self.store.get() {
            return Ok(store.clone());
        }
        let store = self
            .store
            .get_or_try_init(|| async {
                let _connecting = ConnectingFlag::raise(&self.connecting);
                info!("🗃️ Opening booking store connection");
                let result = (self.connector)().await;
                match &result {
                    Ok(_) => info!("🗃️ Booking store connection is ready"),
                    Err(e) => warn!("🗃️ Could not connect to the booking store. The next request will retry. {e}"),
                }
                result
            })
            .await?;
        Ok(store.clone())
    }
}

/// Holds the `connecting` flag up for as long as it lives, so an abandoned attempt does not leave it set.
struct ConnectingFlag<'a>(&'a AtomicBool);

impl<'a> ConnectingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ConnectingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S: Clone> StoreConnection for ConnectionManager<S> {
    async fn ensure_connected(&self) -> Result<(), BookingStoreError> {
        self.connect().await.map(|_| ())
    }
}

//--------------------------------------   LazyBookingStore    -------------------------------------------------------
/// A [`BookingManagement`] backend that connects to the wrapped store on first use.
pub struct LazyBookingStore<S> {
    manager: Arc<ConnectionManager<S>>,
}

impl<S> Clone for LazyBookingStore<S> {
    fn clone(&self) -> Self {
        Self { manager: Arc::clone(&self.manager) }
    }
}

impl<S> Debug for LazyBookingStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LazyBookingStore ({:?})", self.manager.state())
    }
}

impl<S> LazyBookingStore<S> {
    pub fn new(connector: Connector<S>) -> Self {
        Self { manager: Arc::new(ConnectionManager::new(connector)) }
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }
}

impl<S: Clone> StoreConnection for LazyBookingStore<S> {
    async fn ensure_connected(&self) -> Result<(), BookingStoreError> {
        self.manager.ensure_connected().await
    }
}

impl<S> BookingManagement for LazyBookingStore<S>
where S: BookingManagement + Clone
{
    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BookingStoreError> {
        self.manager.connect().await?.fetch_booking(id).await
    }

    async fn fetch_bookings(&self) -> Result<Vec<Booking>, BookingStoreError> {
        self.manager.connect().await?.fetch_bookings().await
    }

    async fn update_booking(&self, id: &BookingId, update: BookingUpdate) -> Result<u64, BookingStoreError> {
        self.manager.connect().await?.update_booking(id, update).await
    }

    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, BookingStoreError> {
        self.manager.connect().await?.insert_booking(booking).await
    }
}

/// A connector that opens (and migrates) the SQLite database at `url`.
#[cfg(feature = "sqlite")]
pub fn sqlite_connector(url: String, max_connections: u32) -> Connector<crate::SqliteDatabase> {
    Arc::new(move || {
        let url = url.clone();
        async move {
            crate::SqliteDatabase::new_with_url(&url, max_connections)
                .await
                .map_err(|e| BookingStoreError::ConnectionError(e.to_string()))
        }
        .boxed()
    })
}
