//! Phone-to-watch data channel.
//!
//! Publishing returns a [`Delivery`], a single-shot completion signal. Callers
//! either await it with [`Delivery::confirm`] or hand it to the runtime with
//! [`Delivery::detach`]; failures are logged and never retried.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use crate::data_map::{DataEvent, DataEventBuffer, DataItem, PutDataRequest};
use crate::types::WeatherError;

/// How many event batches a slow listener may fall behind before it lags
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Outcome of a single publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered { path: String },
    Failed(String),
    /// The data layer went away without reporting a result
    Dropped,
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Completion side handed to the data layer implementation
pub type DeliverySender = oneshot::Sender<Result<(), WeatherError>>;

/// Pending result of a put or delete
#[derive(Debug)]
pub struct Delivery {
    path: String,
    rx: oneshot::Receiver<Result<(), WeatherError>>,
}

impl Delivery {
    /// Create a pending delivery and the sender that completes it
    pub fn pending(path: impl Into<String>) -> (DeliverySender, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                path: path.into(),
                rx,
            },
        )
    }

    /// A delivery whose result is already known
    pub fn ready(path: impl Into<String>, result: Result<(), WeatherError>) -> Self {
        let (tx, delivery) = Self::pending(path);
        let _ = tx.send(result);
        delivery
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the data layer's answer and log it.
    pub async fn confirm(self) -> DeliveryStatus {
        match self.rx.await {
            Ok(Ok(())) => {
                tracing::debug!(path = %self.path, "Data item set");
                DeliveryStatus::Delivered { path: self.path }
            }
            Ok(Err(e)) => {
                tracing::warn!(path = %self.path, error = %e, "Error sending data to watch");
                DeliveryStatus::Failed(e.to_string())
            }
            Err(_) => {
                tracing::warn!(path = %self.path, "Data layer dropped delivery without a result");
                DeliveryStatus::Dropped
            }
        }
    }

    /// Fire and forget: log the outcome from a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn detach(self) -> JoinHandle<DeliveryStatus> {
        tokio::spawn(self.confirm())
    }
}

/// Transport for data items between paired devices
pub trait DataLayer: Send + Sync {
    /// Publish `request`, replacing any item already stored at its path
    fn put_data_item(&self, request: PutDataRequest) -> Delivery;

    /// Remove the item at `path`
    fn delete_data_item(&self, path: &str) -> Delivery;

    /// Listen for change batches
    fn subscribe(&self) -> broadcast::Receiver<DataEventBuffer>;
}

/// In-process data layer: both "devices" live in one process.
///
/// Keeps the latest item per path and fans every change out to subscribers.
pub struct LocalDataLayer {
    items: Mutex<HashMap<String, DataItem>>,
    events: broadcast::Sender<DataEventBuffer>,
    connected: AtomicBool,
}

impl Default for LocalDataLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalDataLayer {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            items: Mutex::new(HashMap::new()),
            events,
            connected: AtomicBool::new(true),
        }
    }

    /// Simulate the paired node going away (or coming back)
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        tracing::info!(connected, "Local data layer connection changed");
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Currently stored item at `path`
    pub fn data_item(&self, path: &str) -> Option<DataItem> {
        self.items.lock().get(path).cloned()
    }

    fn publish(&self, event: DataEvent) {
        // No listeners is fine: the item is stored either way.
        if self.events.send(vec![event]).is_err() {
            tracing::debug!("No data listeners attached");
        }
    }
}

impl DataLayer for LocalDataLayer {
    fn put_data_item(&self, request: PutDataRequest) -> Delivery {
        let path = request.item.path.clone();
        if !self.is_connected() {
            return Delivery::ready(
                path,
                Err(WeatherError::Delivery("no connected node".to_string())),
            );
        }

        tracing::debug!(path = %path, urgent = request.urgent, "Putting data item");
        self.items.lock().insert(path.clone(), request.item.clone());
        self.publish(DataEvent::Changed(request.item));

        Delivery::ready(path, Ok(()))
    }

    fn delete_data_item(&self, path: &str) -> Delivery {
        if !self.is_connected() {
            return Delivery::ready(
                path,
                Err(WeatherError::Delivery("no connected node".to_string())),
            );
        }

        if self.items.lock().remove(path).is_some() {
            self.publish(DataEvent::Deleted {
                path: path.to_string(),
            });
        }

        Delivery::ready(path, Ok(()))
    }

    fn subscribe(&self) -> broadcast::Receiver<DataEventBuffer> {
        self.events.subscribe()
    }
}
