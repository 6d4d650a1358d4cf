//! Forecast sync between the Sunshine phone app and its watch face.
//!
//! The phone side reads today's forecast from the local store and publishes a
//! small snapshot over the data layer; the watch side holds the latest
//! snapshot and turns it into a glyph on every redraw.

pub mod consumer;
pub mod data_layer;
pub mod data_map;
pub mod date;
pub mod face;
pub mod producer;
pub mod store;
pub mod types;

pub use consumer::SnapshotHolder;
pub use data_layer::{DataLayer, Delivery, DeliveryStatus, LocalDataLayer};
pub use data_map::{DataEvent, DataEventBuffer, DataItem, DataMap, DataValue, PutDataRequest};
pub use date::{date_key, normalize_date};
pub use face::{FaceFrame, FaceMode, WatchFace, WeatherGlyph, AMBIENT_UPDATE_MS};
pub use producer::{SnapshotProducer, SyncOutcome};
pub use store::{ForecastSource, ForecastStore};
pub use types::*;
