//! Publishes today's forecast to the watch.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use sunshine_core::SyncConfig;

use crate::data_layer::{DataLayer, Delivery};
use crate::data_map::PutDataRequest;
use crate::date::normalize_date;
use crate::store::ForecastSource;
use crate::types::{ForecastSnapshot, WeatherError};

/// Result of one sync pass
#[derive(Debug)]
pub enum SyncOutcome {
    /// Nothing stored for today; nothing was sent
    NoData,
    /// A snapshot was handed to the data layer
    Sent {
        snapshot: ForecastSnapshot,
        delivery: Delivery,
    },
}

pub struct SnapshotProducer<S> {
    source: S,
    data_layer: Arc<dyn DataLayer>,
    data_path: String,
    urgent: bool,
}

impl<S: ForecastSource> SnapshotProducer<S> {
    pub fn new(source: S, data_layer: Arc<dyn DataLayer>, config: &SyncConfig) -> Self {
        Self {
            source,
            data_layer,
            data_path: config.data_path.clone(),
            urgent: config.urgent,
        }
    }

    /// Look up the forecast for the day containing `now` and publish it.
    ///
    /// A missing row is not an error. Store failures are returned; delivery
    /// failures are only reported through the returned [`Delivery`].
    pub fn sync_today(&self, now: DateTime<Utc>) -> Result<SyncOutcome, WeatherError> {
        let today = normalize_date(now);

        let Some(entry) = self.source.forecast_for_date(today)? else {
            tracing::debug!(date = today, "No forecast stored for today, skipping watch update");
            return Ok(SyncOutcome::NoData);
        };

        let snapshot = ForecastSnapshot::from(&entry);
        let delivery = self.publish(snapshot);
        Ok(SyncOutcome::Sent { snapshot, delivery })
    }

    /// Pack `snapshot` and hand it to the data layer.
    pub fn publish(&self, snapshot: ForecastSnapshot) -> Delivery {
        let mut request = PutDataRequest::new(self.data_path.clone(), snapshot.to_data_map());
        if self.urgent {
            request = request.set_urgent();
        }

        tracing::info!(
            weather_id = snapshot.condition_code,
            high = snapshot.high_temperature,
            low = snapshot.low_temperature,
            "Sending forecast to watch"
        );
        self.data_layer.put_data_item(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_layer::{DeliveryStatus, LocalDataLayer};
    use crate::data_map::{DataEvent, WEATHER_ID};
    use crate::store::ForecastStore;
    use crate::types::ForecastEntry;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 15, 30, 0).unwrap()
    }

    fn producer_with(
        entries: &[ForecastEntry],
    ) -> (SnapshotProducer<ForecastStore>, Arc<LocalDataLayer>) {
        let store = ForecastStore::in_memory().unwrap();
        for entry in entries {
            store.insert(entry).unwrap();
        }
        let layer = Arc::new(LocalDataLayer::new());
        let producer = SnapshotProducer::new(store, layer.clone(), &SyncConfig::default());
        (producer, layer)
    }

    #[tokio::test]
    async fn test_sync_sends_today() {
        let today = normalize_date(now());
        let (producer, layer) = producer_with(&[
            ForecastEntry::new(today - 86_400_000, 800, 30.0, 20.0),
            ForecastEntry::new(today, 500, 75.0, 60.0),
        ]);
        let mut rx = layer.subscribe();

        let outcome = producer.sync_today(now()).unwrap();
        let SyncOutcome::Sent { snapshot, delivery } = outcome else {
            panic!("expected a snapshot to be sent");
        };
        assert_eq!(snapshot, ForecastSnapshot::new(500, 75.0, 60.0));
        assert!(delivery.confirm().await.is_delivered());

        let batch = rx.recv().await.unwrap();
        let DataEvent::Changed(item) = &batch[0] else {
            panic!("expected a changed event");
        };
        assert_eq!(item.path, "/weather_watch");
        assert_eq!(item.data_map.get_int(WEATHER_ID), Some(500));
    }

    #[tokio::test]
    async fn test_sync_without_today_sends_nothing() {
        let today = normalize_date(now());
        let (producer, layer) =
            producer_with(&[ForecastEntry::new(today + 86_400_000, 800, 30.0, 20.0)]);
        let mut rx = layer.subscribe();

        let outcome = producer.sync_today(now()).unwrap();
        assert!(matches!(outcome, SyncOutcome::NoData));
        assert!(rx.try_recv().is_err());
        assert!(layer.data_item("/weather_watch").is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_an_error() {
        let today = normalize_date(now());
        let (producer, layer) = producer_with(&[ForecastEntry::new(today, 211, 18.0, 12.0)]);
        layer.set_connected(false);

        let outcome = producer.sync_today(now()).unwrap();
        let SyncOutcome::Sent { delivery, .. } = outcome else {
            panic!("expected a send attempt");
        };
        assert!(matches!(delivery.confirm().await, DeliveryStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_non_urgent_config() {
        let store = ForecastStore::in_memory().unwrap();
        let layer = Arc::new(LocalDataLayer::new());
        let config = SyncConfig {
            data_path: "/forecast".into(),
            urgent: false,
        };
        let producer = SnapshotProducer::new(store, layer.clone(), &config);

        producer.publish(ForecastSnapshot::new(801, 1.0, 0.0)).confirm().await;
        assert!(layer.data_item("/forecast").is_some());
        assert!(layer.data_item("/weather_watch").is_none());
    }
}
