//! Watch-side holder for the latest forecast snapshot.

use tokio::sync::{broadcast, watch};

use crate::data_map::{DataEvent, DataEventBuffer};
use crate::types::{ForecastSnapshot, WeatherError};

/// Holds the single live snapshot received from the phone.
///
/// The three fields live in one value behind a watch cell, so readers always
/// see a complete snapshot. Receivers from [`SnapshotHolder::subscribe`] get
/// woken whenever it is replaced, which the face uses as its invalidate signal.
pub struct SnapshotHolder {
    data_path: String,
    tx: watch::Sender<Option<ForecastSnapshot>>,
}

impl SnapshotHolder {
    pub fn new(data_path: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            data_path: data_path.into(),
            tx,
        }
    }

    /// Copy of the held snapshot, if one has arrived yet
    pub fn current(&self) -> Option<ForecastSnapshot> {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ForecastSnapshot>> {
        self.tx.subscribe()
    }

    /// Apply a batch of data events. Returns how many snapshots were accepted.
    ///
    /// Later items in the batch win. Deletions are ignored and the held
    /// snapshot is kept.
    pub fn on_data_changed(&self, events: &[DataEvent]) -> usize {
        let mut latest = None;
        let mut accepted = 0;

        for event in events {
            match event {
                DataEvent::Changed(item) if item.path == self.data_path => {
                    match ForecastSnapshot::from_data_map(&item.data_map) {
                        Ok(snapshot) => {
                            latest = Some(snapshot);
                            accepted += 1;
                        }
                        Err(e) => {
                            tracing::warn!(
                                path = %item.path,
                                error = %e,
                                "Ignoring malformed forecast item"
                            );
                        }
                    }
                }
                DataEvent::Changed(item) => {
                    tracing::trace!(path = %item.path, "Ignoring item on unrelated path");
                }
                DataEvent::Deleted { path } => {
                    tracing::debug!(path = %path, "Data item deleted, keeping current forecast");
                }
            }
        }

        // Only an accepted snapshot wakes subscribers; batches that carry
        // nothing usable leave the face as it is.
        if let Some(snapshot) = latest {
            tracing::debug!(
                weather_id = snapshot.condition_code,
                high = snapshot.high_temperature,
                low = snapshot.low_temperature,
                "Forecast updated"
            );
            self.tx.send_replace(Some(snapshot));
        }

        accepted
    }

    /// Wait for the next batch and apply it. Returns how many snapshots were
    /// accepted.
    ///
    /// Lagging skips the dropped batches and waits for the next one.
    pub async fn recv_batch(
        &self,
        events: &mut broadcast::Receiver<DataEventBuffer>,
    ) -> Result<usize, WeatherError> {
        loop {
            match events.recv().await {
                Ok(batch) => return Ok(self.on_data_changed(&batch)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Forecast listener lagged; older batches dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(WeatherError::ChannelClosed),
            }
        }
    }

    /// Drain `events` until the data layer goes away.
    pub async fn run(&self, mut events: broadcast::Receiver<DataEventBuffer>) {
        loop {
            if let Err(e) = self.recv_batch(&mut events).await {
                tracing::info!(reason = %e, "Forecast listener stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_map::{DataItem, DataMap, HIGH_TEMP, WEATHER_ID};

    const PATH: &str = "/weather_watch";

    fn changed(snapshot: ForecastSnapshot) -> DataEvent {
        DataEvent::Changed(DataItem::new(PATH, snapshot.to_data_map()))
    }

    #[test]
    fn test_starts_empty() {
        let holder = SnapshotHolder::new(PATH);
        assert_eq!(holder.current(), None);
    }

    #[test]
    fn test_changed_item_replaces_snapshot() {
        let holder = SnapshotHolder::new(PATH);
        let accepted = holder.on_data_changed(&[changed(ForecastSnapshot::new(500, 75.0, 60.0))]);

        assert_eq!(accepted, 1);
        assert_eq!(holder.current(), Some(ForecastSnapshot::new(500, 75.0, 60.0)));
    }

    #[test]
    fn test_last_item_in_batch_wins() {
        let holder = SnapshotHolder::new(PATH);
        holder.on_data_changed(&[
            changed(ForecastSnapshot::new(500, 75.0, 60.0)),
            changed(ForecastSnapshot::new(800, 90.0, 70.0)),
        ]);

        assert_eq!(holder.current(), Some(ForecastSnapshot::new(800, 90.0, 70.0)));
    }

    #[test]
    fn test_deleted_keeps_snapshot() {
        let holder = SnapshotHolder::new(PATH);
        holder.on_data_changed(&[changed(ForecastSnapshot::new(500, 75.0, 60.0))]);

        let accepted = holder.on_data_changed(&[DataEvent::Deleted { path: PATH.into() }]);
        assert_eq!(accepted, 0);
        assert_eq!(holder.current(), Some(ForecastSnapshot::new(500, 75.0, 60.0)));
    }

    #[test]
    fn test_other_path_ignored() {
        let holder = SnapshotHolder::new(PATH);
        holder.on_data_changed(&[DataEvent::Changed(DataItem::new(
            "/settings",
            ForecastSnapshot::new(500, 75.0, 60.0).to_data_map(),
        ))]);
        assert_eq!(holder.current(), None);
    }

    #[test]
    fn test_malformed_item_leaves_snapshot_untouched() {
        let holder = SnapshotHolder::new(PATH);
        holder.on_data_changed(&[changed(ForecastSnapshot::new(500, 75.0, 60.0))]);

        let mut partial = DataMap::new();
        partial.put_int(WEATHER_ID, 800).put_double(HIGH_TEMP, 99.0);
        let accepted = holder.on_data_changed(&[DataEvent::Changed(DataItem::new(PATH, partial))]);

        assert_eq!(accepted, 0);
        assert_eq!(holder.current(), Some(ForecastSnapshot::new(500, 75.0, 60.0)));
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let holder = SnapshotHolder::new(PATH);
        let mut rx = holder.subscribe();

        holder.on_data_changed(&[changed(ForecastSnapshot::new(600, -1.0, -8.0))]);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(ForecastSnapshot::new(600, -1.0, -8.0)));
    }

    #[tokio::test]
    async fn test_ignored_batch_does_not_notify() {
        let holder = SnapshotHolder::new(PATH);
        let rx = holder.subscribe();

        holder.on_data_changed(&[DataEvent::Deleted { path: PATH.into() }]);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_recv_batch_reports_closed_channel() {
        let holder = SnapshotHolder::new(PATH);
        let (tx, mut rx) = broadcast::channel(4);

        tx.send(vec![changed(ForecastSnapshot::new(500, 75.0, 60.0))]).unwrap();
        drop(tx);

        assert_eq!(holder.recv_batch(&mut rx).await.unwrap(), 1);
        let err = holder.recv_batch(&mut rx).await.unwrap_err();
        assert!(matches!(err, WeatherError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_recv_batch_skips_lagged_batches() {
        let holder = SnapshotHolder::new(PATH);
        let (tx, mut rx) = broadcast::channel(2);

        for code in [200, 300, 500, 800] {
            tx.send(vec![changed(ForecastSnapshot::new(code, 1.0, 0.0))]).unwrap();
        }

        holder.recv_batch(&mut rx).await.unwrap();
        holder.recv_batch(&mut rx).await.unwrap();
        assert_eq!(holder.current(), Some(ForecastSnapshot::new(800, 1.0, 0.0)));
    }

    #[tokio::test]
    async fn test_run_stops_when_channel_closes() {
        let holder = SnapshotHolder::new(PATH);
        let (tx, rx) = broadcast::channel(4);

        tx.send(vec![changed(ForecastSnapshot::new(801, 12.0, 3.0))]).unwrap();
        drop(tx);

        holder.run(rx).await;
        assert_eq!(holder.current(), Some(ForecastSnapshot::new(801, 12.0, 3.0)));
    }
}
