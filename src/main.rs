use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sunshine_core::{AppError, Config};
use sunshine_weather::{
    date_key, DataLayer, FaceMode, ForecastEntry, ForecastStore, LocalDataLayer, SnapshotHolder,
    SnapshotProducer, SyncOutcome, WatchFace,
};

#[tokio::main]
async fn main() -> Result<()> {
    sunshine_core::init()?;

    let (config, _) = match Config::load_validated() {
        Ok(loaded) => loaded,
        Err(e) => {
            let err = AppError::from_anyhow(e);
            tracing::error!("Config load failed: {}", err);
            println!("{}", err.user_message());
            return Err(err.into());
        }
    };
    std::fs::create_dir_all(&config.data_dir).context("Failed to create data directory")?;

    let mut store =
        ForecastStore::open(config.database_path()).context("Failed to open forecast store")?;
    seed_if_empty(&mut store)?;

    // Watch side: hold whatever the phone sends
    let layer = Arc::new(LocalDataLayer::new());
    let holder = Arc::new(SnapshotHolder::new(config.sync.data_path.clone()));
    let listener = {
        let holder = holder.clone();
        let events = layer.subscribe();
        tokio::spawn(async move { holder.run(events).await })
    };

    // Phone side: one sync pass
    let producer = SnapshotProducer::new(store, layer.clone(), &config.sync);
    match producer.sync_today(Utc::now()) {
        Ok(SyncOutcome::Sent { delivery, .. }) => {
            let status = delivery.confirm().await;
            tracing::info!("Watch delivery: {:?}", status);
        }
        Ok(SyncOutcome::NoData) => tracing::info!("No forecast for today; watch left as is"),
        Err(e) => {
            let err = AppError::from(e);
            tracing::error!("Sync failed: {}", err);
            println!("{}", err.user_message());
        }
    }

    drop(producer);
    drop(layer);
    listener.await.context("Forecast listener panicked")?;

    let face = WatchFace::new(
        holder.subscribe(),
        config.watch_face.interactive_update_ms,
        config.watch_face.temperature_unit,
    );
    let frame = face.frame_at(&chrono::Local::now(), FaceMode::interactive());

    println!("Sunshine - Wear Forecast Sync");
    println!("  Database: {}", config.database_path().display());
    println!("  {}", frame.time_text);
    println!("  {}", frame.date_text);
    match frame.weather {
        Some(glyph) => println!(
            "  {} ({})  {} / {}",
            glyph.icon.description(),
            glyph.icon.icon_name(),
            glyph.high,
            glyph.low
        ),
        None => println!("  No weather data"),
    }

    Ok(())
}

/// Put a week of sample forecast in an empty store so the demo has something to send
fn seed_if_empty(store: &mut ForecastStore) -> Result<()> {
    if store.count()? > 0 {
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let codes = [800, 801, 500, 211, 600, 741, 803];
    let entries: Vec<ForecastEntry> = codes
        .iter()
        .enumerate()
        .map(|(offset, &code)| {
            let day = today + Duration::days(offset as i64);
            let base = 18.0 - offset as f64;
            ForecastEntry::new(date_key(day), code, base + 6.0, base - 3.0)
        })
        .collect();

    let count = store.replace_all(&entries)?;
    tracing::info!("Seeded forecast store with {} sample days", count);
    Ok(())
}
