//! SQLite-backed store for the daily forecast.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::types::{ForecastEntry, WeatherError};

/// Anything that can answer "what is the forecast for this day"
pub trait ForecastSource {
    /// Most recently stored forecast whose normalized date equals `date`
    fn forecast_for_date(&self, date: i64) -> Result<Option<ForecastEntry>, WeatherError>;
}

/// SQLite forecast table, one row per day and sync
pub struct ForecastStore {
    conn: Connection,
}

impl ForecastStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WeatherError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self, WeatherError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), WeatherError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                date INTEGER NOT NULL,
                weather_id INTEGER NOT NULL,
                max REAL NOT NULL,
                min REAL NOT NULL,
                humidity REAL,
                pressure REAL,
                wind REAL,
                degrees REAL
            );

            CREATE INDEX IF NOT EXISTS idx_weather_date ON weather(date);
            "#,
        )?;
        Ok(())
    }

    /// Insert a single forecast row, returning its id.
    pub fn insert(&self, entry: &ForecastEntry) -> Result<i64, WeatherError> {
        Self::insert_with(&self.conn, entry)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Replace the whole forecast with `entries` in one transaction.
    ///
    /// A sync always brings a complete forecast, so old rows are dropped first.
    pub fn replace_all(&mut self, entries: &[ForecastEntry]) -> Result<usize, WeatherError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM weather", [])?;
        for entry in entries {
            Self::insert_with(&tx, entry)?;
        }
        tx.commit()?;

        tracing::debug!("Replaced forecast with {} rows", entries.len());
        Ok(entries.len())
    }

    fn insert_with(conn: &Connection, entry: &ForecastEntry) -> Result<(), WeatherError> {
        conn.execute(
            r#"
            INSERT INTO weather (date, weather_id, max, min, humidity, pressure, wind, degrees)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.date,
                entry.weather_id,
                entry.max_temp,
                entry.min_temp,
                entry.humidity,
                entry.pressure,
                entry.wind_speed,
                entry.degrees,
            ],
        )?;
        Ok(())
    }

    /// Delete every row dated before `date`, returning how many were removed.
    pub fn delete_before(&self, date: i64) -> Result<usize, WeatherError> {
        let count = self
            .conn
            .execute("DELETE FROM weather WHERE date < ?1", params![date])?;
        Ok(count)
    }

    pub fn count(&self) -> Result<u32, WeatherError> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM weather", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<ForecastEntry> {
        Ok(ForecastEntry {
            id: Some(row.get(0)?),
            date: row.get(1)?,
            weather_id: row.get(2)?,
            max_temp: row.get(3)?,
            min_temp: row.get(4)?,
            humidity: row.get(5)?,
            pressure: row.get(6)?,
            wind_speed: row.get(7)?,
            degrees: row.get(8)?,
        })
    }
}

impl ForecastSource for ForecastStore {
    fn forecast_for_date(&self, date: i64) -> Result<Option<ForecastEntry>, WeatherError> {
        let entry = self
            .conn
            .query_row(
                r#"
                SELECT _id, date, weather_id, max, min, humidity, pressure, wind, degrees
                FROM weather
                WHERE date = ?1
                ORDER BY _id DESC
                LIMIT 1
                "#,
                params![date],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }
}
