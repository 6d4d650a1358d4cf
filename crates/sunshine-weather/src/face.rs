//! Watch face model: what to draw and when to redraw it.
//!
//! Drawing itself belongs to the platform; this module decides the text and
//! glyph for each frame and drives the redraw loop.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use std::time::Duration;
use sunshine_core::TemperatureUnit;
use tokio::sync::watch;

use crate::types::{ForecastSnapshot, IconCategory};

/// Ambient displays only refresh on the minute
pub const AMBIENT_UPDATE_MS: u64 = 60_000;

/// Display state reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceMode {
    pub visible: bool,
    pub ambient: bool,
    /// Display supports fewer bits per color while ambient
    pub low_bit_ambient: bool,
}

impl FaceMode {
    pub fn interactive() -> Self {
        Self {
            visible: true,
            ambient: false,
            low_bit_ambient: false,
        }
    }

    /// The per-second timer only runs while visible and interactive
    pub fn should_timer_run(&self) -> bool {
        self.visible && !self.ambient
    }

    pub fn anti_alias(&self) -> bool {
        !(self.ambient && self.low_bit_ambient)
    }

    /// Tick interval for this mode: `interactive_ms` while interactive, once a
    /// minute while ambient, none while hidden
    pub fn redraw_interval_ms(&self, interactive_ms: u64) -> Option<u64> {
        match (self.visible, self.ambient) {
            (false, _) => None,
            (true, false) => Some(interactive_ms),
            (true, true) => Some(AMBIENT_UPDATE_MS),
        }
    }
}

/// Time until the next whole multiple of `rate_ms`
pub fn delay_until_next_tick(now_ms: i64, rate_ms: u64) -> Duration {
    let rate = rate_ms.max(1) as i64;
    Duration::from_millis((rate - now_ms.rem_euclid(rate)) as u64)
}

pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let value = match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.0,
    };
    format!("{:.0}\u{00B0}", value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherGlyph {
    pub icon: IconCategory,
    pub high: String,
    pub low: String,
}

impl WeatherGlyph {
    /// `None` for codes the face has no glyph for
    pub fn from_snapshot(snapshot: &ForecastSnapshot, unit: TemperatureUnit) -> Option<Self> {
        let icon = snapshot.icon();
        if !icon.is_known() {
            return None;
        }
        Some(Self {
            icon,
            high: format_temperature(snapshot.high_temperature, unit),
            low: format_temperature(snapshot.low_temperature, unit),
        })
    }
}

/// Everything needed to paint one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceFrame {
    /// `H:MM` on a 12-hour dial, hour 0 through 11
    pub time_text: String,
    /// e.g. `SAT, JUN 1 2024`
    pub date_text: String,
    pub weather: Option<WeatherGlyph>,
    pub ambient: bool,
    pub anti_alias: bool,
}

impl FaceFrame {
    pub fn compose<Tz: TimeZone>(
        now: &DateTime<Tz>,
        mode: FaceMode,
        snapshot: Option<ForecastSnapshot>,
        unit: TemperatureUnit,
    ) -> Self {
        let time_text = format!("{}:{:02}", now.hour() % 12, now.minute());
        let date_text = format!(
            "{}, {} {} {}",
            now.weekday(),
            month_abbrev(now.month()),
            now.day(),
            now.year()
        )
        .to_uppercase();

        Self {
            time_text,
            date_text,
            weather: snapshot.and_then(|s| WeatherGlyph::from_snapshot(&s, unit)),
            ambient: mode.ambient,
            anti_alias: mode.anti_alias(),
        }
    }
}

fn month_abbrev(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// Redraw loop for the digital face
pub struct WatchFace {
    snapshots: watch::Receiver<Option<ForecastSnapshot>>,
    update_rate_ms: u64,
    unit: TemperatureUnit,
}

impl WatchFace {
    pub fn new(
        snapshots: watch::Receiver<Option<ForecastSnapshot>>,
        update_rate_ms: u64,
        unit: TemperatureUnit,
    ) -> Self {
        Self {
            snapshots,
            update_rate_ms,
            unit,
        }
    }

    /// Frame for `now` using the currently held snapshot
    pub fn frame_at<Tz: TimeZone>(&self, now: &DateTime<Tz>, mode: FaceMode) -> FaceFrame {
        let snapshot = *self.snapshots.borrow();
        FaceFrame::compose(now, mode, snapshot, self.unit)
    }

    /// Redraw on each aligned tick (every `update_rate_ms` while interactive,
    /// every minute while ambient), on every snapshot change and on every mode
    /// change, until `shutdown` turns true.
    pub async fn run<F>(
        mut self,
        mut modes: watch::Receiver<FaceMode>,
        mut shutdown: watch::Receiver<bool>,
        mut draw: F,
    ) where
        F: FnMut(&FaceFrame),
    {
        let rate_ms = self.update_rate_ms;
        // Wall time anchored to the runtime clock, so ticks follow tokio's timer
        let anchor_ms = Utc::now().timestamp_millis();
        let anchor = tokio::time::Instant::now();
        let mut snapshots_open = true;
        draw(&self.frame_at(&Local::now(), *modes.borrow()));

        loop {
            let mode = *modes.borrow();
            let tick = async move {
                match mode.redraw_interval_ms(rate_ms) {
                    Some(interval) => {
                        let now_ms = anchor_ms + anchor.elapsed().as_millis() as i64;
                        tokio::time::sleep(delay_until_next_tick(now_ms, interval)).await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = tick => {}
                changed = self.snapshots.changed(), if snapshots_open => {
                    if changed.is_err() {
                        tracing::debug!("Forecast holder dropped; face keeps last snapshot");
                        snapshots_open = false;
                        continue;
                    }
                }
                changed = modes.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Mode source dropped, stopping face");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let mode = *modes.borrow();
            draw(&self.frame_at(&Local::now(), mode));
        }

        tracing::info!("Watch face loop stopped");
    }
}
