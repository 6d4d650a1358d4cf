use serde::{Deserialize, Serialize};
use sunshine_core::{AppError, RusqliteErrorExt, SyncError};

/// Icon categories the watch face can draw, mapped from OpenWeatherMap
/// condition codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Storm,
    LightRain,
    Rain,
    Snow,
    Fog,
    Clear,
    LightClouds,
    Cloudy,
    Unknown,
}

impl IconCategory {
    /// Classify an OpenWeatherMap condition code.
    /// See: https://openweathermap.org/weather-conditions
    ///
    /// Arms are checked top to bottom. 761 falls in the fog range before it
    /// reaches the storm arm, so it classifies as fog.
    pub fn from_condition_code(code: i32) -> Self {
        match code {
            200..=232 => Self::Storm,
            300..=321 => Self::LightRain,
            500..=504 => Self::Rain,
            511 => Self::Snow,
            520..=531 => Self::Rain,
            600..=622 => Self::Snow,
            701..=761 => Self::Fog,
            #[allow(unreachable_patterns)]
            761 | 781 => Self::Storm,
            800 => Self::Clear,
            801 => Self::LightClouds,
            802..=804 => Self::Cloudy,
            _ => Self::Unknown,
        }
    }

    /// Whether the face has a glyph for this category
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Drawable identifier for the category
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Storm => "ic_storm",
            Self::LightRain => "ic_light_rain",
            Self::Rain => "ic_rain",
            Self::Snow => "ic_snow",
            Self::Fog => "ic_fog",
            Self::Clear => "ic_clear",
            Self::LightClouds => "ic_light_clouds",
            Self::Cloudy => "ic_cloudy",
            Self::Unknown => "ic_unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Storm => "Storm",
            Self::LightRain => "Light Rain",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Fog => "Fog",
            Self::Clear => "Clear",
            Self::LightClouds => "Light Clouds",
            Self::Cloudy => "Cloudy",
            Self::Unknown => "Unknown",
        }
    }
}

/// The condensed forecast the phone hands to the watch.
///
/// There is no timestamp or version: whichever snapshot arrives last wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub condition_code: i32,
    pub high_temperature: f64,
    pub low_temperature: f64,
}

impl ForecastSnapshot {
    pub fn new(condition_code: i32, high_temperature: f64, low_temperature: f64) -> Self {
        Self {
            condition_code,
            high_temperature,
            low_temperature,
        }
    }

    pub fn icon(&self) -> IconCategory {
        IconCategory::from_condition_code(self.condition_code)
    }
}

impl From<&ForecastEntry> for ForecastSnapshot {
    fn from(entry: &ForecastEntry) -> Self {
        Self::new(entry.weather_id, entry.max_temp, entry.min_temp)
    }
}

/// A persisted daily forecast row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Row id assigned by the store; `None` before insertion
    pub id: Option<i64>,
    /// UTC midnight of the forecast day, in epoch milliseconds
    pub date: i64,
    pub weather_id: i32,
    /// Temperatures are stored in Celsius
    pub max_temp: f64,
    pub min_temp: f64,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Wind direction in meteorological degrees
    pub degrees: Option<f64>,
}

impl ForecastEntry {
    pub fn new(date: i64, weather_id: i32, max_temp: f64, min_temp: f64) -> Self {
        Self {
            id: None,
            date,
            weather_id,
            max_temp,
            min_temp,
            humidity: None,
            pressure: None,
            wind_speed: None,
            degrees: None,
        }
    }
}

/// Weather sync errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("Missing data map entry: {0}")]
    MissingField(&'static str),
    #[error("Data map entry {key} is a {found}, expected {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Data channel closed")]
    ChannelClosed,
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Store(err) => AppError::Database(err.into_database_error()),
            WeatherError::MissingField(_) | WeatherError::WrongType { .. } => {
                AppError::Sync(SyncError::MalformedItem(e.to_string()))
            }
            WeatherError::Delivery(reason) => AppError::Sync(SyncError::DeliveryFailed(reason)),
            WeatherError::ChannelClosed => AppError::Sync(SyncError::ChannelClosed),
        }
    }
}
