//! Typed key-value bundles carried over the phone-to-watch data channel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ForecastSnapshot, WeatherError};

/// Condition code entry (int)
pub const WEATHER_ID: &str = "WEATHER_ID";
/// Today's high temperature entry (double)
pub const HIGH_TEMP: &str = "HIGH_TEMP";
/// Today's low temperature entry (double)
pub const LOW_TEMP: &str = "LOW_TEMP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DataValue {
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

impl DataValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataMap {
    entries: BTreeMap<String, DataValue>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) -> &mut Self {
        self.entries.insert(key.into(), DataValue::Int(value));
        self
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.entries.insert(key.into(), DataValue::Long(value));
        self
    }

    pub fn put_double(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.entries.insert(key.into(), DataValue::Double(value));
        self
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), DataValue::String(value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.entries.get(key)
    }

    /// Int entry, or `None` if absent or of another type
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.entries.get(key) {
            Some(DataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(DataValue::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn require_int(&self, key: &'static str) -> Result<i32, WeatherError> {
        match self.entries.get(key) {
            Some(DataValue::Int(v)) => Ok(*v),
            Some(other) => Err(WeatherError::WrongType {
                key,
                expected: "int",
                found: other.type_name(),
            }),
            None => Err(WeatherError::MissingField(key)),
        }
    }

    fn require_double(&self, key: &'static str) -> Result<f64, WeatherError> {
        match self.entries.get(key) {
            Some(DataValue::Double(v)) => Ok(*v),
            Some(other) => Err(WeatherError::WrongType {
                key,
                expected: "double",
                found: other.type_name(),
            }),
            None => Err(WeatherError::MissingField(key)),
        }
    }
}

/// A data item: a bundle addressed by a path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    pub path: String,
    pub data_map: DataMap,
}

impl DataItem {
    pub fn new(path: impl Into<String>, data_map: DataMap) -> Self {
        Self {
            path: path.into(),
            data_map,
        }
    }
}

/// Request to publish a data item
#[derive(Debug, Clone, PartialEq)]
pub struct PutDataRequest {
    pub item: DataItem,
    /// Expedite delivery instead of letting the data layer batch it
    pub urgent: bool,
}

impl PutDataRequest {
    pub fn new(path: impl Into<String>, data_map: DataMap) -> Self {
        Self {
            item: DataItem::new(path, data_map),
            urgent: false,
        }
    }

    pub fn set_urgent(mut self) -> Self {
        self.urgent = true;
        self
    }
}

/// Change notification delivered to data listeners
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    Changed(DataItem),
    Deleted { path: String },
}

impl DataEvent {
    pub fn path(&self) -> &str {
        match self {
            Self::Changed(item) => &item.path,
            Self::Deleted { path } => path,
        }
    }
}

/// Events are handed to listeners in batches
pub type DataEventBuffer = Vec<DataEvent>;

impl ForecastSnapshot {
    /// Pack into the three-entry bundle the watch expects
    pub fn to_data_map(&self) -> DataMap {
        let mut map = DataMap::new();
        map.put_int(WEATHER_ID, self.condition_code)
            .put_double(HIGH_TEMP, self.high_temperature)
            .put_double(LOW_TEMP, self.low_temperature);
        map
    }

    /// Unpack a bundle; every entry must be present with the right type.
    pub fn from_data_map(map: &DataMap) -> Result<Self, WeatherError> {
        Ok(Self {
            condition_code: map.require_int(WEATHER_ID)?,
            high_temperature: map.require_double(HIGH_TEMP)?,
            low_temperature: map.require_double(LOW_TEMP)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_packs_three_entries() {
        let map = ForecastSnapshot::new(500, 75.0, 60.0).to_data_map();

        assert_eq!(map.len(), 3);
        assert_eq!(map.get_int(WEATHER_ID), Some(500));
        assert_eq!(map.get_double(HIGH_TEMP), Some(75.0));
        assert_eq!(map.get_double(LOW_TEMP), Some(60.0));
    }

    #[test]
    fn test_unpack_missing_field() {
        let mut map = DataMap::new();
        map.put_int(WEATHER_ID, 800).put_double(HIGH_TEMP, 20.0);

        let err = ForecastSnapshot::from_data_map(&map).unwrap_err();
        assert!(matches!(err, WeatherError::MissingField(LOW_TEMP)));
    }

    #[test]
    fn test_unpack_wrong_type() {
        let mut map = DataMap::new();
        map.put_long(WEATHER_ID, 800)
            .put_double(HIGH_TEMP, 20.0)
            .put_double(LOW_TEMP, 10.0);

        let err = ForecastSnapshot::from_data_map(&map).unwrap_err();
        assert!(matches!(
            err,
            WeatherError::WrongType {
                key: WEATHER_ID,
                expected: "int",
                found: "long",
            }
        ));
    }

    #[test]
    fn test_typed_getters_reject_other_types() {
        let mut map = DataMap::new();
        map.put_string("city", "Mountain View").put_int("count", 3);

        assert_eq!(map.get_int("city"), None);
        assert_eq!(map.get_double("count"), None);
        assert_eq!(map.get("city"), Some(&DataValue::String("Mountain View".into())));
    }

    #[test]
    fn test_put_request_urgent_flag() {
        let request = PutDataRequest::new("/weather_watch", DataMap::new());
        assert!(!request.urgent);
        assert!(request.set_urgent().urgent);
    }

    #[test]
    fn test_event_path() {
        let deleted = DataEvent::Deleted {
            path: "/weather_watch".into(),
        };
        assert_eq!(deleted.path(), "/weather_watch");
    }
}
