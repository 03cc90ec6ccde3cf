//! Data models for weather information and API responses
//!
//! The upstream payloads are only partially typed: the fields the proxy
//! relies on are named, everything else the provider sends along is kept
//! verbatim so the client sees the provider's full record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A validated city lookup. Only produced by [`crate::validation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    city: String,
}

impl WeatherQuery {
    pub(crate) fn new(city: String) -> Self {
        Self { city }
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }
}

/// Normalized current weather for a city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Location name as resolved by the provider
    pub name: String,
    pub main: MainReadings,
    pub weather: Vec<WeatherCondition>,
    pub wind: Wind,
}

/// Temperature, humidity and pressure bundle
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MainReadings {
    /// Temperature in Celsius
    pub temp: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// `feels_like`, `temp_min`, `temp_max`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Weather condition descriptor (`id`, `main`, `description`, `icon`)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherCondition {
    pub id: i64,
    pub main: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Wind {
    /// Wind speed in m/s
    pub speed: f64,
    /// Wind direction in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

/// Raw forecast as delivered by the provider, ordered by timestamp
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastSeries {
    /// Provider city object, passed through untouched
    pub city: Value,
    pub list: Vec<ForecastPoint>,
}

/// One timestamped forecast entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastPoint {
    /// Unix timestamp in seconds
    pub dt: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ForecastPoint {
    #[must_use]
    pub fn new(dt: i64) -> Self {
        Self {
            dt,
            fields: Map::new(),
        }
    }
}

/// Representative forecast point for one calendar date.
///
/// Serializes as the bare point, the date is only used for de-duplication.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DailyForecast {
    #[serde(skip)]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub point: ForecastPoint,
}

/// Body of `GET /api/forecast/{city}`
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ForecastResponse {
    pub city: Value,
    pub list: Vec<DailyForecast>,
}
