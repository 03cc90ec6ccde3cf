//! `weather-proxy` - backend proxy for weather, forecasts and city autocomplete
//!
//! Shields clients from the upstream provider's API shape, key management
//! and rate limits. The library exposes the request pipeline (gate,
//! validation, upstream client, forecast normalization, error mapping) so
//! it can be driven without a network listener.

pub mod api;
pub mod cities;
pub mod config;
pub mod error;
pub mod forecast;
pub mod models;
pub mod rate_limit;
pub mod telemetry;
pub mod upstream;
pub mod validation;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use cities::{CitySearch, GeoDbClient};
pub use config::ProxyConfig;
pub use error::{ErrorKind, ProxyError};
pub use forecast::DailyForecastNormalizer;
pub use models::{DailyForecast, ForecastPoint, ForecastSeries, WeatherQuery, WeatherSnapshot};
pub use rate_limit::{Decision, FixedWindowLimiter, RequestGate};
pub use upstream::{OpenWeatherClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ProxyError>;
