//! Upstream weather provider client
//!
//! One bounded-timeout HTTP call per request against the OpenWeatherMap
//! REST API. No retries: the first failure is classified and surfaced.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::config::ProxyConfig;
use crate::models::{ForecastSeries, WeatherQuery, WeatherSnapshot};
use crate::{ProxyError, Result};

const USER_AGENT: &str = concat!("weather-proxy/", env!("CARGO_PKG_VERSION"));

/// Unit system requested from the provider
pub const UNITS: &str = "metric";

const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Upstream resource selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

/// Source of current weather and raw forecasts for a validated city
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot>;

    async fn forecast(&self, query: &WeatherQuery) -> Result<ForecastSeries>;
}

/// OpenWeatherMap client sharing one connection pool across requests
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProxyError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        Self::new(
            &config.openweather_base_url,
            config.api_key(),
            config.upstream_timeout(),
        )
    }

    /// Perform one GET against `endpoint` for `city` and decode the body.
    #[instrument(skip(self, endpoint), fields(endpoint = endpoint.path()))]
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint, city: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        let start_time = Instant::now();

        debug!("Calling OpenWeatherMap");

        let response = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", UNITS)])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProxyError::not_found(format!(
                "OpenWeatherMap has no {} data for '{city}'",
                endpoint.path()
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::upstream_failure(format!(
                "OpenWeatherMap returned {status}: {}",
                truncate(&body, 200)
            )));
        }

        let bytes = response.bytes().await?;
        let payload = serde_json::from_slice(&bytes)?;

        let elapsed = start_time.elapsed();
        info!(
            "OpenWeatherMap {} answered in {:.3}s",
            endpoint.path(),
            elapsed.as_secs_f64()
        );
        if elapsed > SLOW_RESPONSE {
            warn!("Slow upstream response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(payload)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot> {
        self.fetch(Endpoint::Current, query.city()).await
    }

    async fn forecast(&self, query: &WeatherQuery) -> Result<ForecastSeries> {
        self.fetch(Endpoint::Forecast, query.city()).await
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::validation::validate_city;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> OpenWeatherClient {
        OpenWeatherClient::new(server.uri(), "test_key", timeout).unwrap()
    }

    fn london() -> WeatherQuery {
        validate_city("London").unwrap()
    }

    #[tokio::test]
    async fn test_current_weather_sends_metric_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "test_key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "London",
                "main": {"temp": 11.5, "humidity": 70, "pressure": 1015, "feels_like": 10.9},
                "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
                "wind": {"speed": 5.1, "deg": 240},
                "cod": 200
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(8));
        let snapshot = client.current_weather(&london()).await.unwrap();

        assert_eq!(snapshot.name, "London");
        assert_eq!(snapshot.main.temp, 11.5);
        assert_eq!(snapshot.weather.len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_ignores_provider_message() {
        let mock_server = MockServer::start().await;

        for message in ["city not found", "Nothing to geocode", ""] {
            mock_server.reset().await;
            Mock::given(method("GET"))
                .and(path("/forecast"))
                .respond_with(
                    ResponseTemplate::new(404)
                        .set_body_json(json!({"cod": "404", "message": message})),
                )
                .mount(&mock_server)
                .await;

            let client = client_for(&mock_server, Duration::from_secs(8));
            let err = client.forecast(&london()).await.unwrap_err();

            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.status(), StatusCode::NOT_FOUND);
            assert_eq!(err.user_message(), "City not found");
        }
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(8));
        let err = client.current_weather(&london()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert!(err.message().contains("401"));
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_upstream_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cod": "200"})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, Duration::from_secs(8));
        let err = client.forecast(&london()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out_within_bound() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let timeout = Duration::from_millis(200);
        let client = client_for(&mock_server, timeout);

        let started = Instant::now();
        let err = client.current_weather(&london()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamTimeout);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!err.message().contains("test_key"), "{}", err.message());
    }

    #[tokio::test]
    async fn test_connection_refused_is_upstream_failure() {
        let client =
            OpenWeatherClient::new("http://127.0.0.1:9", "SECRET_KEY_123", Duration::from_secs(2))
                .unwrap();

        let err = client.current_weather(&london()).await.unwrap_err();

        assert!(matches!(
            err.kind(),
            ErrorKind::UpstreamFailure | ErrorKind::UpstreamTimeout
        ));
        assert!(!err.message().contains("SECRET_KEY_123"), "{}", err.message());
        assert!(!err.message().contains("appid"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 200), "short");
    }
}
