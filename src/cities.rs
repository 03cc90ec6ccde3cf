//! City autocomplete backed by the GeoDB Cities API on RapidAPI
//!
//! A thin pass-through: the prefix is forwarded, the answer is reshaped into
//! `"City, CC"` strings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::ProxyConfig;
use crate::{ProxyError, Result};

/// Maximum number of suggestions requested upstream
pub const SUGGESTION_LIMIT: u32 = 5;

#[async_trait]
pub trait CitySearch: Send + Sync {
    /// Suggestions for an already validated prefix, most populous first
    async fn suggest(&self, prefix: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct GeoDbResponse {
    data: Vec<GeoDbCity>,
}

#[derive(Debug, Deserialize)]
struct GeoDbCity {
    city: String,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

impl GeoDbCity {
    fn label(&self) -> String {
        match self.country_code.as_deref() {
            Some(code) if !code.is_empty() => format!("{}, {}", self.city, code),
            _ => self.city.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GeoDbClient {
    client: Client,
    base_url: String,
    host: String,
    api_key: Option<String>,
}

impl GeoDbClient {
    pub fn new(host: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let host = host.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("https://{host}"),
            host,
            api_key,
        })
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        let api_key = config
            .rapidapi_key
            .clone()
            .filter(|key| !key.trim().is_empty());
        Self::new(&config.geodb_host, api_key, config.upstream_timeout())
    }

    /// Point the client at a different origin, keeping the RapidAPI host header
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl CitySearch for GeoDbClient {
    #[instrument(skip(self))]
    async fn suggest(&self, prefix: &str) -> Result<Vec<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProxyError::internal("RAPIDAPI_KEY is not configured"))?;

        let limit = SUGGESTION_LIMIT.to_string();
        let response = self
            .client
            .get(format!("{}/v1/geo/cities", self.base_url))
            .query(&[
                ("namePrefix", prefix),
                ("limit", limit.as_str()),
                ("sort", "-population"),
            ])
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", &self.host)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::upstream_failure(format!(
                "GeoDB returned {status}"
            )));
        }

        let bytes = response.bytes().await?;
        let payload: GeoDbResponse = serde_json::from_slice(&bytes)?;
        debug!("GeoDB returned {} cities", payload.data.len());

        Ok(payload.data.iter().map(GeoDbCity::label).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GeoDbClient {
        GeoDbClient::new(
            "wft-geo-db.p.rapidapi.com",
            api_key.map(str::to_string),
            Duration::from_secs(8),
        )
        .unwrap()
        .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_suggestions_are_reshaped() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geo/cities"))
            .and(query_param("namePrefix", "Lon"))
            .and(query_param("limit", "5"))
            .and(query_param("sort", "-population"))
            .and(header("X-RapidAPI-Key", "rapid_key"))
            .and(header("X-RapidAPI-Host", "wft-geo-db.p.rapidapi.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": 1, "city": "London", "countryCode": "GB", "population": 8_900_000},
                    {"id": 2, "city": "Long Beach", "countryCode": "US"},
                    {"id": 3, "city": "Londrina", "countryCode": null},
                    {"id": 4, "city": "Nowhere"}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let suggestions = client_for(&mock_server, Some("rapid_key"))
            .suggest("Lon")
            .await
            .unwrap();

        assert_eq!(
            suggestions,
            ["London, GB", "Long Beach, US", "Londrina", "Nowhere"]
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_internal() {
        let mock_server = MockServer::start().await;

        let err = client_for(&mock_server, None)
            .suggest("Lon")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/geo/cities"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server, Some("rapid_key"))
            .suggest("Par")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    }
}
