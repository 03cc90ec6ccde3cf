//! HTTP routes of the proxy
//!
//! Request flow: request gate, input validation, upstream call, optional
//! forecast normalization. Every failure leaves through [`ProxyError`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::info;

use crate::cities::CitySearch;
use crate::error::{ErrorBody, ROUTE_NOT_FOUND};
use crate::forecast::DailyForecastNormalizer;
use crate::models::{ForecastResponse, WeatherSnapshot};
use crate::rate_limit::{self, RequestGate};
use crate::upstream::WeatherProvider;
use crate::validation::{INVALID_CITY, INVALID_QUERY, validate_city, validate_city_prefix};
use crate::{ProxyError, Result};

/// Shared, read-only dependencies of every handler
#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<dyn WeatherProvider>,
    pub cities: Arc<dyn CitySearch>,
    pub normalizer: DailyForecastNormalizer,
}

impl AppState {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        cities: Arc<dyn CitySearch>,
        normalizer: DailyForecastNormalizer,
    ) -> Self {
        Self {
            weather,
            cities,
            normalizer,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CitiesParams {
    pub query: Option<String>,
}

/// Routes plus the request gate. The gate also covers unmatched paths.
pub fn router(state: AppState, gate: Arc<dyn RequestGate>) -> Router {
    let api = Router::new()
        .route("/weather/{city}", get(current_weather))
        .route("/forecast/{city}", get(forecast))
        .route("/cities", get(cities));

    Router::new()
        .nest("/api", api)
        .fallback(route_not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(gate, rate_limit::enforce))
}

async fn current_weather(
    State(state): State<AppState>,
    city: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<WeatherSnapshot>> {
    let Path(city) = city.map_err(|_| ProxyError::invalid_input(INVALID_CITY))?;
    let query = validate_city(&city)?;

    let snapshot = state.weather.current_weather(&query).await?;
    info!(city = query.city(), "Served current weather");

    Ok(Json(snapshot))
}

async fn forecast(
    State(state): State<AppState>,
    city: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<ForecastResponse>> {
    let Path(city) = city.map_err(|_| ProxyError::invalid_input(INVALID_CITY))?;
    let query = validate_city(&city)?;

    let series = state.weather.forecast(&query).await?;
    let list = state.normalizer.normalize(series.list);
    info!(city = query.city(), days = list.len(), "Served forecast");

    Ok(Json(ForecastResponse {
        city: series.city,
        list,
    }))
}

async fn cities(
    State(state): State<AppState>,
    params: std::result::Result<Query<CitiesParams>, QueryRejection>,
) -> Result<Json<Vec<String>>> {
    let Query(params) = params.map_err(|_| ProxyError::invalid_input(INVALID_QUERY))?;
    let prefix = validate_city_prefix(params.query.as_deref())?;

    let suggestions = state.cities.suggest(&prefix).await?;

    Ok(Json(suggestions))
}

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new(ROUTE_NOT_FOUND)))
}
