//! Forecast normalization
//!
//! Collapses the provider's multi-point-per-day series into one
//! representative point per calendar date. The first point seen for a date
//! wins; the series is assumed to be time-ordered and is never re-sorted.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::models::{DailyForecast, ForecastPoint};

/// Number of distinct days returned by the forecast route
pub const FORECAST_DAYS: usize = 5;

/// Groups forecast points into daily representatives.
///
/// Calendar dates are computed in an explicit time zone rather than the
/// host's local one.
#[derive(Debug, Clone, Copy)]
pub struct DailyForecastNormalizer {
    timezone: Tz,
    max_days: usize,
}

impl Default for DailyForecastNormalizer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl DailyForecastNormalizer {
    #[must_use]
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            max_days: FORECAST_DAYS,
        }
    }

    #[must_use]
    pub fn with_max_days(mut self, max_days: usize) -> Self {
        self.max_days = max_days;
        self
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Calendar date of a unix timestamp in the configured zone
    #[must_use]
    pub fn date_of(&self, timestamp: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(timestamp, 0)
            .map(|utc| utc.with_timezone(&self.timezone).date_naive())
    }

    /// Keep the first point of each date, at most `max_days` dates, in the
    /// order the dates were first encountered.
    #[must_use]
    pub fn normalize(&self, points: Vec<ForecastPoint>) -> Vec<DailyForecast> {
        let total = points.len();
        let mut seen = HashSet::with_capacity(self.max_days);
        let mut daily = Vec::with_capacity(self.max_days);

        for point in points {
            if daily.len() >= self.max_days {
                break;
            }

            let Some(date) = self.date_of(point.dt) else {
                warn!(dt = point.dt, "Skipping forecast point with out-of-range timestamp");
                continue;
            };

            if seen.insert(date) {
                daily.push(DailyForecast { date, point });
            }
        }

        debug!(
            "Collapsed {} forecast points into {} days ({})",
            total,
            daily.len(),
            self.timezone
        );

        daily
    }
}
