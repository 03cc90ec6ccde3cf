//! Input validation for city lookups
//!
//! Runs before any upstream call so malformed input never costs provider quota.

use crate::models::WeatherQuery;
use crate::{ProxyError, Result};

pub const INVALID_CITY: &str = "Invalid city format";
pub const INVALID_QUERY: &str = "Invalid query";

/// Validate a raw city path segment for the weather and forecast routes.
///
/// Surrounding whitespace is trimmed; casing and inner spacing are left to
/// the provider.
pub fn validate_city(raw: &str) -> Result<WeatherQuery> {
    let city = raw.trim();

    if city.is_empty() {
        return Err(ProxyError::invalid_input(INVALID_CITY));
    }

    if !is_letters_and_spaces(city) {
        return Err(ProxyError::invalid_input(INVALID_CITY));
    }

    Ok(WeatherQuery::new(city.to_string()))
}

/// Validate an autocomplete prefix. Absent, blank or non-alphabetic queries
/// are rejected.
pub fn validate_city_prefix(raw: Option<&str>) -> Result<String> {
    let prefix = raw.map(str::trim).unwrap_or_default();

    if prefix.is_empty() || !is_letters_and_spaces(prefix) {
        return Err(ProxyError::invalid_input(INVALID_QUERY));
    }

    Ok(prefix.to_string())
}

fn is_letters_and_spaces(input: &str) -> bool {
    input.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}
