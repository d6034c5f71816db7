use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ICON_URL_TEMPLATE: &str = "https://openweathermap.org/img/wn/{icon}@2x.png";

/// A geocoding candidate. Identity is whatever the provider returned; duplicates are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    /// State or province; empty when the provider has none.
    pub region: String,
}

impl City {
    /// "Paris, Île-de-France, FR", skipping an empty region.
    pub fn display_name(&self) -> String {
        if self.region.is_empty() {
            format!("{}, {}", self.name, self.country)
        } else {
            format!("{}, {}, {}", self.name, self.region, self.country)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub summary: String,
    pub icon_id: String,
}

impl WeatherCondition {
    pub fn icon_url(&self) -> String {
        ICON_URL_TEMPLATE.replace("{icon}", &self.icon_id)
    }
}

/// One point-in-time reading, in imperial units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Never empty; the first entry is authoritative.
    pub conditions: Vec<WeatherCondition>,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: i32,
    pub humidity: i32,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn primary_condition(&self) -> Option<&WeatherCondition> {
        self.conditions.first()
    }
}

/// Outcome of one asynchronous lookup as seen by observers.
///
/// `Loading` doubles as the initial value: there is no separate "never queried" state.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkResult<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> Default for NetworkResult<T> {
    fn default() -> Self {
        NetworkResult::Loading
    }
}

impl<T> NetworkResult<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, NetworkResult::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            NetworkResult::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            NetworkResult::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> NetworkResult<U> {
        match self {
            NetworkResult::Loading => NetworkResult::Loading,
            NetworkResult::Success(value) => NetworkResult::Success(f(value)),
            NetworkResult::Error(message) => NetworkResult::Error(message),
        }
    }
}
