use std::sync::Arc;

use crate::{
    model::{City, Coordinates, NetworkResult, WeatherSnapshot},
    provider::WeatherService,
};

/// Maximum number of geocoding candidates requested per search.
pub const SEARCH_LIMIT: u8 = 5;

/// The only error message callers ever see; causes are logged, not surfaced.
pub const NOT_FOUND: &str = "Not found";

/// Wraps a [`WeatherService`] and turns every outcome into a [`NetworkResult`].
///
/// Single attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct WeatherRepository {
    service: Arc<dyn WeatherService>,
}

impl WeatherRepository {
    pub fn new(service: Arc<dyn WeatherService>) -> Self {
        Self { service }
    }

    /// An empty `Success` means "no match" and is not an error.
    pub async fn search_city(&self, query: &str) -> NetworkResult<Vec<City>> {
        match self.service.geocode(query, SEARCH_LIMIT).await {
            Ok(cities) => {
                tracing::debug!(query, count = cities.len(), "city search finished");
                NetworkResult::Success(cities)
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "city search failed");
                NetworkResult::Error(NOT_FOUND.to_string())
            }
        }
    }

    pub async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> NetworkResult<WeatherSnapshot> {
        let coords = Coordinates { latitude, longitude };
        match self.service.current_weather(coords).await {
            Ok(snapshot) => {
                let temp = snapshot.temperature;
                tracing::debug!(latitude, longitude, temp, "weather fetched");
                NetworkResult::Success(snapshot)
            }
            Err(err) => {
                tracing::warn!(latitude, longitude, error = %err, "weather fetch failed");
                NetworkResult::Error(NOT_FOUND.to_string())
            }
        }
    }

    /// Failures are logged and reported as `None`.
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Option<String> {
        let coords = Coordinates { latitude, longitude };
        match self.service.reverse_geocode(coords).await {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(latitude, longitude, error = %err, "reverse geocode failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use chrono::Utc;

    #[derive(Debug)]
    struct Broken;

    #[async_trait]
    impl WeatherService for Broken {
        async fn geocode(&self, _query: &str, _limit: u8) -> Result<Vec<City>, ApiError> {
            Err(ApiError::Empty("geocode"))
        }

        async fn reverse_geocode(&self, _coords: Coordinates) -> Result<Option<String>, ApiError> {
            Err(ApiError::Empty("reverse geocode"))
        }

        async fn current_weather(&self, _coords: Coordinates) -> Result<WeatherSnapshot, ApiError> {
            Err(ApiError::Empty("weather"))
        }
    }

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl WeatherService for Echo {
        async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<City>, ApiError> {
            Ok((0..limit)
                .map(|i| City {
                    name: format!("{query}{i}"),
                    latitude: f64::from(i),
                    longitude: 0.0,
                    country: "XX".into(),
                    region: String::new(),
                })
                .collect())
        }

        async fn reverse_geocode(&self, _coords: Coordinates) -> Result<Option<String>, ApiError> {
            Ok(Some("Here".into()))
        }

        async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, ApiError> {
            Ok(WeatherSnapshot {
                conditions: vec![],
                temperature: coords.latitude,
                temp_min: 0.0,
                temp_max: 0.0,
                pressure: 0,
                humidity: 0,
                fetched_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn errors_collapse_to_not_found() {
        let repo = WeatherRepository::new(Arc::new(Broken));

        assert_eq!(repo.search_city("x").await, NetworkResult::Error(NOT_FOUND.into()));
        assert_eq!(repo.fetch_weather(1.0, 2.0).await.error_message(), Some(NOT_FOUND));
        assert_eq!(repo.reverse_geocode(1.0, 2.0).await, None);
    }

    #[tokio::test]
    async fn search_requests_fixed_limit() {
        let repo = WeatherRepository::new(Arc::new(Echo));

        let cities = repo.search_city("Springfield").await;
        let cities = cities.success().expect("search should succeed");
        assert_eq!(cities.len(), usize::from(SEARCH_LIMIT));
        assert_eq!(cities[0].name, "Springfield0");
    }

    #[tokio::test]
    async fn fetch_weather_passes_coordinates_through() {
        let repo = WeatherRepository::new(Arc::new(Echo));

        let snapshot = repo.fetch_weather(12.5, 0.0).await;
        assert_eq!(snapshot.success().map(|s| s.temperature), Some(12.5));
        assert_eq!(repo.reverse_geocode(0.0, 0.0).await.as_deref(), Some("Here"));
    }
}
