use async_trait::async_trait;

use crate::{model::Coordinates, repository::WeatherRepository};

/// Device location capability. The controller only records what this reports.
#[async_trait]
pub trait LocationProvider: Send + Sync + std::fmt::Debug {
    async fn has_permission(&self) -> bool;

    /// Ask the user for permission. Resolves once they have answered.
    async fn request_permission(&self) -> bool;

    async fn last_known_location(&self) -> Option<Coordinates>;

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// Location from configuration instead of a sensor.
///
/// Permission counts as granted exactly when coordinates were configured; there
/// is nobody to ask, so requesting it again gives the same answer. Reverse
/// geocoding goes through the provider's reverse lookup.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    coords: Option<Coordinates>,
    repository: WeatherRepository,
}

impl StaticLocationProvider {
    pub fn new(coords: Option<Coordinates>, repository: WeatherRepository) -> Self {
        Self { coords, repository }
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn has_permission(&self) -> bool {
        self.coords.is_some()
    }

    async fn request_permission(&self) -> bool {
        self.coords.is_some()
    }

    async fn last_known_location(&self) -> Option<Coordinates> {
        self.coords
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Option<String> {
        self.repository.reverse_geocode(latitude, longitude).await
    }
}
