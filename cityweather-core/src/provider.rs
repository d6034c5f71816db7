use crate::{
    Config,
    error::ApiError,
    model::{City, Coordinates, WeatherSnapshot},
    provider::openweather::OpenWeatherClient,
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Remote lookups the app depends on. Implementations make exactly one attempt per call.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    /// Resolve a free-text place name to at most `limit` candidates.
    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<City>, ApiError>;

    /// Resolve coordinates to a locality name, if the provider knows one.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>, ApiError>;

    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, ApiError>;
}

/// Construct the OpenWeather client from config.
pub fn service_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherService>> {
    let api_key = config.require_api_key()?;

    let mut builder = Client::builder();
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    let http = builder.build().context("Failed to build HTTP client")?;

    let client = OpenWeatherClient::new(api_key.to_owned())
        .with_base_urls(&config.api_base_url, &config.geo_base_url)
        .with_http_client(http);

    Ok(Arc::new(client))
}
