use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::ApiError,
    model::{City, Coordinates, WeatherCondition, WeatherSnapshot},
};

use super::WeatherService;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const DIRECT_GEOCODE_PATH: &str = "/geo/1.0/direct";
const REVERSE_GEOCODE_PATH: &str = "/geo/1.0/reverse";
const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

/// Client for the OpenWeather geocoding and current-weather endpoints.
///
/// Weather is always requested in imperial units.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    api_base: String,
    geo_base: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_base: DEFAULT_BASE_URL.to_string(),
            geo_base: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the client somewhere else (a proxy, or a mock server in tests).
    pub fn with_base_urls(mut self, api_base: &str, geo_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.geo_base = geo_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        tracing::debug!(endpoint, %url, "sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| ApiError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    #[serde(default)]
    state: Option<String>,
}

impl From<OwGeoEntry> for City {
    fn from(entry: OwGeoEntry) -> Self {
        City {
            name: entry.name,
            latitude: entry.lat,
            longitude: entry.lon,
            country: entry.country,
            region: entry.state.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    main: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: i32,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    weather: Vec<OwCondition>,
    main: OwMain,
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn geocode(&self, query: &str, limit: u8) -> Result<Vec<City>, ApiError> {
        let url = format!("{}{}", self.geo_base, DIRECT_GEOCODE_PATH);
        let limit = limit.to_string();

        let parsed: Vec<OwGeoEntry> =
            self.get_json("geocode", url, &[("q", query), ("limit", limit.as_str())]).await?;

        Ok(parsed.into_iter().map(City::from).collect())
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>, ApiError> {
        let url = format!("{}{}", self.geo_base, REVERSE_GEOCODE_PATH);
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let parsed: Vec<OwGeoEntry> = self
            .get_json(
                "reverse geocode",
                url,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("limit", "1")],
            )
            .await?;

        Ok(parsed.into_iter().next().map(|entry| entry.name))
    }

    async fn current_weather(&self, coords: Coordinates) -> Result<WeatherSnapshot, ApiError> {
        let url = format!("{}{}", self.api_base, CURRENT_WEATHER_PATH);
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let parsed: OwCurrentResponse = self
            .get_json(
                "weather",
                url,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "imperial")],
            )
            .await?;

        if parsed.weather.is_empty() {
            return Err(ApiError::Empty("weather"));
        }

        let conditions = parsed
            .weather
            .into_iter()
            .map(|w| WeatherCondition { summary: w.main, icon_id: w.icon })
            .collect();

        Ok(WeatherSnapshot {
            conditions,
            temperature: parsed.main.temp,
            temp_min: parsed.main.temp_min,
            temp_max: parsed.main.temp_max,
            pressure: parsed.main.pressure,
            humidity: parsed.main.humidity,
            fetched_at: Utc::now(),
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
