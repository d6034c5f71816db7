//! Core library for the `cityweather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the `WeatherService` trait
//! - A repository that turns every lookup into a `NetworkResult`
//! - Preference and location capabilities injected into the controller
//! - The application state controller the presentation layer observes
//!
//! It is used by `cityweather-cli`, but can also be driven by other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod model;
pub mod prefs;
pub mod provider;
pub mod repository;

pub use config::Config;
pub use controller::{AppState, DeviceLocation, Notice, WeatherController};
pub use error::{ApiError, PreferenceError};
pub use location::{LocationProvider, StaticLocationProvider};
pub use model::{City, Coordinates, NetworkResult, WeatherCondition, WeatherSnapshot};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use provider::{WeatherService, openweather::OpenWeatherClient, service_from_config};
pub use repository::WeatherRepository;
