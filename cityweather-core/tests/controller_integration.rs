//! End-to-end controller flows against a mock provider and a real preference file.

use std::{path::Path, sync::Arc};

use cityweather_core::{
    Coordinates, FilePreferenceStore, Notice, OpenWeatherClient, StaticLocationProvider,
    WeatherController, WeatherRepository,
    prefs::{KEY_CITY_NAME, PREFS_NAMESPACE, PreferenceStore},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(
    server: &MockServer,
    prefs_file: &Path,
    home: Option<Coordinates>,
) -> WeatherController {
    let client =
        OpenWeatherClient::new("TEST_KEY".into()).with_base_urls(&server.uri(), &server.uri());
    let repository = WeatherRepository::new(Arc::new(client));
    let prefs = FilePreferenceStore::new(prefs_file.to_path_buf(), PREFS_NAMESPACE);
    let location = StaticLocationProvider::new(home, repository.clone());
    WeatherController::new(repository, Arc::new(prefs), Arc::new(location))
}

async fn mount_paris(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "name": "Paris",
                "lat": 48.8566,
                "lon": 2.3522,
                "country": "FR",
                "state": "Île-de-France"
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "48.8566"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "weather": [{ "main": "Clear", "icon": "01d" }],
            "main": {
                "temp": 72.5,
                "temp_min": 68.0,
                "temp_max": 76.0,
                "pressure": 1013,
                "humidity": 40
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn selected_city_survives_restart() {
    let server = MockServer::start().await;
    mount_paris(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let prefs_file = dir.path().join("preferences.toml");

    let first = session(&server, &prefs_file, None);
    assert_eq!(first.restore_last_city_name(), None);

    let selected = first.on_search_submitted("Paris").await.expect("Paris should match");
    assert_eq!(selected.region, "Île-de-France");

    let state = first.state();
    let snapshot = state.weather.success().expect("weather should load");
    assert_eq!(snapshot.temperature, 72.5);
    assert_eq!(state.last_city_name.as_deref(), Some("Paris"));
    drop(first);

    let second = session(&server, &prefs_file, None);
    assert_eq!(second.restore_last_city_name().as_deref(), Some("Paris"));
    assert!(second.state().city_search.is_loading());
    assert!(second.state().weather.is_loading());
}

#[tokio::test]
async fn failed_fetch_does_not_touch_saved_city() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let prefs_file = dir.path().join("preferences.toml");
    FilePreferenceStore::new(prefs_file.clone(), PREFS_NAMESPACE)
        .save(KEY_CITY_NAME, "Oslo")
        .unwrap();

    let ctl = session(&server, &prefs_file, None);
    let city = cityweather_core::City {
        name: "Paris".into(),
        latitude: 48.8566,
        longitude: 2.3522,
        country: "FR".into(),
        region: "Île-de-France".into(),
    };
    ctl.on_city_selected(city).await.unwrap();

    assert_eq!(ctl.state().weather.error_message(), Some("Not found"));
    assert_eq!(ctl.restore_last_city_name().as_deref(), Some("Oslo"));
}

#[tokio::test]
async fn configured_home_resolves_through_reverse_geocode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Lyon", "lat": 45.76, "lon": 4.83, "country": "FR" }
        ])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let home = Coordinates { latitude: 45.76, longitude: 4.83 };
    let ctl = session(&server, &dir.path().join("preferences.toml"), Some(home));

    assert!(ctl.check_and_request_device_permission().await);

    let location = ctl.state().location;
    assert!(location.permission_granted);
    assert_eq!(location.latitude, Some(45.76));
    assert_eq!(location.city_name.as_deref(), Some("Lyon"));
}

#[tokio::test]
async fn no_home_means_denied() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let ctl = session(&server, &dir.path().join("preferences.toml"), None);
    let mut notices = ctl.notices();

    assert!(!ctl.check_and_request_device_permission().await);
    assert_eq!(notices.recv().await.unwrap(), Notice::PermissionDenied);
    assert!(!ctl.state().location.permission_granted);
}
