use std::fmt::Write;

use cityweather_core::{City, DeviceLocation, NetworkResult, WeatherSnapshot};

pub fn city_list(result: &NetworkResult<Vec<City>>) -> String {
    match result {
        NetworkResult::Loading => "Searching...".to_string(),
        NetworkResult::Error(message) => message.clone(),
        NetworkResult::Success(cities) if cities.is_empty() => "Not found".to_string(),
        NetworkResult::Success(cities) => {
            let mut out = String::new();
            for (i, city) in cities.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:>2}. {}  ({:.4}, {:.4})",
                    i + 1,
                    city.display_name(),
                    city.latitude,
                    city.longitude
                );
            }
            out.trim_end().to_string()
        }
    }
}

pub fn weather(city: &str, result: &NetworkResult<WeatherSnapshot>) -> String {
    let snapshot = match result {
        NetworkResult::Loading => return "Loading weather...".to_string(),
        NetworkResult::Error(message) => return format!("{city}: {message}"),
        NetworkResult::Success(snapshot) => snapshot,
    };

    let mut out = String::new();
    let (summary, icon) = snapshot
        .primary_condition()
        .map(|c| (c.summary.as_str(), c.icon_url()))
        .unwrap_or(("Unknown", String::new()));

    let _ = writeln!(out, "{city}");
    let _ = writeln!(out, "  {}°F  {summary}", snapshot.temperature as i64);
    let _ = writeln!(
        out,
        "  Min {}°F   Max {}°F",
        snapshot.temp_min as i64, snapshot.temp_max as i64
    );
    let _ = writeln!(out, "  Humidity {}%   Pressure {} hPa", snapshot.humidity, snapshot.pressure);
    if !icon.is_empty() {
        let _ = writeln!(out, "  Icon {icon}");
    }
    let _ = write!(out, "  Updated {}", snapshot.fetched_at.format("%Y-%m-%d %H:%M UTC"));
    out
}

pub fn location(location: &DeviceLocation) -> String {
    match (location.latitude, location.longitude) {
        (Some(lat), Some(lon)) => {
            let city = location.city_name.as_deref().unwrap_or("unknown");
            format!("Latitude: {lat}\nLongitude: {lon}\nCity: {city}")
        }
        _ => "Location not available. Set [home] in the config to enable it.".to_string(),
    }
}
