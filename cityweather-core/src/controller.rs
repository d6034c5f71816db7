//! Application state and the intents that change it.
//!
//! [`WeatherController`] is the only writer of [`AppState`]. Each intent that
//! talks to the network sets its slot to `Loading` immediately, then spawns one
//! task that writes the terminal result back. Observers read state through a
//! `watch` channel and transient messages through a `broadcast` channel.
//!
//! Every slot carries a request counter. A task only applies its result if no
//! newer trigger for the same slot happened in the meantime, so the most recent
//! request always wins regardless of completion order. Preference writes for
//! the weather slot are serialized and re-check the counter, so the persisted
//! city is never older than the one on screen.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    sync::{Mutex, broadcast, watch},
    task::JoinHandle,
};

use crate::{
    location::LocationProvider,
    model::{City, NetworkResult, WeatherSnapshot},
    prefs::{KEY_CITY_NAME, PreferenceStore},
    repository::WeatherRepository,
};

const NOTICE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceLocation {
    pub permission_granted: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city_name: Option<String>,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub city_search: NetworkResult<Vec<City>>,
    pub weather: NetworkResult<WeatherSnapshot>,
    pub last_city_name: Option<String>,
    pub location: DeviceLocation,
}

/// Transient, user-facing message. Never stored in [`AppState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PermissionDenied,
    LocationUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::PermissionDenied => f.write_str("Location permission denied"),
            Notice::LocationUnavailable => f.write_str("Location not available"),
        }
    }
}

#[derive(Debug)]
struct Inner {
    repository: WeatherRepository,
    prefs: Arc<dyn PreferenceStore>,
    location: Arc<dyn LocationProvider>,
    state: watch::Sender<AppState>,
    notices: broadcast::Sender<Notice>,
    search_seq: AtomicU64,
    weather_seq: AtomicU64,
    persist_lock: Mutex<()>,
}

/// Cheap to clone; clones share the same state.
///
/// Intents that spawn work must be called from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct WeatherController {
    inner: Arc<Inner>,
}

impl WeatherController {
    pub fn new(
        repository: WeatherRepository,
        prefs: Arc<dyn PreferenceStore>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        let (state, _) = watch::channel(AppState::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                repository,
                prefs,
                location,
                state,
                notices,
                search_seq: AtomicU64::new(0),
                weather_seq: AtomicU64::new(0),
                persist_lock: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    /// Start a city search. `city_search` is `Loading` when this returns.
    pub fn on_search_query_changed(&self, query: impl Into<String>) -> JoinHandle<()> {
        let query = query.into();
        let token = self.inner.search_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|s| s.city_search = NetworkResult::Loading);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.repository.search_city(&query).await;
            let applied = inner.state.send_if_modified(|s| {
                if inner.search_seq.load(Ordering::SeqCst) != token {
                    return false;
                }
                s.city_search = result;
                true
            });
            if !applied {
                tracing::debug!(%query, "dropping superseded search result");
            }
        })
    }

    /// Fetch weather for `city`. `weather` is `Loading` when this returns.
    ///
    /// On success the city name is persisted as the last viewed city.
    pub fn on_city_selected(&self, city: City) -> JoinHandle<()> {
        let token = self.inner.weather_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|s| s.weather = NetworkResult::Loading);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.repository.fetch_weather(city.latitude, city.longitude).await;
            let succeeded = matches!(result, NetworkResult::Success(_));

            let applied = inner.state.send_if_modified(|s| {
                if inner.weather_seq.load(Ordering::SeqCst) != token {
                    return false;
                }
                s.weather = result;
                true
            });

            if !applied {
                tracing::debug!(city = %city.name, "dropping superseded weather result");
                return;
            }
            if succeeded {
                inner.remember_city(token, city.name).await;
            }
        })
    }

    /// Search, then select the first match if there is one.
    pub async fn on_search_submitted(&self, query: impl Into<String>) -> Option<City> {
        if let Err(err) = self.on_search_query_changed(query).await {
            tracing::error!(error = %err, "search task failed");
            return None;
        }

        let first = {
            let state = self.inner.state.borrow();
            state.city_search.success().and_then(|c| c.first().cloned())
        }?;

        if let Err(err) = self.on_city_selected(first.clone()).await {
            tracing::error!(error = %err, "weather task failed");
        }
        Some(first)
    }

    /// Read the last viewed city from the store. Triggers no lookups.
    pub fn restore_last_city_name(&self) -> Option<String> {
        let name = match self.inner.prefs.load(KEY_CITY_NAME) {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load last city name");
                None
            }
        };
        let recorded = name.clone();
        self.inner.state.send_modify(|s| s.last_city_name = recorded);
        name
    }

    /// Ensure location permission, asking for it if needed. Returns whether it was granted.
    pub async fn check_and_request_device_permission(&self) -> bool {
        let granted = if self.inner.location.has_permission().await {
            true
        } else {
            self.inner.location.request_permission().await
        };
        self.on_permission_result(granted).await;
        granted
    }

    /// Record the permission answer; when granted, resolve the device location.
    pub async fn on_permission_result(&self, granted: bool) {
        self.inner.state.send_modify(|s| s.location.permission_granted = granted);

        if !granted {
            self.inner.notify(Notice::PermissionDenied);
            return;
        }

        match self.inner.location.last_known_location().await {
            Some(coords) => {
                let name =
                    self.inner.location.reverse_geocode(coords.latitude, coords.longitude).await;
                self.on_device_location_resolved(coords.latitude, coords.longitude, name);
            }
            None => self.inner.notify(Notice::LocationUnavailable),
        }
    }

    pub fn on_device_location_resolved(
        &self,
        latitude: f64,
        longitude: f64,
        city_name: Option<String>,
    ) {
        tracing::debug!(latitude, longitude, city = ?city_name, "device location resolved");
        self.inner.state.send_modify(|s| {
            s.location.latitude = Some(latitude);
            s.location.longitude = Some(longitude);
            s.location.city_name = city_name;
        });
    }
}

impl Inner {
    /// Persist `name` unless a newer weather trigger happened since `token`.
    ///
    /// Store writes may block, so they run on the blocking pool.
    async fn remember_city(&self, token: u64, name: String) {
        let _guard = self.persist_lock.lock().await;
        if self.weather_seq.load(Ordering::SeqCst) != token {
            tracing::debug!(city = %name, "skipping save for superseded city");
            return;
        }

        let prefs = Arc::clone(&self.prefs);
        let value = name.clone();
        let saved = tokio::task::spawn_blocking(move || prefs.save(KEY_CITY_NAME, &value)).await;

        match saved {
            Ok(Ok(())) => {
                tracing::info!(city = %name, "saved last city");
                self.state.send_modify(|s| s.last_city_name = Some(name));
            }
            Ok(Err(err)) => tracing::warn!(city = %name, error = %err, "failed to save last city"),
            Err(err) => tracing::error!(city = %name, error = %err, "preference save task failed"),
        }
    }

    fn notify(&self, notice: Notice) {
        tracing::info!(%notice, "notice");
        // No subscribers is fine: notices are fire-and-forget.
        let _ = self.notices.send(notice);
    }
}
