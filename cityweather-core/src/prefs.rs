//! Small key/value preference storage.
//!
//! The app only persists one value, the name of the last city whose weather was
//! shown, but the store is a general string map scoped to a namespace so the
//! controller never has to know how or where it is kept.

use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use crate::{config::Config, error::PreferenceError};

pub const PREFS_NAMESPACE: &str = "city_weather_prefs";
pub const KEY_CITY_NAME: &str = "city_name";

const PREFS_FILE_NAME: &str = "preferences.toml";

pub trait PreferenceStore: Send + Sync + std::fmt::Debug {
    fn save(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError>;
}

type Namespaces = BTreeMap<String, BTreeMap<String, String>>;

/// Preferences in a TOML file, one table per namespace.
///
/// ```toml
/// [city_weather_prefs]
/// city_name = "Paris"
/// ```
///
/// Writes go to a temp file that is then renamed over the original.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    namespace: String,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    pub fn new(path: PathBuf, namespace: &str) -> Self {
        Self { path, namespace: namespace.to_string(), write_lock: Mutex::new(()) }
    }

    /// Store under the platform data directory, in the app's namespace.
    pub fn open_default() -> Result<Self, PreferenceError> {
        let dirs = Config::project_dirs().map_err(|_| PreferenceError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir().join(PREFS_FILE_NAME), PREFS_NAMESPACE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Namespaces, PreferenceError> {
        if !self.path.exists() {
            return Ok(Namespaces::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn write_all(&self, data: &Namespaces) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(data)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn save(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.write_lock.lock();
        let mut data = self.read_all()?;
        data.entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.write_all(&data)?;
        tracing::debug!(path = %self.path.display(), key, "preference saved");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let data = self.read_all()?;
        Ok(data.get(&self.namespace).and_then(|ns| ns.get(key)).cloned())
    }
}

/// In-process store. Share it through an `Arc` to simulate a restart.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn save(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.lock().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::new(dir.path().join("prefs.toml"), PREFS_NAMESPACE);
        assert_eq!(store.load(KEY_CITY_NAME).unwrap(), None);
    }

    #[test]
    fn save_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::new(dir.path().join("a/b/prefs.toml"), PREFS_NAMESPACE);

        store.save(KEY_CITY_NAME, "Paris").unwrap();
        store.save(KEY_CITY_NAME, "Oslo").unwrap();

        assert_eq!(store.load(KEY_CITY_NAME).unwrap().as_deref(), Some("Oslo"));
        assert!(!store.path().with_extension("toml.tmp").exists());
    }

    #[test]
    fn namespaces_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        let ours = FilePreferenceStore::new(path.clone(), PREFS_NAMESPACE);
        let other = FilePreferenceStore::new(path, "other");

        ours.save(KEY_CITY_NAME, "Paris").unwrap();
        other.save(KEY_CITY_NAME, "Lima").unwrap();

        assert_eq!(ours.load(KEY_CITY_NAME).unwrap().as_deref(), Some("Paris"));
        assert_eq!(other.load(KEY_CITY_NAME).unwrap().as_deref(), Some("Lima"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let store = FilePreferenceStore::new(path, PREFS_NAMESPACE);
        assert!(matches!(store.load(KEY_CITY_NAME), Err(PreferenceError::Decode(_))));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.load(KEY_CITY_NAME).unwrap(), None);
        store.save(KEY_CITY_NAME, "Paris").unwrap();
        assert_eq!(store.load(KEY_CITY_NAME).unwrap().as_deref(), Some("Paris"));
    }
}
