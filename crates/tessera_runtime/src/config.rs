//! # Configuration Store
//!
//! Persisted key/value settings grouped into named sections ("filters").
//!
//! ## File format
//!
//! One TOML table per filter:
//!
//! ```toml
//! [window]
//! width = 1280
//! fullscreen = false
//!
//! [player]
//! name = "ada"
//! ```
//!
//! Values are typed on the way out through `serde`, so anything that
//! deserializes from a TOML value can be read back directly. Values obtained
//! here are typically handed to component constructors; the core never sees
//! the store itself.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use toml::{Table, Value};

use crate::error::{RuntimeError, RuntimeResult};

/// Outcome of the most recent load attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadStatus {
    /// The file was read and parsed.
    Success,
    /// The file does not exist yet; it is created on save.
    FileNotFound,
    /// The file exists but could not be read or parsed.
    ReadError,
    /// No load has completed.
    NotLoaded,
}

/// Sectioned key/value store backed by a TOML file.
///
/// Opening never fails: the outcome is recorded in [`load_status`](Self::load_status)
/// and [`last_error`](Self::last_error), and the store starts empty if the
/// file could not be used. Unsaved changes are written back on drop.
///
/// # Example
///
/// ```rust,no_run
/// use tessera_runtime::ConfigStore;
///
/// let mut config = ConfigStore::open("settings.toml");
/// config.set("player", "health", &100)?;
/// let health: i32 = config.get("player", "health")?;
/// config.save()?;
/// # Ok::<(), tessera_runtime::RuntimeError>(())
/// ```
pub struct ConfigStore {
    path: PathBuf,
    filters: BTreeMap<String, Table>,
    status: LoadStatus,
    last_error: Option<String>,
    dirty: bool,
}

impl ConfigStore {
    /// Opens the store at `path` and loads it immediately.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            path: path.into(),
            filters: BTreeMap::new(),
            status: LoadStatus::NotLoaded,
            last_error: None,
            dirty: false,
        };
        store.load();
        store
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Outcome of the last load.
    #[must_use]
    pub const fn load_status(&self) -> LoadStatus {
        self.status
    }

    /// Returns `true` if the last load succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.status == LoadStatus::Success
    }

    /// Returns `true` if the last load found no file.
    #[must_use]
    pub fn is_file_not_found(&self) -> bool {
        self.status == LoadStatus::FileNotFound
    }

    /// Description of the last load problem, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns `true` if there are changes not yet written to disk.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Names of all filters, in sorted order.
    pub fn filters(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Keys of `filter`, in sorted order. Empty if the filter is absent.
    pub fn keys<'a>(&'a self, filter: &str) -> impl Iterator<Item = &'a str> {
        self.filters
            .get(filter)
            .into_iter()
            .flat_map(|table| table.keys().map(String::as_str))
    }

    /// Checks whether `filter` has a value for `key`.
    #[must_use]
    pub fn contains(&self, filter: &str, key: &str) -> bool {
        self.filters
            .get(filter)
            .is_some_and(|table| table.contains_key(key))
    }

    /// Reads `key` from `filter` as a `T`.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::FilterNotFound`] / [`RuntimeError::KeyNotFound`] if absent
    /// - [`RuntimeError::InvalidValue`] if the value does not convert to `T`
    pub fn get<T: DeserializeOwned>(&self, filter: &str, key: &str) -> RuntimeResult<T> {
        let value = self.value(filter, key)?;
        value
            .clone()
            .try_into::<T>()
            .map_err(|e| invalid(filter, key, e.to_string()))
    }

    /// Reads `key` from `filter`, falling back to `default` if it is absent
    /// or unusable.
    pub fn get_or<T: DeserializeOwned>(&self, filter: &str, key: &str, default: T) -> T {
        match self.get(filter, key) {
            Ok(value) => value,
            Err(RuntimeError::FilterNotFound(_) | RuntimeError::KeyNotFound { .. }) => default,
            Err(e) => {
                tracing::warn!(filter, key, error = %e, "unusable config value, using default");
                default
            }
        }
    }

    /// Reads `key` from `filter` as a boolean.
    ///
    /// Besides TOML booleans, accepts the strings `true`, `True`, `1`,
    /// `false`, `False`, `0` and the integers `1` and `0`.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_bool(&self, filter: &str, key: &str) -> RuntimeResult<bool> {
        match self.value(filter, key)? {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(1) => Ok(true),
            Value::Integer(0) => Ok(false),
            Value::String(s) => match s.as_str() {
                "true" | "True" | "1" => Ok(true),
                "false" | "False" | "0" => Ok(false),
                _ => Err(invalid(filter, key, format!("invalid boolean {s:?}"))),
            },
            other => Err(invalid(filter, key, format!("invalid boolean {other}"))),
        }
    }

    /// Stores `value` under `key` in `filter`, creating the filter if needed.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ConfigSerialize`] if `value` has no TOML representation.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        filter: &str,
        key: &str,
        value: &T,
    ) -> RuntimeResult<()> {
        let value = Value::try_from(value)?;
        self.filters
            .entry(filter.to_owned())
            .or_default()
            .insert(key.to_owned(), value);
        self.dirty = true;
        Ok(())
    }

    /// Removes `key` from `filter`. Returns `true` if it was present.
    pub fn remove(&mut self, filter: &str, key: &str) -> bool {
        let removed = self
            .filters
            .get_mut(filter)
            .and_then(|table| table.remove(key))
            .is_some();
        self.dirty |= removed;
        removed
    }

    /// Discards in-memory contents and loads the file again.
    pub fn reload(&mut self) {
        self.filters.clear();
        self.dirty = false;
        self.load();
    }

    /// Writes every filter to the backing file.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Io`] if the file cannot be written.
    pub fn save(&mut self) -> RuntimeResult<()> {
        let mut root = Table::new();
        for (name, table) in &self.filters {
            root.insert(name.clone(), Value::Table(table.clone()));
        }
        let text = toml::to_string(&root)?;

        fs::write(&self.path, text).map_err(|source| RuntimeError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), filters = self.filters.len(), "config saved");
        Ok(())
    }

    fn load(&mut self) {
        self.status = LoadStatus::NotLoaded;
        self.last_error = None;

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.status = LoadStatus::FileNotFound;
                self.last_error = Some(format!(
                    "config file not found: {} (will be created on save)",
                    self.path.display()
                ));
                tracing::debug!(path = %self.path.display(), "config file not found");
                return;
            }
            Err(e) => {
                self.fail_load(format!("failed to read config file {}: {e}", self.path.display()));
                return;
            }
        };

        let root: Table = match toml::from_str(&text) {
            Ok(root) => root,
            Err(e) => {
                self.fail_load(format!("failed to parse config file {}: {e}", self.path.display()));
                return;
            }
        };

        for (name, value) in root {
            match value {
                Value::Table(table) => {
                    self.filters.insert(name, table);
                }
                _ => {
                    tracing::warn!(key = %name, "ignoring config value outside any filter");
                }
            }
        }
        self.status = LoadStatus::Success;
    }

    fn fail_load(&mut self, message: String) {
        tracing::warn!(error = %message, "config load failed");
        self.status = LoadStatus::ReadError;
        self.last_error = Some(message);
    }

    fn value(&self, filter: &str, key: &str) -> RuntimeResult<&Value> {
        let table = self
            .filters
            .get(filter)
            .ok_or_else(|| RuntimeError::FilterNotFound(filter.to_owned()))?;
        table.get(key).ok_or_else(|| RuntimeError::KeyNotFound {
            filter: filter.to_owned(),
            key: key.to_owned(),
        })
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.save() {
                tracing::warn!(error = %e, "failed to save config on drop");
            }
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("status", &self.status)
            .field("filters", &self.filters.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn invalid(filter: &str, key: &str, reason: String) -> RuntimeError {
    RuntimeError::InvalidValue {
        filter: filter.to_owned(),
        key: key.to_owned(),
        reason,
    }
}
