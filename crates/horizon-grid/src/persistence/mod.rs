//! Persisted layer state.
//!
//! Layers save their state as flat `prefix.key=value` properties through
//! [`Layer::save_state`](crate::layer::Layer::save_state) and read it back
//! with [`Layer::load_state`](crate::layer::Layer::load_state). Lookups are
//! best effort: a missing key leaves the layer's current state alone and a
//! malformed value is logged and skipped.
//!
//! On disk the properties are an INI document without sections. Keys under
//! a named section are read back as `section.key`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ini::Ini;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{GridError, Result};

const LIST_SEPARATOR: char = ',';
const MAP_SEPARATOR: char = ':';

/// A flat, ordered key/value store for layer state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Raw access
    // =========================================================================

    pub fn set(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // =========================================================================
    // Typed values
    // =========================================================================

    /// Store values as `a,b,c`.
    pub fn set_list<T: fmt::Display>(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) {
        let joined = values
            .into_iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(&LIST_SEPARATOR.to_string());
        self.set(key, joined);
    }

    /// Store entries as `k:v,k:v`.
    pub fn set_map<'a, K, V>(
        &mut self,
        key: impl Into<String>,
        entries: impl IntoIterator<Item = (&'a K, &'a V)>,
    ) where
        K: fmt::Display + 'a,
        V: fmt::Display + 'a,
    {
        self.set_list(
            key,
            entries
                .into_iter()
                .map(|(k, v)| format!("{k}{MAP_SEPARATOR}{v}")),
        );
    }

    /// The value of `key` parsed as `T`.
    pub fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                skip(key, raw);
                None
            }
        }
    }

    /// A list written by [`set_list`](Self::set_list). The whole list is
    /// rejected if any element is malformed.
    pub fn list<T: FromStr>(&self, key: &str) -> Option<Vec<T>> {
        let raw = self.get(key)?;
        let parsed = split_list(raw)
            .map(|item| item.parse().ok())
            .collect::<Option<Vec<T>>>();
        if parsed.is_none() {
            skip(key, raw);
        }
        parsed
    }

    /// A map written by [`set_map`](Self::set_map).
    pub fn map<K: FromStr + Ord, V: FromStr>(&self, key: &str) -> Option<BTreeMap<K, V>> {
        let raw = self.get(key)?;
        let parsed = split_list(raw)
            .map(|item| {
                let (k, v) = item.split_once(MAP_SEPARATOR)?;
                Some((k.trim().parse().ok()?, v.trim().parse().ok()?))
            })
            .collect::<Option<BTreeMap<K, V>>>();
        if parsed.is_none() {
            skip(key, raw);
        }
        parsed
    }

    /// Check that `key` holds a `T`, for callers that must not skip it.
    pub fn require<T: FromStr>(&self, key: &str) -> Result<T>
    where
        T::Err: fmt::Display,
    {
        let raw = self
            .get(key)
            .ok_or_else(|| GridError::invalid_property(key, "missing"))?;
        raw.trim()
            .parse()
            .map_err(|e: T::Err| GridError::invalid_property(key, e.to_string()))
    }

    // =========================================================================
    // Text and files
    // =========================================================================

    /// Parse an INI document.
    pub fn parse(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| GridError::Parse(e.to_string()))?;
        let mut values = BTreeMap::new();
        for (section, props) in ini.iter() {
            for (key, value) in props.iter() {
                let key = match section {
                    Some(section) => format!("{section}.{key}"),
                    None => key.to_string(),
                };
                values.insert(key, value.to_string());
            }
        }
        Ok(Self { values })
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for (key, value) in &self.values {
            ini.with_section(None::<String>).set(key, value);
        }
        ini
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GridError::io(path, e))?;
        let properties = Self::parse(&text)?;
        tracing::debug!(
            target: targets::PERSISTENCE,
            path = %path.display(),
            entries = properties.len(),
            "loaded properties"
        );
        Ok(properties)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_ini()
            .write_to_file(path)
            .map_err(|e| GridError::io(path, e))?;
        tracing::debug!(
            target: targets::PERSISTENCE,
            path = %path.display(),
            entries = self.len(),
            "saved properties"
        );
        Ok(())
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = Vec::new();
        self.to_ini().write_to(&mut buffer).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buffer))
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut properties = Properties::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn skip(key: &str, raw: &str) {
    tracing::warn!(target: targets::PERSISTENCE, key, value = raw, "skipping malformed property");
}
