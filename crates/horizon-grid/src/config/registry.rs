use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

use super::DisplayMode;

/// A typed key into the [`ConfigRegistry`].
pub struct ConfigAttribute<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ConfigAttribute<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ConfigAttribute<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ConfigAttribute<T> {}

impl<T> fmt::Debug for ConfigAttribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigAttribute").field(&self.name).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    attribute: &'static str,
    type_id: TypeId,
    mode: DisplayMode,
    label: Option<String>,
}

/// Typed configuration store keyed by attribute, display mode and label.
///
/// [`attribute`](Self::attribute) cascades: for each display mode of
/// [`DisplayMode::ordering`], every label of the stack is tried in order,
/// then the unlabelled entry for that mode.
#[derive(Default)]
pub struct ConfigRegistry {
    entries: RwLock<HashMap<EntryKey, Arc<dyn Any + Send + Sync>>>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` for `attribute` in `mode`, optionally restricted to `label`.
    pub fn register<T: Send + Sync + 'static>(
        &self,
        attribute: ConfigAttribute<T>,
        value: T,
        mode: DisplayMode,
        label: Option<&str>,
    ) {
        let key = Self::key(attribute, mode, label);
        self.entries.write().insert(key, Arc::new(value));
    }

    /// Remove an exact registration. Returns whether one existed.
    pub fn unregister<T: 'static>(
        &self,
        attribute: ConfigAttribute<T>,
        mode: DisplayMode,
        label: Option<&str>,
    ) -> bool {
        let key = Self::key(attribute, mode, label);
        self.entries.write().remove(&key).is_some()
    }

    /// The exact registration, without any fallback.
    pub fn specific<T: Clone + 'static>(
        &self,
        attribute: ConfigAttribute<T>,
        mode: DisplayMode,
        label: Option<&str>,
    ) -> Option<T> {
        let key = Self::key(attribute, mode, label);
        self.entries
            .read()
            .get(&key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    /// Cascading lookup for a cell in `mode` carrying `labels`.
    pub fn attribute<T: Clone + 'static, S: AsRef<str>>(
        &self,
        attribute: ConfigAttribute<T>,
        mode: DisplayMode,
        labels: &[S],
    ) -> Option<T> {
        mode.ordering().iter().find_map(|&mode| {
            labels
                .iter()
                .find_map(|label| self.specific(attribute, mode, Some(label.as_ref())))
                .or_else(|| self.specific(attribute, mode, None))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn key<T: 'static>(
        attribute: ConfigAttribute<T>,
        mode: DisplayMode,
        label: Option<&str>,
    ) -> EntryKey {
        EntryKey {
            attribute: attribute.name,
            type_id: TypeId::of::<T>(),
            mode,
            label: label.map(str::to_string),
        }
    }
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("entries", &self.len())
            .finish()
    }
}
