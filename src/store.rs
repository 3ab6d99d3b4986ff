//! In-memory string store
//!
//! Every operation is total: it accepts any key and value, including empty
//! strings, and never fails. All access goes through one `RwLock`, so the
//! compound operations (`safe_set`, `replace_set`) are atomic with respect
//! to other callers sharing the same store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory key-value store of strings
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<String, String>>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single map call, so a poisoned map is still
    // consistent and safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the value for a key, or the empty string if the key is absent.
    ///
    /// An absent key and a key holding `""` look the same here; use
    /// [`Store::lookup`] to tell them apart.
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default()
    }

    /// Set a key to the given value, discarding any previous value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().insert(key.into(), value.into());
    }

    /// Set a key only if it is not already present
    pub fn safe_set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.insert_if_absent(key, value);
    }

    /// Store `value` under `key` and return the previous value.
    ///
    /// An absent key is written as well, and the empty string is returned.
    pub fn replace_set(&self, key: impl Into<String>, value: impl Into<String>) -> String {
        self.replace(key, value).unwrap_or_default()
    }

    /// Get the value for a key, `None` if absent
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    /// Same as [`Store::replace_set`], but `None` if the key was absent
    pub fn replace(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.write().insert(key.into(), value.into())
    }

    /// Same as [`Store::safe_set`], returning whether the value was written
    pub fn insert_if_absent(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let mut data = self.write();
        let key = key.into();
        if data.contains_key(&key) {
            return false;
        }
        data.insert(key, value.into());
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Set every pair in order under one lock. Later pairs win on duplicate keys.
    pub fn set_multiple<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = self.write();
        for (key, value) in pairs {
            data.insert(key.into(), value.into());
        }
    }

    /// Safe-set every pair in order under one lock. The first pair for an
    /// absent key wins.
    pub fn safe_set_multiple<I, K, V>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = self.write();
        for (key, value) in pairs {
            data.entry(key.into()).or_insert_with(|| value.into());
        }
    }

    /// Look up many keys at once, results in input order
    pub fn get_multiple<I, K>(&self, keys: I) -> Vec<Option<String>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let data = self.read();
        keys.into_iter()
            .map(|key| data.get(key.as_ref()).cloned())
            .collect()
    }
}
