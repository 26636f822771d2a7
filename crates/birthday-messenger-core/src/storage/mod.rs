//! Key/value persistence shared by the session cache and theme state.
//!
//! This is the client's equivalent of browser local storage: string keys,
//! string values, no schema. Stores are injected into the components that
//! use them rather than reached through globals.
//!
//! - `MemoryStore`: in-process map, nothing survives the process
//! - `FileStore`: a JSON object file in the cache directory

pub mod file;
pub mod memory;

use std::sync::Arc;

use anyhow::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// String key/value storage with interior mutability.
///
/// Reads never fail: an unreadable value is reported as absent. Writes
/// return an error when the value could not be persisted.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
