//! DurableStore port: string key/value persistence.
//!
//! Values are opaque strings (the engine stores JSON). Implementations must
//! make `set` visible to a subsequent `get` on a fresh handle to the same
//! backing store, which is what "survives a restart" means here.

use crate::domain::StorageError;

pub trait DurableStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
