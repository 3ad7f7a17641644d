//! Durable key/value storage for the cart.
//!
//! [`LocalStorage`] mirrors the browser `localStorage` surface: string keys,
//! string values, synchronous reads and writes. The cart is stored under a
//! single key as a JSON array, overwritten wholesale on every mutation.
//!
//! # Backends
//!
//! - [`FileStorage`] - A JSON object on disk mapping keys to values
//! - [`MemoryStorage`] - In-process map, for tests and ephemeral sessions
//!
//! # Decoding the cart
//!
//! | Stored value                      | [`load_cart`] result                |
//! |-----------------------------------|-------------------------------------|
//! | key absent                        | `Ok(None)`                          |
//! | valid cart array                  | `Ok(Some(cart))`                    |
//! | bad JSON or broken cart invariant | `Err(StorageError::CorruptValue)`   |

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rocket_shoes_core::Cart;
use thiserror::Error;

/// Errors that can occur when reading or writing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing file is not a key/value JSON object.
    #[error("Storage file {path} is corrupt: {source}")]
    CorruptFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The value under `key` could not be decoded.
    #[error("Stored value for '{key}' is corrupt: {source}")]
    CorruptValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded.
    #[error("Failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A synchronous string key/value store.
pub trait LocalStorage {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// Cart encoding
// =============================================================================

/// Read and decode the cart stored under `key`.
///
/// # Errors
///
/// Returns `StorageError::CorruptValue` if the stored value is not a valid
/// cart, or the backend's error if it cannot be read.
pub fn load_cart<S: LocalStorage + ?Sized>(
    storage: &S,
    key: &str,
) -> Result<Option<Cart>, StorageError> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::CorruptValue {
            key: key.to_string(),
            source,
        })
}

/// Encode `cart` and store it under `key`.
///
/// # Errors
///
/// Returns an error if encoding or the backend write fails.
pub fn save_cart<S: LocalStorage + ?Sized>(
    storage: &mut S,
    key: &str,
    cart: &Cart,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(cart).map_err(StorageError::Encode)?;
    storage.set_item(key, &raw)
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// File-backed storage.
///
/// The file holds a single JSON object of string keys to string values.
/// A missing file reads as empty. Writes go to a sibling temporary file that
/// is then renamed over the original, so a crash mid-write leaves the
/// previous contents intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|source| StorageError::CorruptFile {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let raw = serde_json::to_string_pretty(items).map_err(StorageError::Encode)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}
