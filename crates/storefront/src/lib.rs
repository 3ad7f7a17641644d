//! RocketShoes Storefront library.
//!
//! Provides the cart store used by the storefront front ends: a
//! [`cart::CartStore`] that validates mutations against the backend stock,
//! mirrors the cart to local storage, and reports every outcome as a toast.
//!
//! # Example
//!
//! ```rust,ignore
//! use rocket_shoes_storefront::{ApiClient, CartStore, FileStorage, TracingNotifier};
//!
//! let config = CartConfig::from_env()?;
//! let catalog = ApiClient::new(&config.api)?;
//! let storage = FileStorage::new(&config.storage.path);
//! let mut store = CartStore::open(catalog, storage, TracingNotifier, &config.storage.cart_key)?;
//!
//! store.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod storage;

pub use cart::{CartOperation, CartOutcome, CartStore, UpdateProductAmount};
pub use catalog::{ApiClient, Catalog, CatalogError};
pub use config::{ApiConfig, CartConfig, ConfigError, StorageConfig};
pub use error::CartStoreError;
pub use notify::{MemoryNotifier, Notifier, Toast, ToastKind, TracingNotifier};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
