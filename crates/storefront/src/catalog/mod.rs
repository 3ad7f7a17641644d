//! Product and stock lookups against the storefront backend.
//!
//! # Architecture
//!
//! - [`Catalog`] is the seam the cart store validates mutations through
//! - [`ApiClient`] implements it over HTTP with `reqwest`
//! - Product records are cached in memory via `moka`; stock is always fetched
//!
//! # Endpoints
//!
//! - `GET stock/{id}` returns `{ "id": 1, "amount": 3 }`
//! - `GET products/{id}` returns `{ "id": 1, "title": "...", "price": 179.9, "image": "..." }`

mod client;

pub use client::ApiClient;

use std::future::Future;

use rocket_shoes_core::{Product, ProductId, Stock};
use thiserror::Error;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Client could not be built from the configuration.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Source of stock levels and product records.
///
/// Implementations must not cache stock: every call reflects the backend at
/// the time of the call.
pub trait Catalog {
    /// Units currently available for `id`.
    fn stock(&self, id: ProductId) -> impl Future<Output = Result<Stock, CatalogError>> + Send;

    /// Display record for `id`.
    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product, CatalogError>> + Send;
}
