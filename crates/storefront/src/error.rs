//! Cart store errors with Sentry integration.
//!
//! Every failed cart operation yields a [`CartStoreError`]. The store turns it
//! into an error toast via [`CartStoreError::user_message`] and records
//! infrastructure failures (catalog, storage) to Sentry before returning it.

use rocket_shoes_core::{CartContentError, ProductId};
use thiserror::Error;

use crate::cart::CartOperation;
use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// Error returned by the cart store operations.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The operation needs the product to be in the cart and it is not.
    #[error("Product {product_id} is not in the cart ({operation})")]
    NotInCart {
        product_id: ProductId,
        operation: CartOperation,
    },

    /// The backend does not hold enough units.
    #[error("Requested {requested} units of product {product_id}, {available} in stock")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Stock or product lookup failed.
    #[error("Failed to fetch product {product_id}: {source}")]
    Fetch {
        product_id: ProductId,
        #[source]
        source: CatalogError,
    },

    /// The cart rejected the change as a duplicate item or a zero amount.
    ///
    /// The store checks membership and amount before changing the cart, so
    /// its operations do not return this while those checks and the `Cart`
    /// invariants agree.
    #[error("Cart rejected change: {0}")]
    Content(#[from] CartContentError),

    /// The new cart could not be persisted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartStoreError {
    /// Message shown to the user in the error toast.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::NotInCart {
                operation: CartOperation::Remove,
                ..
            } => "Error removing product",
            Self::NotInCart { .. } => "Error updating product amount",
            Self::OutOfStock { .. } => "Requested amount is out of stock",
            Self::Fetch { .. } => "Error adding product",
            Self::Content(_) => "Error updating cart",
            Self::Storage(_) => "Error saving cart",
        }
    }

    /// Whether the failure came from the backend or storage rather than
    /// from the request itself.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Storage(_))
    }

    /// Log the error, capturing infrastructure failures to Sentry.
    pub(crate) fn record(&self) {
        if self.is_infrastructure() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Cart operation failed"
            );
        } else {
            tracing::info!(error = %self, "Cart operation rejected");
        }
    }
}

/// Add a breadcrumb for cart actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart
/// changes leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
