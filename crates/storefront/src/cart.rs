//! The cart store.
//!
//! [`CartStore`] owns the in-memory [`Cart`] and is the only way to change
//! it. Each operation validates against the [`Catalog`], writes the new cart
//! to [`LocalStorage`], and only then replaces the in-memory copy, so the two
//! never diverge. The outcome is returned to the caller and also delivered to
//! the [`Notifier`] as a toast.
//!
//! Mutating operations take `&mut self`: a store is never mutated by two
//! operations at once, even across the network round-trips.

use std::fmt;

use rocket_shoes_core::{Cart, CartContentError, CartItem, ProductId, Stock};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::catalog::Catalog;
use crate::error::{CartStoreError, add_breadcrumb};
use crate::notify::{Notifier, Toast};
use crate::storage::{LocalStorage, StorageError, load_cart, save_cart};

/// The three ways a cart can be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Add,
    Remove,
    UpdateAmount,
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::UpdateAmount => "update amount",
        })
    }
}

/// Request to set the amount held for a product.
///
/// `amount` is signed so that requests below 1 can be expressed; they are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductAmount {
    pub product_id: ProductId,
    pub amount: i64,
}

/// What a successful operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOutcome {
    /// A new item was appended with amount 1.
    Added,
    /// The item was removed.
    Removed,
    /// The item now holds `amount` units.
    AmountUpdated { amount: u32 },
    /// Nothing was done and nothing was reported.
    Unchanged,
}

impl CartOutcome {
    /// Message shown to the user in the success toast, if any.
    #[must_use]
    pub const fn success_message(&self) -> Option<&'static str> {
        match self {
            Self::Added => Some("Item added to cart"),
            Self::Removed => Some("Item removed from cart"),
            Self::AmountUpdated { .. } => Some("Item amount updated"),
            Self::Unchanged => None,
        }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// Cart state container.
pub struct CartStore<C, S, N> {
    cart: Cart,
    catalog: C,
    storage: S,
    notifier: N,
    key: String,
}

impl<C, S, N> fmt::Debug for CartStore<C, S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl<C, S, N> CartStore<C, S, N>
where
    C: Catalog,
    S: LocalStorage,
    N: Notifier,
{
    /// Open the store, loading the cart saved under `key`.
    ///
    /// A missing value starts an empty cart. A corrupt value is logged and
    /// also starts an empty cart; it stays in storage until the next
    /// successful operation overwrites it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the storage backend itself cannot be read.
    pub fn open(
        catalog: C,
        storage: S,
        notifier: N,
        key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let key = key.into();
        let cart = match load_cart(&storage, &key) {
            Ok(cart) => cart.unwrap_or_default(),
            Err(StorageError::CorruptValue { key, source }) => {
                warn!(key = %key, error = %source, "Discarding corrupt stored cart");
                Cart::new()
            }
            Err(e) => return Err(e),
        };
        debug!(key = %key, items = cart.len(), "Cart loaded");

        Ok(Self {
            cart,
            catalog,
            storage,
            notifier,
            key,
        })
    }

    /// The current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart goes through
    /// [`update_product_amount`](Self::update_product_amount) with its amount
    /// plus one. Otherwise the stock is checked, the product record fetched,
    /// and a new item with amount 1 appended.
    ///
    /// # Errors
    ///
    /// - `CartStoreError::Fetch` if the stock or product lookup fails
    /// - `CartStoreError::OutOfStock` if no unit (or no further unit) is available
    /// - `CartStoreError::Storage` if the new cart cannot be saved
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn add_product(&mut self, product_id: ProductId) -> Result<CartOutcome, CartStoreError> {
        let result = self.try_add(product_id).await;
        self.report(product_id, &result);
        result
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// - `CartStoreError::NotInCart` if the product is not in the cart
    /// - `CartStoreError::Storage` if the new cart cannot be saved
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn remove_product(&mut self, product_id: ProductId) -> Result<CartOutcome, CartStoreError> {
        let result = self.try_remove(product_id);
        self.report(product_id, &result);
        result
    }

    /// Set the amount held for a product already in the cart.
    ///
    /// Amounts below 1 are ignored and return [`CartOutcome::Unchanged`]
    /// without a toast.
    ///
    /// # Errors
    ///
    /// - `CartStoreError::NotInCart` if the product is not in the cart
    /// - `CartStoreError::Fetch` if the stock lookup fails
    /// - `CartStoreError::OutOfStock` if the amount exceeds the stock
    /// - `CartStoreError::Storage` if the new cart cannot be saved
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn update_product_amount(
        &mut self,
        request: UpdateProductAmount,
    ) -> Result<CartOutcome, CartStoreError> {
        let result = self
            .try_update(request.product_id, request.amount)
            .await;
        self.report(request.product_id, &result);
        result
    }

    // =========================================================================
    // Operation bodies
    // =========================================================================

    async fn try_add(&mut self, product_id: ProductId) -> Result<CartOutcome, CartStoreError> {
        if let Some(item) = self.cart.get(product_id) {
            let amount = i64::from(item.amount) + 1;
            return self.try_update(product_id, amount).await;
        }

        let stock = self.fetch_stock(product_id).await?;
        if stock.is_empty() {
            return Err(CartStoreError::OutOfStock {
                product_id,
                requested: 1,
                available: 0,
            });
        }

        let product = self
            .catalog
            .product(product_id)
            .await
            .map_err(|source| CartStoreError::Fetch { product_id, source })?;

        let mut item = CartItem::new(product, 1);
        item.id = product_id;

        let mut next = self.cart.clone();
        next.push(item).map_err(|e| content_error(e, CartOperation::Add))?;
        self.commit(next)?;

        Ok(CartOutcome::Added)
    }

    fn try_remove(&mut self, product_id: ProductId) -> Result<CartOutcome, CartStoreError> {
        let mut next = self.cart.clone();
        next.remove(product_id)
            .map_err(|e| content_error(e, CartOperation::Remove))?;
        self.commit(next)?;

        Ok(CartOutcome::Removed)
    }

    async fn try_update(
        &mut self,
        product_id: ProductId,
        amount: i64,
    ) -> Result<CartOutcome, CartStoreError> {
        if amount < 1 {
            debug!(amount, "Ignoring amount below 1");
            return Ok(CartOutcome::Unchanged);
        }
        // Anything past u32 exceeds every possible stock level
        let requested = u32::try_from(amount).unwrap_or(u32::MAX);

        if !self.cart.contains(product_id) {
            return Err(CartStoreError::NotInCart {
                product_id,
                operation: CartOperation::UpdateAmount,
            });
        }

        let stock = self.fetch_stock(product_id).await?;
        if !stock.covers(requested) {
            return Err(CartStoreError::OutOfStock {
                product_id,
                requested,
                available: stock.amount,
            });
        }

        let mut next = self.cart.clone();
        next.set_amount(product_id, requested)
            .map_err(|e| content_error(e, CartOperation::UpdateAmount))?;
        self.commit(next)?;

        Ok(CartOutcome::AmountUpdated { amount: requested })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn fetch_stock(&self, product_id: ProductId) -> Result<Stock, CartStoreError> {
        self.catalog
            .stock(product_id)
            .await
            .map_err(|source| CartStoreError::Fetch { product_id, source })
    }

    /// Persist `next`, then make it the current cart.
    fn commit(&mut self, next: Cart) -> Result<(), CartStoreError> {
        save_cart(&mut self.storage, &self.key, &next)?;
        self.cart = next;
        Ok(())
    }

    fn report(&self, product_id: ProductId, result: &Result<CartOutcome, CartStoreError>) {
        match result {
            Ok(outcome) => {
                if let Some(message) = outcome.success_message() {
                    let id = product_id.to_string();
                    add_breadcrumb("cart", message, Some(&[("product_id", id.as_str())]));
                    self.notifier.notify(Toast::success(message));
                }
            }
            Err(e) => {
                e.record();
                self.notifier.notify(Toast::error(e.user_message()));
            }
        }
    }
}

/// Map a rejected cart change onto the store's error.
fn content_error(err: CartContentError, operation: CartOperation) -> CartStoreError {
    match err {
        CartContentError::NotFound(product_id) => CartStoreError::NotInCart {
            product_id,
            operation,
        },
        other => CartStoreError::Content(other),
    }
}
