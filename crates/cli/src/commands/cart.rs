//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! rs-cart show
//! rs-cart add 1
//! rs-cart update 1 3
//! rs-cart remove 1
//! ```
//!
//! # Environment Variables
//!
//! - `CART_API_URL` - Backend serving `stock/{id}` and `products/{id}`
//! - `CART_STORAGE_PATH` - Local storage file holding the cart
//!
//! See `CartConfig` for the full list.

use rocket_shoes_core::{Cart, CurrencyCode, Price, ProductId};
use rocket_shoes_storefront::{
    ApiClient, CartConfig, CartStore, CartStoreError, FileStorage, TracingNotifier,
    UpdateProductAmount,
};

pub type Store = CartStore<ApiClient, FileStorage, TracingNotifier>;

/// Build the store from configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or storage cannot be read.
pub fn open_store(config: &CartConfig) -> Result<Store, Box<dyn std::error::Error>> {
    let catalog = ApiClient::new(&config.api)?;
    let storage = FileStorage::new(&config.storage.path);
    tracing::debug!(path = %storage.path().display(), "Opening cart storage");

    Ok(CartStore::open(
        catalog,
        storage,
        TracingNotifier,
        config.storage.cart_key.as_str(),
    )?)
}

/// Log the cart contents.
pub fn show(store: &Store, currency: CurrencyCode) {
    for line in summary_lines(store.cart(), currency) {
        tracing::info!("{line}");
    }
}

/// Add one unit of `product_id`, then log the cart.
///
/// # Errors
///
/// Returns the store error; the toast has already been logged.
pub async fn add(
    store: &mut Store,
    product_id: ProductId,
    currency: CurrencyCode,
) -> Result<(), CartStoreError> {
    store.add_product(product_id).await?;
    show(store, currency);
    Ok(())
}

/// Remove `product_id`, then log the cart.
///
/// # Errors
///
/// Returns the store error; the toast has already been logged.
pub fn remove(
    store: &mut Store,
    product_id: ProductId,
    currency: CurrencyCode,
) -> Result<(), CartStoreError> {
    store.remove_product(product_id)?;
    show(store, currency);
    Ok(())
}

/// Set the amount of `product_id`, then log the cart.
///
/// # Errors
///
/// Returns the store error; the toast has already been logged.
pub async fn update(
    store: &mut Store,
    product_id: ProductId,
    amount: i64,
    currency: CurrencyCode,
) -> Result<(), CartStoreError> {
    store
        .update_product_amount(UpdateProductAmount { product_id, amount })
        .await?;
    show(store, currency);
    Ok(())
}

/// Render the cart as display lines: one per item, then the total.
#[must_use]
pub fn summary_lines(cart: &Cart, currency: CurrencyCode) -> Vec<String> {
    if cart.is_empty() {
        return vec!["Cart is empty".to_string()];
    }

    let mut lines: Vec<String> = cart
        .iter()
        .map(|item| {
            format!(
                "#{} {} - {} x {} = {}",
                item.id,
                item.title,
                item.amount,
                Price::new(item.price, currency).display(),
                Price::new(item.subtotal(), currency).display(),
            )
        })
        .collect();

    lines.push(format!(
        "Total ({} items): {}",
        cart.item_count(),
        Price::new(cart.total(), currency).display()
    ));
    lines
}
