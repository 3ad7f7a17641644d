//! The shopping cart and its line items.
//!
//! A [`Cart`] is an ordered list of [`CartItem`]s. Items are appended at the
//! end and only ever leave by removal, so the order is the order in which
//! products were first added.
//!
//! ## Invariants
//!
//! - At most one item per [`ProductId`]
//! - Every item's `amount` is at least 1
//!
//! Both hold for every `Cart` value, including ones produced by
//! deserialization: decoding a list that breaks them fails with
//! [`CartContentError`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// Errors raised when an operation would break a cart invariant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartContentError {
    /// The product already has an item in the cart.
    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),
    /// An item would hold zero units.
    #[error("product {0} must have an amount of at least 1")]
    ZeroAmount(ProductId),
    /// The product has no item in the cart.
    #[error("product {0} is not in the cart")]
    NotFound(ProductId),
}

/// A product held in the cart together with the quantity selected.
///
/// Serializes flat, as the product record plus an `amount` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub amount: u32,
}

impl CartItem {
    /// Create an item for `product` holding `amount` units.
    #[must_use]
    pub fn new(product: Product, amount: u32) -> Self {
        Self {
            id: product.id,
            title: product.title,
            price: product.price,
            image: product.image,
            amount,
        }
    }

    /// Unit price multiplied by the amount held.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.amount)
    }
}

/// An ordered, duplicate-free list of cart items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Append an item at the end of the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is already present or the item holds
    /// zero units.
    pub fn push(&mut self, item: CartItem) -> Result<(), CartContentError> {
        if item.amount == 0 {
            return Err(CartContentError::ZeroAmount(item.id));
        }
        if self.contains(item.id) {
            return Err(CartContentError::DuplicateItem(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove the item for `id`, keeping the order of the others.
    ///
    /// # Errors
    ///
    /// Returns [`CartContentError::NotFound`] if the product is not present.
    pub fn remove(&mut self, id: ProductId) -> Result<CartItem, CartContentError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(CartContentError::NotFound(id))?;
        Ok(self.items.remove(index))
    }

    /// Set the amount held for `id` in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not present or `amount` is zero.
    pub fn set_amount(&mut self, id: ProductId, amount: u32) -> Result<(), CartContentError> {
        if amount == 0 {
            return Err(CartContentError::ZeroAmount(id));
        }
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(CartContentError::NotFound(id))?;
        item.amount = amount;
        Ok(())
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Sum of all item subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartContentError;

    fn try_from(items: Vec<CartItem>) -> Result<Self, Self::Error> {
        let mut cart = Self::new();
        for item in items {
            cart.push(item)?;
        }
        Ok(cart)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
