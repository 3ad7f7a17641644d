//! Catalog records served by the backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as returned by `GET products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Image URL.
    #[serde(default)]
    pub image: String,
}

/// Units available for a product, as returned by `GET stock/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    pub amount: u32,
}

impl Stock {
    /// Whether `requested` units can be taken from this stock.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_backend_record() {
        let json = r#"{"id": 1, "title": "Tênis de Caminhada", "price": 179.9, "image": "https://img/1.jpg"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.title, "Tênis de Caminhada");
        assert_eq!(product.price, Decimal::new(1799, 1));
    }

    #[test]
    fn test_product_without_image() {
        let json = r#"{"id": 2, "title": "Tênis", "price": "99.90"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.image.is_empty());
    }

    #[test]
    fn test_stock_covers() {
        let stock = Stock {
            id: ProductId::new(1),
            amount: 2,
        };
        assert!(stock.covers(2));
        assert!(!stock.covers(3));
        assert!(!stock.is_empty());
    }

    #[test]
    fn test_stock_rejects_negative_amount() {
        let json = r#"{"id": 1, "amount": -1}"#;
        assert!(serde_json::from_str::<Stock>(json).is_err());
    }
}
