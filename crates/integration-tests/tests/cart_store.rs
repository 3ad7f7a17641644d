//! End-to-end cart store tests.
//!
//! These run the real `ApiClient` against the in-process fake backend and
//! persist to a `FileStorage` in a temporary directory.

use std::path::PathBuf;

use rocket_shoes_core::{Cart, ProductId};
use rocket_shoes_integration_tests::FakeBackend;
use rocket_shoes_storefront::storage::load_cart;
use rocket_shoes_storefront::{
    ApiClient, CartOperation, CartOutcome, CartStore, CartStoreError, CatalogError, FileStorage,
    LocalStorage, MemoryNotifier, ToastKind, UpdateProductAmount,
};
use tempfile::TempDir;

const KEY: &str = "@RocketShoes:cart";

type Store = CartStore<ApiClient, FileStorage, MemoryNotifier>;

struct Harness {
    backend: FakeBackend,
    dir: TempDir,
    notifier: MemoryNotifier,
}

impl Harness {
    async fn new() -> Self {
        Self {
            backend: FakeBackend::start().await.unwrap(),
            dir: tempfile::tempdir().unwrap(),
            notifier: MemoryNotifier::new(),
        }
    }

    fn storage_path(&self) -> PathBuf {
        self.dir.path().join("local_storage.json")
    }

    fn open(&self) -> Store {
        let catalog = ApiClient::new(&self.backend.api_config()).unwrap();
        CartStore::open(
            catalog,
            FileStorage::new(self.storage_path()),
            self.notifier.clone(),
            KEY,
        )
        .unwrap()
    }

    fn persisted(&self) -> Option<Cart> {
        load_cart(&FileStorage::new(self.storage_path()), KEY).unwrap()
    }

    fn last_message(&self) -> String {
        self.notifier.last().unwrap().message
    }
}

fn update(id: i32, amount: i64) -> UpdateProductAmount {
    UpdateProductAmount {
        product_id: ProductId::new(id),
        amount,
    }
}

// =============================================================================
// add_product
// =============================================================================

#[tokio::test]
async fn test_add_new_product_creates_single_entry() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis de Caminhada Leve Confortável", 179.9, 3);
    let mut store = h.open();

    let outcome = store.add_product(ProductId::new(1)).await.unwrap();

    assert_eq!(outcome, CartOutcome::Added);
    assert_eq!(store.cart().len(), 1);
    let item = store.cart().get(ProductId::new(1)).unwrap();
    assert_eq!(item.amount, 1);
    assert_eq!(item.title, "Tênis de Caminhada Leve Confortável");
    assert_eq!(h.persisted().as_ref(), Some(store.cart()));
    assert_eq!(h.last_message(), "Item added to cart");
    assert_eq!(h.backend.stock_hits(), 1);
    assert_eq!(h.backend.product_hits(), 1);
}

#[tokio::test]
async fn test_add_existing_product_increments_up_to_stock() {
    let h = Harness::new().await;
    h.backend.add_product(2, "Tênis VR Caminhada", 139.9, 2);
    let mut store = h.open();

    store.add_product(ProductId::new(2)).await.unwrap();
    let outcome = store.add_product(ProductId::new(2)).await.unwrap();
    assert_eq!(outcome, CartOutcome::AmountUpdated { amount: 2 });
    assert_eq!(h.last_message(), "Item amount updated");

    let err = store.add_product(ProductId::new(2)).await.unwrap_err();
    assert!(matches!(
        err,
        CartStoreError::OutOfStock {
            requested: 3,
            available: 2,
            ..
        }
    ));
    assert_eq!(store.cart().get(ProductId::new(2)).unwrap().amount, 2);
    assert_eq!(h.persisted().unwrap().get(ProductId::new(2)).unwrap().amount, 2);
    assert_eq!(h.last_message(), "Requested amount is out of stock");

    // Product record is fetched once; increments only check stock
    assert_eq!(h.backend.product_hits(), 1);
    assert_eq!(h.backend.stock_hits(), 3);
}

#[tokio::test]
async fn test_add_with_zero_stock_leaves_cart_unchanged() {
    let h = Harness::new().await;
    h.backend.add_product(3, "Tênis Adidas Duramo Lite 2.0", 219.9, 0);
    let mut store = h.open();

    let err = store.add_product(ProductId::new(3)).await.unwrap_err();

    assert!(matches!(err, CartStoreError::OutOfStock { available: 0, .. }));
    assert!(store.cart().is_empty());
    assert!(!h.storage_path().exists());
    assert_eq!(h.backend.product_hits(), 0);

    let toast = h.notifier.last().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, "Requested amount is out of stock");
}

#[tokio::test]
async fn test_add_when_stock_service_fails() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 99.9, 5);
    h.backend.fail_stock(true);
    let mut store = h.open();

    let err = store.add_product(ProductId::new(1)).await.unwrap_err();

    assert!(matches!(
        err,
        CartStoreError::Fetch {
            source: CatalogError::Status { status: 500, .. },
            ..
        }
    ));
    assert!(store.cart().is_empty());
    assert_eq!(h.last_message(), "Error adding product");
}

#[tokio::test]
async fn test_add_unknown_product() {
    let h = Harness::new().await;
    let mut store = h.open();

    let err = store.add_product(ProductId::new(42)).await.unwrap_err();

    assert!(matches!(
        err,
        CartStoreError::Fetch {
            source: CatalogError::NotFound(_),
            ..
        }
    ));
    assert_eq!(h.last_message(), "Error adding product");
}

#[tokio::test]
async fn test_add_when_product_record_is_malformed() {
    let h = Harness::new().await;
    h.backend.set_stock(4, 3);
    h.backend
        .set_product_body(4, serde_json::json!({ "id": 4, "name": "missing title and price" }));
    let mut store = h.open();

    let err = store.add_product(ProductId::new(4)).await.unwrap_err();

    assert!(matches!(
        err,
        CartStoreError::Fetch {
            source: CatalogError::Parse(_),
            ..
        }
    ));
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_add_when_rate_limited() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 99.9, 5);
    h.backend.rate_limit(7);
    let mut store = h.open();

    let err = store.add_product(ProductId::new(1)).await.unwrap_err();

    assert!(matches!(
        err,
        CartStoreError::Fetch {
            source: CatalogError::RateLimited(7),
            ..
        }
    ));
    assert_eq!(h.last_message(), "Error adding product");
}

// =============================================================================
// remove_product
// =============================================================================

#[tokio::test]
async fn test_remove_present_product_deletes_only_that_entry() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis A", 99.9, 5);
    h.backend.add_product(2, "Tênis B", 149.9, 5);
    h.backend.add_product(3, "Tênis C", 199.9, 5);
    let mut store = h.open();
    for id in [1, 2, 3] {
        store.add_product(ProductId::new(id)).await.unwrap();
    }

    let outcome = store.remove_product(ProductId::new(2)).unwrap();

    assert_eq!(outcome, CartOutcome::Removed);
    let ids: Vec<i32> = store.cart().iter().map(|i| i.id.as_i32()).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(h.persisted().as_ref(), Some(store.cart()));
    assert_eq!(h.last_message(), "Item removed from cart");
}

#[tokio::test]
async fn test_remove_absent_product_leaves_cart_unchanged() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis A", 99.9, 5);
    let mut store = h.open();
    store.add_product(ProductId::new(1)).await.unwrap();
    let before = store.cart().clone();

    let err = store.remove_product(ProductId::new(2)).unwrap_err();

    assert!(matches!(
        err,
        CartStoreError::NotInCart {
            operation: CartOperation::Remove,
            ..
        }
    ));
    assert_eq!(store.cart(), &before);
    assert_eq!(h.persisted(), Some(before));
    assert_eq!(h.last_message(), "Error removing product");
}

// =============================================================================
// update_product_amount
// =============================================================================

#[tokio::test]
async fn test_update_above_stock_emits_out_of_stock() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 179.9, 2);
    let mut store = h.open();
    store.add_product(ProductId::new(1)).await.unwrap();
    store.update_product_amount(update(1, 2)).await.unwrap();
    let before = store.cart().clone();

    let err = store.update_product_amount(update(1, 3)).await.unwrap_err();

    assert!(matches!(err, CartStoreError::OutOfStock { .. }));
    assert_eq!(store.cart(), &before);
    assert_eq!(h.persisted(), Some(before));
    assert_eq!(h.last_message(), "Requested amount is out of stock");
}

#[tokio::test]
async fn test_update_below_one_is_noop() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 179.9, 5);
    let mut store = h.open();
    store.add_product(ProductId::new(1)).await.unwrap();
    let toasts = h.notifier.toasts().len();
    let stock_hits = h.backend.stock_hits();

    let outcome = store.update_product_amount(update(1, 0)).await.unwrap();

    assert_eq!(outcome, CartOutcome::Unchanged);
    assert_eq!(store.cart().get(ProductId::new(1)).unwrap().amount, 1);
    assert_eq!(h.notifier.toasts().len(), toasts);
    assert_eq!(h.backend.stock_hits(), stock_hits);
}

#[tokio::test]
async fn test_update_absent_product() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 179.9, 5);
    let mut store = h.open();

    let err = store.update_product_amount(update(1, 2)).await.unwrap_err();

    assert!(matches!(
        err,
        CartStoreError::NotInCart {
            operation: CartOperation::UpdateAmount,
            ..
        }
    ));
    assert_eq!(h.last_message(), "Error updating product amount");
    assert_eq!(h.backend.stock_hits(), 0);
}

#[tokio::test]
async fn test_update_reflects_latest_stock() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 179.9, 5);
    let mut store = h.open();
    store.add_product(ProductId::new(1)).await.unwrap();

    h.backend.set_stock(1, 1);
    let err = store.update_product_amount(update(1, 2)).await.unwrap_err();
    assert!(matches!(err, CartStoreError::OutOfStock { available: 1, .. }));

    h.backend.set_stock(1, 10);
    let outcome = store.update_product_amount(update(1, 10)).await.unwrap();
    assert_eq!(outcome, CartOutcome::AmountUpdated { amount: 10 });
    assert_eq!(h.persisted().unwrap().item_count(), 10);
}

#[tokio::test]
async fn test_update_when_stock_service_fails() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 179.9, 5);
    let mut store = h.open();
    store.add_product(ProductId::new(1)).await.unwrap();
    h.backend.fail_stock(true);

    let err = store.update_product_amount(update(1, 2)).await.unwrap_err();

    assert!(matches!(err, CartStoreError::Fetch { .. }));
    assert_eq!(store.cart().get(ProductId::new(1)).unwrap().amount, 1);
    assert_eq!(h.last_message(), "Error adding product");
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_reopen_restores_cart_in_order() {
    let h = Harness::new().await;
    h.backend.add_product(3, "Tênis C", 199.9, 5);
    h.backend.add_product(1, "Tênis A", 99.9, 5);
    {
        let mut store = h.open();
        store.add_product(ProductId::new(3)).await.unwrap();
        store.add_product(ProductId::new(1)).await.unwrap();
        store.add_product(ProductId::new(1)).await.unwrap();
    }

    let store = h.open();
    let items: Vec<(i32, u32)> = store
        .cart()
        .iter()
        .map(|i| (i.id.as_i32(), i.amount))
        .collect();
    assert_eq!(items, vec![(3, 1), (1, 2)]);
}

#[tokio::test]
async fn test_corrupt_stored_cart_starts_empty_and_is_overwritten() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 179.9, 5);
    let mut raw = FileStorage::new(h.storage_path());
    raw.set_item(KEY, "[{\"id\": 1}").unwrap();
    raw.set_item("@RocketShoes:theme", "dark").unwrap();

    let mut store = h.open();
    assert!(store.cart().is_empty());

    store.add_product(ProductId::new(1)).await.unwrap();

    assert_eq!(h.persisted().as_ref(), Some(store.cart()));
    assert_eq!(
        raw.get_item("@RocketShoes:theme").unwrap().as_deref(),
        Some("dark")
    );
}

#[tokio::test]
async fn test_corrupt_storage_file_fails_open() {
    let h = Harness::new().await;
    std::fs::write(h.storage_path(), "not json at all").unwrap();

    let catalog = ApiClient::new(&h.backend.api_config()).unwrap();
    let result = CartStore::open(
        catalog,
        FileStorage::new(h.storage_path()),
        MemoryNotifier::new(),
        KEY,
    );

    assert!(result.is_err());
}

#[tokio::test]
async fn test_every_operation_emits_one_toast() {
    let h = Harness::new().await;
    h.backend.add_product(1, "Tênis", 179.9, 2);
    let mut store = h.open();

    store.add_product(ProductId::new(1)).await.unwrap();
    store.add_product(ProductId::new(1)).await.unwrap();
    let _ = store.add_product(ProductId::new(1)).await;
    let _ = store.remove_product(ProductId::new(9));
    store.remove_product(ProductId::new(1)).unwrap();

    let kinds: Vec<ToastKind> = h.notifier.toasts().iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ToastKind::Success,
            ToastKind::Success,
            ToastKind::Error,
            ToastKind::Error,
            ToastKind::Success,
        ]
    );
    assert!(store.cart().is_empty());
    assert_eq!(h.persisted(), Some(Cart::new()));
}
