//! Integration test support for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocket-shoes-integration-tests
//! ```
//!
//! # Fake backend
//!
//! [`FakeBackend`] serves `GET /stock/{id}` and `GET /products/{id}` from an
//! in-process axum server bound to an ephemeral port. Tests seed it with
//! products and stock levels, flip it into failure modes, and count hits.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rocket_shoes_storefront::ApiConfig;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

#[derive(Default)]
struct BackendState {
    stock: Mutex<HashMap<i32, u32>>,
    products: Mutex<HashMap<i32, Value>>,
    /// Return 500 from every stock request.
    fail_stock: AtomicBool,
    /// Return 429 with this `Retry-After` from every request, when non-zero.
    rate_limit_secs: AtomicU64,
    /// Required `Authorization: Bearer` token, if any.
    token: Mutex<Option<String>>,
    stock_hits: AtomicUsize,
    product_hits: AtomicUsize,
}

impl BackendState {
    /// Common checks run before answering any request.
    fn gate(&self, headers: &HeaderMap) -> Option<Response> {
        let retry_after = self.rate_limit_secs.load(Ordering::SeqCst);
        if retry_after > 0 {
            return Some(
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, retry_after.to_string())],
                )
                    .into_response(),
            );
        }

        let expected = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(token) = expected {
            let sent = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if sent != Some(format!("Bearer {token}").as_str()) {
                return Some(StatusCode::UNAUTHORIZED.into_response());
            }
        }
        None
    }
}

/// In-process stand-in for the storefront backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    handle: JoinHandle<()>,
}

impl FakeBackend {
    /// Start serving on an ephemeral localhost port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(BackendState::default());
        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, %addr, "Fake backend stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL of the running server.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice: the base URL is always a valid http URL.
    #[must_use]
    #[allow(clippy::expect_used, clippy::missing_panics_doc)]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.base_url()).expect("fake backend URL is valid")
    }

    /// Register a product with `available` units in stock.
    pub fn add_product(&self, id: i32, title: &str, price: f64, available: u32) {
        self.state
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                json!({
                    "id": id,
                    "title": title,
                    "price": price,
                    "image": format!("https://rocketseat-cdn.s3-sa-east-1.amazonaws.com/tenis{id}.jpg"),
                }),
            );
        self.set_stock(id, available);
    }

    /// Serve a raw JSON body for `products/{id}`.
    pub fn set_product_body(&self, id: i32, body: Value) {
        self.state
            .products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, body);
    }

    pub fn set_stock(&self, id: i32, available: u32) {
        self.state
            .stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, available);
    }

    pub fn fail_stock(&self, fail: bool) {
        self.state.fail_stock.store(fail, Ordering::SeqCst);
    }

    /// Answer every request with 429; zero turns it off.
    pub fn rate_limit(&self, retry_after_secs: u64) {
        self.state
            .rate_limit_secs
            .store(retry_after_secs, Ordering::SeqCst);
    }

    pub fn require_token(&self, token: &str) {
        *self
            .state
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.state.stock_hits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.state.product_hits.load(Ordering::SeqCst)
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn stock(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    state.stock_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.gate(&headers) {
        return response;
    }
    if state.fail_stock.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "stock service unavailable").into_response();
    }

    let amount = state
        .stock
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();
    amount.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |amount| Json(json!({ "id": id, "amount": amount })).into_response(),
    )
}

async fn product(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    state.product_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(response) = state.gate(&headers) {
        return response;
    }

    let body = state
        .products
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    body.map_or_else(
        || StatusCode::NOT_FOUND.into_response(),
        |body| Json(body).into_response(),
    )
}
