//! Integration tests for the Orchard order engine.
//!
//! Tests run against the in-memory store, which the engine accepts through
//! the same injected [`Store`] handle as `PostgreSQL`. The helpers here
//! seed users, products, and carts, and hand out the three services wired
//! to one shared store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p orchard-integration-tests
//! ```

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use orchard_checkout::models::{Product, User};
use orchard_checkout::store::{MemoryStore, Store};
use orchard_checkout::{CartService, CheckoutRequest, CheckoutService, LifecycleService};
use orchard_core::{AvailabilityStatus, ProductId, UserId};

/// A fresh in-memory store and the services wired to it.
pub struct TestContext {
    pub store: MemoryStore,
    pub checkout: CheckoutService,
    pub lifecycle: LifecycleService,
    pub cart: CartService,
}

impl TestContext {
    /// Build a context with logging initialized.
    #[must_use]
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("orchard_checkout=debug")
            .with_test_writer()
            .try_init();

        let store = MemoryStore::new();
        let handle: Arc<dyn Store> = Arc::new(store.clone());
        Self {
            store,
            checkout: CheckoutService::new(Arc::clone(&handle)),
            lifecycle: LifecycleService::new(Arc::clone(&handle)),
            cart: CartService::new(handle),
        }
    }

    /// Seed an active user.
    pub async fn seed_user(&self, id: i32) -> UserId {
        let user_id = UserId::new(id);
        self.store
            .seed_user(User {
                id: user_id,
                email: format!("user{id}@example.com"),
                active: true,
            })
            .await;
        user_id
    }

    /// Seed an available product with no discount.
    pub async fn seed_product(&self, id: i32, price: i64, stock: i32) -> ProductId {
        self.seed_discounted_product(id, price, 0, stock).await
    }

    /// Seed an available product with a whole-percent discount.
    pub async fn seed_discounted_product(
        &self,
        id: i32,
        price: i64,
        discount_percent: i64,
        stock: i32,
    ) -> ProductId {
        let product_id = ProductId::new(id);
        self.store
            .seed_product(Product {
                id: product_id,
                name: format!("product-{id}"),
                price: Decimal::from(price),
                discount_percent: Decimal::from(discount_percent),
                stock,
                status: AvailabilityStatus::Available,
                updated_at: Utc::now(),
            })
            .await;
        product_id
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A well-formed checkout request for the given user.
#[must_use]
pub fn checkout_request(user_id: UserId) -> CheckoutRequest {
    CheckoutRequest {
        user_id,
        shipping_address: "12 Orchard Lane".to_string(),
        payment_method: "card".to_string(),
        notes: None,
    }
}
