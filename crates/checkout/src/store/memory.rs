//! In-memory [`Store`] for tests and local development.
//!
//! Transactions take an exclusive lock on the whole state for their
//! lifetime and mutate a working copy, so concurrent transactions are
//! serialized and a dropped transaction discards its writes - the same
//! observable guarantees the `PostgreSQL` store provides.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use orchard_core::{AvailabilityStatus, OrderId, OrderLineId, OrderStatus, ProductId, UserId};

use super::{Store, StoreError, StoreTx};
use crate::models::{CartItem, NewOrder, NewOrderLine, Order, OrderLine, Product, User};

#[derive(Debug, Clone, Default)]
struct MemState {
    users: HashMap<i32, User>,
    products: HashMap<i32, Product>,
    cart_items: Vec<CartItem>,
    orders: HashMap<i32, Order>,
    order_lines: Vec<OrderLine>,
    last_order_id: i32,
    last_line_id: i32,
}

impl MemState {
    fn next_order_id(&mut self) -> i32 {
        self.last_order_id += 1;
        self.last_order_id
    }

    fn next_line_id(&mut self) -> i32 {
        self.last_line_id += 1;
        self.last_line_id
    }
}

/// In-memory [`Store`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user directly, bypassing any transaction.
    pub async fn seed_user(&self, user: User) {
        let mut state = self.state.lock().await;
        state.users.insert(user.id.as_i32(), user);
    }

    /// Insert or replace a product directly, bypassing any transaction.
    pub async fn seed_product(&self, product: Product) {
        let mut state = self.state.lock().await;
        state.products.insert(product.id.as_i32(), product);
    }

    /// Put an item in a user's cart directly, bypassing any transaction.
    pub async fn seed_cart_item(&self, user_id: UserId, product_id: ProductId, quantity: i32) {
        let mut state = self.state.lock().await;
        state.cart_items.push(CartItem {
            user_id,
            product_id,
            quantity,
            added_at: Utc::now(),
        });
    }

    /// Committed snapshot of a product, for assertions.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.state.lock().await.products.get(&id.as_i32()).cloned()
    }

    /// Committed snapshot of an order, for assertions.
    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.state.lock().await.orders.get(&id.as_i32()).cloned()
    }

    /// Number of committed orders, for assertions.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Committed lines of an order, for assertions.
    pub async fn lines_for(&self, order_id: OrderId) -> Vec<OrderLine> {
        self.state
            .lock()
            .await
            .order_lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Committed cart contents of a user, for assertions.
    pub async fn cart(&self, user_id: UserId) -> Vec<CartItem> {
        self.state
            .lock()
            .await
            .cart_items
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

/// One open in-memory transaction.
///
/// Holds the state lock until commit or drop; `work` is the transaction's
/// private copy, swapped into place on commit.
struct MemoryTx {
    guard: OwnedMutexGuard<MemState>,
    work: MemState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.work.users.get(&id.as_i32()).cloned())
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.work.products.get(&id.as_i32()).cloned())
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        Ok(self.work.products.get_mut(&id.as_i32()).and_then(|p| {
            if p.stock >= quantity {
                p.stock -= quantity;
                p.updated_at = Utc::now();
                Some(p.stock)
            } else {
                None
            }
        }))
    }

    async fn increment_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        Ok(self.work.products.get_mut(&id.as_i32()).map(|p| {
            p.stock += quantity;
            p.updated_at = Utc::now();
            p.stock
        }))
    }

    async fn set_availability(
        &mut self,
        id: ProductId,
        status: AvailabilityStatus,
    ) -> Result<(), StoreError> {
        if let Some(p) = self.work.products.get_mut(&id.as_i32()) {
            p.status = status;
            p.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn cart_items(&mut self, user_id: UserId) -> Result<Vec<CartItem>, StoreError> {
        Ok(self
            .work
            .cart_items
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_cart_item(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError> {
        let existing = self
            .work
            .cart_items
            .iter_mut()
            .find(|i| i.user_id == user_id && i.product_id == product_id);

        if let Some(item) = existing {
            item.quantity += quantity;
            return Ok(item.clone());
        }

        let item = CartItem {
            user_id,
            product_id,
            quantity,
            added_at: Utc::now(),
        };
        self.work.cart_items.push(item.clone());
        Ok(item)
    }

    async fn set_cart_quantity(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        let existing = self
            .work
            .cart_items
            .iter_mut()
            .find(|i| i.user_id == user_id && i.product_id == product_id);

        Ok(match existing {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        })
    }

    async fn remove_cart_item(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        let before = self.work.cart_items.len();
        self.work
            .cart_items
            .retain(|i| !(i.user_id == user_id && i.product_id == product_id));
        Ok(self.work.cart_items.len() < before)
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<(), StoreError> {
        self.work.cart_items.retain(|i| i.user_id != user_id);
        Ok(())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, StoreError> {
        let id = self.work.next_order_id();
        let stored = Order {
            id: OrderId::new(id),
            user_id: order.user_id,
            status: order.status,
            total: order.total,
            shipping_address: order.shipping_address.clone(),
            payment_method: order.payment_method.clone(),
            notes: order.notes.clone(),
            created_at: Utc::now(),
        };
        self.work.orders.insert(id, stored.clone());
        Ok(stored)
    }

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), StoreError> {
        for line in lines {
            let id = self.work.next_line_id();
            self.work.order_lines.push(OrderLine {
                id: OrderLineId::new(id),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }
        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.work.orders.get(&id.as_i32()).cloned())
    }

    async fn order_lines(&mut self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError> {
        Ok(self
            .work
            .order_lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        if let Some(order) = self.work.orders.get_mut(&id.as_i32()) {
            order.status = status;
        }
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        *self.guard = self.work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Dropping the working copy discards every write.
        Ok(())
    }
}
