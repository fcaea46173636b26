//! `PostgreSQL` store backing the order engine.
//!
//! Queries use the sqlx runtime API with `FromRow` row types that are
//! converted into domain models at the boundary; status columns are parsed
//! through the closed enums and unknown values are rejected as data
//! corruption rather than propagated.
//!
//! # Tables
//!
//! - `users` - user directory (read-only here)
//! - `products` - price, discount, stock, availability
//! - `cart_items` - per-user pre-checkout selections
//! - `orders` / `order_lines` - durable checkout results
//!
//! Migrations live in `crates/checkout/migrations/` and are embedded via
//! [`sqlx::migrate!`].

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use orchard_core::{
    AvailabilityStatus, OrderId, OrderLineId, OrderStatus, ProductId, UserId,
};

use super::{Store, StoreError, StoreTx};
use crate::config::StoreConfig;
use crate::models::{CartItem, NewOrder, NewOrderLine, Order, OrderLine, Product, User};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(config.database_url.expose_secret())
        .await
}

/// Run the embedded schema migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            email: row.email,
            active: row.active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    discount_percent: Decimal,
    stock: i32,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let status = AvailabilityStatus::from_str(&row.status)
            .map_err(|e| StoreError::DataCorruption(format!("product {}: {e}", row.id)))?;
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            discount_percent: row.discount_percent,
            stock: row.stock,
            status,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    user_id: i32,
    product_id: i32,
    quantity: i32,
    added_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            added_at: row.added_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    status: String,
    total: Decimal,
    shipping_address: String,
    payment_method: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status)
            .map_err(|e| StoreError::DataCorruption(format!("order {}: {e}", row.id)))?;
        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            status,
            total: row.total,
            shipping_address: row.shipping_address,
            payment_method: row.payment_method,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: OrderLineId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// `PostgreSQL`-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }
}

/// One open `PostgreSQL` transaction.
///
/// The stock invariant relies on [`StoreTx::decrement_stock`] being a
/// single conditional `UPDATE`; its `WHERE stock >= quantity` predicate is
/// re-evaluated after any row-lock wait, which makes it race-safe under
/// READ COMMITTED.
struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, active FROM users WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, discount_percent, stock, status, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn decrement_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        let remaining = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE products
            SET stock = stock - $2, updated_at = now()
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            ",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(remaining)
    }

    async fn increment_stock(
        &mut self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<i32>, StoreError> {
        let stock = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE products
            SET stock = stock + $2, updated_at = now()
            WHERE id = $1
            RETURNING stock
            ",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(stock)
    }

    async fn set_availability(
        &mut self,
        id: ProductId,
        status: AvailabilityStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE products SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id.as_i32())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn cart_items(&mut self, user_id: UserId) -> Result<Vec<CartItem>, StoreError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT user_id, product_id, quantity, added_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY added_at ASC, product_id ASC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_cart_item(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, StoreError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING user_id, product_id, quantity, added_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn set_cart_quantity(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_cart_item(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id.as_i32())
                .bind(product_id.as_i32())
                .execute(&mut *self.tx)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<Order, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (user_id, status, total, shipping_address, payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, status, total, shipping_address, payment_method,
                      notes, created_at
            ",
        )
        .bind(order.user_id.as_i32())
        .bind(order.status.as_str())
        .bind(order.total)
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(&order.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        row.try_into()
    }

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: &[NewOrderLine],
    ) -> Result<(), StoreError> {
        for line in lines {
            sqlx::query(
                r"
                INSERT INTO order_lines (order_id, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order_id.as_i32())
            .bind(line.product_id.as_i32())
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, total, shipping_address, payment_method,
                   notes, created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn order_lines(&mut self, order_id: OrderId) -> Result<Vec<OrderLine>, StoreError> {
        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT id, order_id, product_id, quantity, unit_price, subtotal
            FROM order_lines
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
