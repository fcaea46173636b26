//! Cart mutation service.
//!
//! Add/update/remove run in their own short transactions, deliberately
//! outside the checkout transaction: a cart may change while a checkout is
//! in flight, and the checkout's conditional stock decrement remains the
//! sole authority for correctness regardless of what these checks saw.

use std::sync::Arc;

use tracing::instrument;

use orchard_core::{ProductId, UserId};

use crate::error::CheckoutError;
use crate::ledger;
use crate::models::{CartItem, Product};
use crate::pricing::{self, CartPricing};
use crate::store::{Store, StoreTx};

/// Manages a user's pre-checkout cart.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn Store>,
}

impl CartService {
    /// Create a service over an injected store handle.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Add a product to the cart, accumulating quantity if already present.
    ///
    /// The resulting total quantity is checked against current stock; the
    /// check is advisory only (checkout re-verifies at write time).
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidQuantity`] for a non-positive
    /// quantity, [`CheckoutError::UserNotFound`],
    /// [`CheckoutError::ProductNotFound`], [`CheckoutError::Unavailable`],
    /// [`CheckoutError::InsufficientStock`], or
    /// [`CheckoutError::OperationFailed`].
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, CheckoutError> {
        if quantity < 1 {
            return Err(CheckoutError::InvalidQuantity(quantity));
        }

        let mut tx = self.store.begin().await?;
        let result = async {
            require_user(tx.as_mut(), user_id).await?;
            let product = require_sellable(tx.as_mut(), product_id).await?;

            let item = tx.upsert_cart_item(user_id, product_id, quantity).await?;
            if item.quantity > product.stock {
                return Err(CheckoutError::InsufficientStock {
                    product_id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
            Ok(item)
        }
        .await;

        finish(tx, result).await
    }

    /// Replace the quantity of a product already in the cart.
    ///
    /// # Errors
    ///
    /// As [`Self::add_item`]; a product not in the cart reports
    /// [`CheckoutError::ProductNotFound`].
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), CheckoutError> {
        if quantity < 1 {
            return Err(CheckoutError::InvalidQuantity(quantity));
        }

        let mut tx = self.store.begin().await?;
        let result = async {
            require_user(tx.as_mut(), user_id).await?;
            let product = require_sellable(tx.as_mut(), product_id).await?;
            if !ledger::verify_stock(tx.as_mut(), product_id, quantity).await? {
                return Err(CheckoutError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available: product.stock,
                });
            }

            if !tx.set_cart_quantity(user_id, product_id, quantity).await? {
                return Err(CheckoutError::ProductNotFound(product_id));
            }
            Ok(())
        }
        .await;

        finish(tx, result).await
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ProductNotFound`] if the product is not in
    /// the cart, or [`CheckoutError::OperationFailed`].
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), CheckoutError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            if !tx.remove_cart_item(user_id, product_id).await? {
                return Err(CheckoutError::ProductNotFound(product_id));
            }
            Ok(())
        }
        .await;

        finish(tx, result).await
    }

    /// The user's cart items, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OperationFailed`] on storage failure.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, CheckoutError> {
        let mut tx = self.store.begin().await?;
        let result = tx.cart_items(user_id).await.map_err(Into::into);
        let _ = tx.rollback().await;
        result
    }

    /// The user's cart priced against live product data, with problems.
    ///
    /// A non-empty problem list does not block anything; the caller
    /// decides whether to proceed to checkout.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::OperationFailed`] on storage failure.
    pub async fn price(&self, user_id: UserId) -> Result<CartPricing, CheckoutError> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let items = tx.cart_items(user_id).await?;
            pricing::price_cart(tx.as_mut(), &items).await
        }
        .await;
        let _ = tx.rollback().await;
        result
    }
}

async fn require_user(tx: &mut dyn StoreTx, user_id: UserId) -> Result<(), CheckoutError> {
    tx.find_user(user_id)
        .await?
        .filter(|u| u.active)
        .map(|_| ())
        .ok_or(CheckoutError::UserNotFound(user_id))
}

async fn require_sellable(
    tx: &mut dyn StoreTx,
    product_id: ProductId,
) -> Result<Product, CheckoutError> {
    let product = tx
        .find_product(product_id)
        .await?
        .ok_or(CheckoutError::ProductNotFound(product_id))?;
    if !product.status.is_sellable() {
        return Err(CheckoutError::Unavailable {
            product_id,
            status: product.status,
        });
    }
    Ok(product)
}

/// Commit on success, roll back on failure, preserving the original error.
async fn finish<T>(
    tx: Box<dyn StoreTx>,
    result: Result<T, CheckoutError>,
) -> Result<T, CheckoutError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
