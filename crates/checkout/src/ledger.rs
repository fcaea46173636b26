//! Inventory ledger: atomic, race-safe stock primitives.
//!
//! All mutations go through the store's conditional compare-and-update, so
//! stock never goes negative no matter how many checkouts race. The ledger
//! also maintains the automatic availability flips: a product whose stock
//! reaches exactly zero becomes `OUT_OF_STOCK`, and one whose stock rises
//! above zero becomes `AVAILABLE` again - unless it is `DISCONTINUED`, a
//! terminal manual state the ledger never assigns or clears.

use orchard_core::{AvailabilityStatus, ProductId};

use crate::CheckoutError;
use crate::store::StoreTx;

/// Read-only check that the product has at least `quantity` units.
///
/// # Errors
///
/// Returns [`CheckoutError::ProductNotFound`] if there is no such product,
/// or [`CheckoutError::OperationFailed`] on storage failure.
pub async fn verify_stock(
    tx: &mut dyn StoreTx,
    product_id: ProductId,
    quantity: i32,
) -> Result<bool, CheckoutError> {
    let product = tx
        .find_product(product_id)
        .await?
        .ok_or(CheckoutError::ProductNotFound(product_id))?;
    Ok(product.stock >= quantity)
}

/// Subtract `quantity` from the product's stock, conditionally.
///
/// The update applies only if sufficient stock exists at write time; a
/// refused decrement is a hard failure for the caller and is never retried
/// here.
///
/// # Errors
///
/// Returns [`CheckoutError::InsufficientStock`] (with the quantity actually
/// available) if the conditional update refused,
/// [`CheckoutError::ProductNotFound`] if the product vanished, or
/// [`CheckoutError::OperationFailed`] on storage failure.
pub async fn decrement_stock(
    tx: &mut dyn StoreTx,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), CheckoutError> {
    match tx.decrement_stock(product_id, quantity).await? {
        Some(0) => {
            // Last units sold: flip availability unless manually discontinued.
            let product = tx
                .find_product(product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(product_id))?;
            if product.status == AvailabilityStatus::Available {
                tx.set_availability(product_id, AvailabilityStatus::OutOfStock)
                    .await?;
            }
            Ok(())
        }
        Some(_) => Ok(()),
        None => {
            let product = tx
                .find_product(product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(product_id))?;
            Err(CheckoutError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            })
        }
    }
}

/// Add `quantity` back to the product's stock, unconditionally.
///
/// Used only to reverse a prior decrement on cancellation; succeeds
/// regardless of the current stock value.
///
/// # Errors
///
/// Returns [`CheckoutError::ProductNotFound`] if there is no such product,
/// or [`CheckoutError::OperationFailed`] on storage failure.
pub async fn restore_stock(
    tx: &mut dyn StoreTx,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), CheckoutError> {
    let stock = tx
        .increment_stock(product_id, quantity)
        .await?
        .ok_or(CheckoutError::ProductNotFound(product_id))?;

    if stock > 0 {
        let product = tx
            .find_product(product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(product_id))?;
        if product.status == AvailabilityStatus::OutOfStock {
            tx.set_availability(product_id, AvailabilityStatus::Available)
                .await?;
        }
    }

    Ok(())
}
