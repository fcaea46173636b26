//! Cart validation and pricing.
//!
//! Enriches a user's cart items with live product data and
//! discount-adjusted totals, collecting availability problems along the
//! way. This module performs reads only and never blocks anything itself:
//! a non-empty problem list is information for the caller, which decides
//! whether to halt checkout.

use rust_decimal::Decimal;
use thiserror::Error;

use orchard_core::{AvailabilityStatus, ProductId, line_discount, line_subtotal};

use crate::CheckoutError;
use crate::models::{CartItem, Product};
use crate::store::StoreTx;

/// A cart item that cannot currently be bought as requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartProblem {
    /// The product no longer exists in the catalog.
    #[error("product {product_id} no longer exists")]
    ProductMissing { product_id: ProductId },

    /// The product exists but is not sellable.
    #[error("{name} is not available ({status})")]
    NotAvailable {
        product_id: ProductId,
        name: String,
        status: AvailabilityStatus,
    },

    /// Requested quantity exceeds current stock; the message states how
    /// many units are available.
    #[error("only {available} of {name} in stock ({requested} requested)")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: i32,
        available: i32,
    },
}

impl From<CartProblem> for CheckoutError {
    fn from(problem: CartProblem) -> Self {
        match problem {
            CartProblem::ProductMissing { product_id } => Self::ProductNotFound(product_id),
            CartProblem::NotAvailable {
                product_id, status, ..
            } => Self::Unavailable { product_id, status },
            CartProblem::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            } => Self::InsufficientStock {
                product_id,
                requested,
                available,
            },
        }
    }
}

/// A cart line enriched with a pricing snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    /// Undiscounted unit price at pricing time.
    pub unit_price: Decimal,
    /// Unit price after the product's current discount.
    pub discounted_unit_price: Decimal,
    /// `discounted_unit_price * quantity`.
    pub subtotal: Decimal,
    /// Discount granted on this line relative to the undiscounted price.
    pub discount: Decimal,
}

/// Result of pricing a cart: valid lines, aggregates, and problems.
#[derive(Debug, Clone, Default)]
pub struct CartPricing {
    pub lines: Vec<PricedLine>,
    /// Sum of valid line subtotals (already discount-adjusted).
    pub subtotal: Decimal,
    /// Total discount granted across valid lines.
    pub total_discount: Decimal,
    /// Amount the user would pay; equals `subtotal`.
    pub grand_total: Decimal,
    pub problems: Vec<CartProblem>,
}

impl CartPricing {
    /// Whether every cart item priced cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Price one valid line from a product snapshot. Pure.
#[must_use]
pub fn price_line(product: &Product, quantity: i32) -> PricedLine {
    let discounted = product.discounted_price();
    PricedLine {
        product_id: product.id,
        name: product.name.clone(),
        quantity,
        unit_price: product.price,
        discounted_unit_price: discounted,
        subtotal: line_subtotal(discounted, quantity),
        discount: line_discount(product.price, discounted, quantity),
    }
}

/// Check one cart item against its product snapshot, if any.
fn check_item(item: &CartItem, product: Option<&Product>) -> Option<CartProblem> {
    let Some(product) = product else {
        return Some(CartProblem::ProductMissing {
            product_id: item.product_id,
        });
    };
    if !product.status.is_sellable() {
        return Some(CartProblem::NotAvailable {
            product_id: product.id,
            name: product.name.clone(),
            status: product.status,
        });
    }
    if item.quantity > product.stock {
        return Some(CartProblem::InsufficientStock {
            product_id: product.id,
            name: product.name.clone(),
            requested: item.quantity,
            available: product.stock,
        });
    }
    None
}

/// Price a cart against live product data.
///
/// Resolves every item's product through the given transaction, prices the
/// valid ones, and aggregates. Side-effect free: only reads go through the
/// transaction.
///
/// # Errors
///
/// Returns [`CheckoutError::OperationFailed`] if a product lookup fails at
/// the storage level. Availability problems are not errors here; they are
/// returned in [`CartPricing::problems`].
pub async fn price_cart(
    tx: &mut dyn StoreTx,
    items: &[CartItem],
) -> Result<CartPricing, CheckoutError> {
    let mut pricing = CartPricing::default();

    for item in items {
        let product = tx.find_product(item.product_id).await?;
        match check_item(item, product.as_ref()) {
            Some(problem) => pricing.problems.push(problem),
            None => {
                // check_item returned None, so the product exists.
                if let Some(product) = product {
                    let line = price_line(&product, item.quantity);
                    pricing.subtotal += line.subtotal;
                    pricing.total_discount += line.discount;
                    pricing.lines.push(line);
                }
            }
        }
    }

    pricing.grand_total = pricing.subtotal;
    Ok(pricing)
}
