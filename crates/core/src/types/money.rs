//! Discount-adjusted price arithmetic.
//!
//! All monetary amounts are `rust_decimal::Decimal` in the currency's
//! standard unit (dollars, not cents). Results are rounded to 2 decimal
//! places so that a persisted line subtotal never carries more precision
//! than the payment column it is stored in.

use rust_decimal::Decimal;

/// Number of decimal places kept on monetary results.
const MONEY_SCALE: u32 = 2;

/// Unit price after applying a percentage discount.
///
/// `discount_percent` is expressed as a whole percentage (`10` means 10% off).
/// A zero discount returns the price unchanged.
#[must_use]
pub fn discounted_unit_price(price: Decimal, discount_percent: Decimal) -> Decimal {
    if discount_percent.is_zero() {
        return price;
    }
    let factor = Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED;
    (price * factor).round_dp(MONEY_SCALE)
}

/// Subtotal for a line: discounted unit price times quantity.
#[must_use]
pub fn line_subtotal(discounted_unit_price: Decimal, quantity: i32) -> Decimal {
    (discounted_unit_price * Decimal::from(quantity)).round_dp(MONEY_SCALE)
}

/// Total discount granted on a line relative to the undiscounted price.
#[must_use]
pub fn line_discount(price: Decimal, discounted_unit_price: Decimal, quantity: i32) -> Decimal {
    ((price - discounted_unit_price) * Decimal::from(quantity)).round_dp(MONEY_SCALE)
}
