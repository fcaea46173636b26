//! Cart mutation and pricing-view tests.

use rust_decimal::Decimal;

use orchard_checkout::CheckoutError;
use orchard_checkout::pricing::CartProblem;
use orchard_core::ProductId;
use orchard_integration_tests::TestContext;

#[tokio::test]
async fn adding_the_same_product_accumulates_quantity() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_product(1, 10, 5).await;

    ctx.cart.add_item(user, product, 2).await.expect("add");
    let item = ctx.cart.add_item(user, product, 1).await.expect("add");

    assert_eq!(item.quantity, 3);
    assert_eq!(ctx.store.cart(user).await.len(), 1);
}

#[tokio::test]
async fn adding_beyond_stock_is_rejected_and_cart_unchanged() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_product(1, 10, 5).await;
    ctx.cart.add_item(user, product, 4).await.expect("add");

    let err = ctx
        .cart
        .add_item(user, product, 2)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        }
    ));
    let cart = ctx.store.cart(user).await;
    assert_eq!(cart.first().expect("item").quantity, 4);
}

#[tokio::test]
async fn quantities_can_be_updated_and_items_removed() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_product(1, 10, 5).await;
    ctx.cart.add_item(user, product, 2).await.expect("add");

    ctx.cart
        .update_quantity(user, product, 5)
        .await
        .expect("update");
    assert_eq!(
        ctx.store.cart(user).await.first().expect("item").quantity,
        5
    );

    ctx.cart.remove_item(user, product).await.expect("remove");
    assert!(ctx.store.cart(user).await.is_empty());

    let err = ctx
        .cart
        .remove_item(user, product)
        .await
        .expect_err("must fail");
    assert!(matches!(err, CheckoutError::ProductNotFound(_)));
}

#[tokio::test]
async fn non_positive_quantities_are_rejected() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_product(1, 10, 5).await;

    assert!(matches!(
        ctx.cart.add_item(user, product, 0).await,
        Err(CheckoutError::InvalidQuantity(0))
    ));
    assert!(matches!(
        ctx.cart.update_quantity(user, product, -1).await,
        Err(CheckoutError::InvalidQuantity(-1))
    ));
}

#[tokio::test]
async fn cart_pricing_reports_problems_without_blocking() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let priced = ctx.seed_discounted_product(1, 100, 10, 5).await;
    ctx.cart.add_item(user, priced, 2).await.expect("add");
    // A product that disappears from the catalog after being added.
    ctx.store.seed_cart_item(user, ProductId::new(404), 1).await;

    let pricing = ctx.cart.price(user).await.expect("price");

    assert!(!pricing.is_clean());
    assert_eq!(pricing.lines.len(), 1);
    assert_eq!(pricing.subtotal, Decimal::from(180));
    assert_eq!(pricing.total_discount, Decimal::from(20));
    assert_eq!(pricing.grand_total, Decimal::from(180));
    assert!(matches!(
        pricing.problems.first(),
        Some(CartProblem::ProductMissing { .. })
    ));
}
