//! Order state machine and cancellation tests.

use orchard_checkout::CheckoutError;
use orchard_core::{OrderId, OrderStatus};
use orchard_integration_tests::{TestContext, checkout_request};

/// Place an order of 2 + 1 units across two products.
async fn placed_order(ctx: &TestContext) -> OrderId {
    let user = ctx.seed_user(1).await;
    let first = ctx.seed_product(1, 100, 5).await;
    let second = ctx.seed_product(2, 40, 5).await;
    ctx.store.seed_cart_item(user, first, 2).await;
    ctx.store.seed_cart_item(user, second, 1).await;
    ctx.checkout
        .place_order(&checkout_request(user))
        .await
        .expect("checkout")
}

#[tokio::test]
async fn forward_path_advances_in_sequence() {
    let ctx = TestContext::new();
    let order_id = placed_order(&ctx).await;

    for next in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let order = ctx
            .lifecycle
            .set_status(order_id, next)
            .await
            .expect("transition");
        assert_eq!(order.status, next);
        assert_eq!(
            ctx.lifecycle.order_status(order_id).await.expect("status"),
            next
        );
    }
}

#[tokio::test]
async fn skipping_states_is_rejected_and_state_unchanged() {
    let ctx = TestContext::new();
    let order_id = placed_order(&ctx).await;

    let err = ctx
        .lifecycle
        .set_status(order_id, OrderStatus::Delivered)
        .await
        .expect_err("must fail");

    assert!(matches!(
        err,
        CheckoutError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Delivered,
        }
    ));
    assert_eq!(
        ctx.lifecycle.order_status(order_id).await.expect("status"),
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn cancellation_restores_exact_line_quantities() {
    let ctx = TestContext::new();
    let order_id = placed_order(&ctx).await;

    // Checkout consumed 2 of product 1 and 1 of product 2.
    assert_eq!(ctx.store.product(1.into()).await.expect("product").stock, 3);
    assert_eq!(ctx.store.product(2.into()).await.expect("product").stock, 4);

    let order = ctx.lifecycle.cancel(order_id).await.expect("cancel");
    assert_eq!(order.status, OrderStatus::Cancelled);

    assert_eq!(ctx.store.product(1.into()).await.expect("product").stock, 5);
    assert_eq!(ctx.store.product(2.into()).await.expect("product").stock, 5);
}

#[tokio::test]
async fn second_cancellation_fails_without_double_credit() {
    let ctx = TestContext::new();
    let order_id = placed_order(&ctx).await;

    ctx.lifecycle.cancel(order_id).await.expect("cancel");
    let err = ctx
        .lifecycle
        .cancel(order_id)
        .await
        .expect_err("must fail");

    assert!(matches!(err, CheckoutError::AlreadyCancelled(id) if id == order_id));
    assert_eq!(ctx.store.product(1.into()).await.expect("product").stock, 5);
    assert_eq!(ctx.store.product(2.into()).await.expect("product").stock, 5);
    assert_eq!(
        ctx.lifecycle.order_status(order_id).await.expect("status"),
        OrderStatus::Cancelled
    );
}

#[tokio::test]
async fn delivered_orders_can_be_returned() {
    let ctx = TestContext::new();
    let order_id = placed_order(&ctx).await;

    for next in [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        ctx.lifecycle
            .set_status(order_id, next)
            .await
            .expect("transition");
    }

    // Post-delivery return: stock comes back.
    let order = ctx.lifecycle.cancel(order_id).await.expect("return");
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(ctx.store.product(1.into()).await.expect("product").stock, 5);
}

#[tokio::test]
async fn cancelled_orders_admit_no_transitions() {
    let ctx = TestContext::new();
    let order_id = placed_order(&ctx).await;
    ctx.lifecycle.cancel(order_id).await.expect("cancel");

    for next in [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let err = ctx
            .lifecycle
            .set_status(order_id, next)
            .await
            .expect_err("must fail");
        assert!(matches!(err, CheckoutError::InvalidTransition { .. }));
    }
}

#[tokio::test]
async fn unknown_orders_are_reported() {
    let ctx = TestContext::new();
    let ghost = OrderId::new(999);

    let err = ctx
        .lifecycle
        .set_status(ghost, OrderStatus::Processing)
        .await
        .expect_err("must fail");
    assert!(matches!(err, CheckoutError::OrderNotFound(id) if id == ghost));

    let err = ctx
        .lifecycle
        .order_status(ghost)
        .await
        .expect_err("must fail");
    assert!(matches!(err, CheckoutError::OrderNotFound(_)));
}

#[tokio::test]
async fn order_with_lines_exposes_the_snapshot() {
    let ctx = TestContext::new();
    let order_id = placed_order(&ctx).await;

    let (order, lines) = ctx
        .lifecycle
        .order_with_lines(order_id)
        .await
        .expect("load");

    assert_eq!(order.id, order_id);
    assert_eq!(lines.len(), 2);
    assert_eq!(order.total, lines.iter().map(|l| l.subtotal).sum());
}
