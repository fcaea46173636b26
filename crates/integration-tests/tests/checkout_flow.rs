//! End-to-end checkout transaction tests.

use rust_decimal::Decimal;

use orchard_checkout::CheckoutError;
use orchard_core::{OrderStatus, ProductId, UserId};
use orchard_integration_tests::{TestContext, checkout_request};

#[tokio::test]
async fn checkout_freezes_prices_and_clears_cart() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    // price 100, 10% off, qty 2 => line subtotal 180
    let product = ctx.seed_discounted_product(1, 100, 10, 5).await;
    ctx.store.seed_cart_item(user, product, 2).await;

    let order_id = ctx
        .checkout
        .place_order(&checkout_request(user))
        .await
        .expect("checkout");

    let order = ctx.store.order(order_id).await.expect("order");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Decimal::from(180));

    let lines = ctx.store.lines_for(order_id).await;
    assert_eq!(lines.len(), 1);
    let line = lines.first().expect("line");
    assert_eq!(line.unit_price, Decimal::from(90));
    assert_eq!(line.subtotal, Decimal::from(180));
    assert_eq!(order.total, lines.iter().map(|l| l.subtotal).sum());

    // Stock decremented, cart drained.
    assert_eq!(ctx.store.product(product).await.expect("product").stock, 3);
    assert!(ctx.store.cart(user).await.is_empty());
}

#[tokio::test]
async fn later_price_edits_never_touch_historical_orders() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_discounted_product(1, 100, 10, 5).await;
    ctx.store.seed_cart_item(user, product, 2).await;

    let order_id = ctx
        .checkout
        .place_order(&checkout_request(user))
        .await
        .expect("checkout");

    // Reprice the product after the fact.
    {
        let mut edited = ctx.store.product(product).await.expect("product");
        edited.price = Decimal::from(500);
        edited.discount_percent = Decimal::ZERO;
        ctx.store.seed_product(edited).await;
    }

    let order = ctx.store.order(order_id).await.expect("order");
    assert_eq!(order.total, Decimal::from(180));
    let lines = ctx.store.lines_for(order_id).await;
    assert_eq!(lines.first().expect("line").unit_price, Decimal::from(90));
}

#[tokio::test]
async fn empty_cart_checkout_persists_nothing() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_product(1, 10, 5).await;

    let err = ctx
        .checkout
        .place_order(&checkout_request(user))
        .await
        .expect_err("must fail");

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(ctx.store.order_count().await, 0);
    assert_eq!(ctx.store.product(product).await.expect("product").stock, 5);
}

#[tokio::test]
async fn unknown_user_is_rejected() {
    let ctx = TestContext::new();
    let product = ctx.seed_product(1, 10, 5).await;
    let ghost = UserId::new(99);
    ctx.store.seed_cart_item(ghost, product, 1).await;

    let err = ctx
        .checkout
        .place_order(&checkout_request(ghost))
        .await
        .expect_err("must fail");

    assert!(matches!(err, CheckoutError::UserNotFound(id) if id == ghost));
    assert_eq!(ctx.store.order_count().await, 0);
}

#[tokio::test]
async fn oversized_line_aborts_with_available_quantity() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_product(1, 10, 5).await;
    ctx.store.seed_cart_item(user, product, 6).await;

    let err = ctx
        .checkout
        .place_order(&checkout_request(user))
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
    assert_eq!(ctx.store.product(product).await.expect("product").stock, 5);
    assert_eq!(ctx.store.order_count().await, 0);
    assert_eq!(ctx.store.cart(user).await.len(), 1);
}

#[tokio::test]
async fn failed_decrement_rolls_back_earlier_lines() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let other = ctx.seed_product(1, 10, 10).await;
    let scarce = ctx.seed_product(2, 10, 5).await;

    // Two separate cart rows for the scarce product pass per-line
    // validation (4 <= 5 and 3 <= 5) but their decrements sum to 7, so the
    // second one refuses mid-transaction - after `other` and the first
    // scarce row were already decremented.
    ctx.store.seed_cart_item(user, other, 2).await;
    ctx.store.seed_cart_item(user, scarce, 4).await;
    ctx.store.seed_cart_item(user, scarce, 3).await;

    let err = ctx
        .checkout
        .place_order(&checkout_request(user))
        .await
        .expect_err("must fail");

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock {
            product_id,
            requested: 3,
            available: 1,
        } if product_id == scarce
    ));

    // Every decrement from the attempt is rolled back; nothing persisted.
    assert_eq!(ctx.store.product(other).await.expect("product").stock, 10);
    assert_eq!(ctx.store.product(scarce).await.expect("product").stock, 5);
    assert_eq!(ctx.store.order_count().await, 0);
    assert_eq!(ctx.store.cart(user).await.len(), 3);
}

#[tokio::test]
async fn concurrent_checkouts_for_the_last_unit_produce_one_order() {
    let ctx = TestContext::new();
    let alice = ctx.seed_user(1).await;
    let bob = ctx.seed_user(2).await;
    let product = ctx.seed_product(1, 25, 1).await;
    ctx.store.seed_cart_item(alice, product, 1).await;
    ctx.store.seed_cart_item(bob, product, 1).await;

    let a = {
        let checkout = ctx.checkout.clone();
        let request = checkout_request(alice);
        tokio::spawn(async move { checkout.place_order(&request).await })
    };
    let b = {
        let checkout = ctx.checkout.clone();
        let request = checkout_request(bob);
        tokio::spawn(async move { checkout.place_order(&request).await })
    };

    let results = [a.await.expect("join"), b.await.expect("join")];
    let won = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(won, 1, "exactly one checkout must win: {results:?}");

    // The loser observed stock contention: either the conditional
    // decrement refused, or the winning checkout had already flipped the
    // sold-out product to OUT_OF_STOCK.
    let loser = results
        .into_iter()
        .find_map(Result::err)
        .expect("one must lose");
    assert!(matches!(
        loser,
        CheckoutError::InsufficientStock { .. } | CheckoutError::Unavailable { .. }
    ));

    assert_eq!(ctx.store.product(product).await.expect("product").stock, 0);
    assert_eq!(ctx.store.order_count().await, 1);
}

#[tokio::test]
async fn boundary_validation_happens_before_any_write() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    let product = ctx.seed_product(1, 10, 5).await;
    ctx.store.seed_cart_item(user, product, 1).await;

    let mut no_address = checkout_request(user);
    no_address.shipping_address = " ".to_string();
    assert!(matches!(
        ctx.checkout.place_order(&no_address).await,
        Err(CheckoutError::MissingAddress)
    ));

    let mut no_payment = checkout_request(user);
    no_payment.payment_method = String::new();
    assert!(matches!(
        ctx.checkout.place_order(&no_payment).await,
        Err(CheckoutError::MissingPaymentMethod)
    ));

    let mut bad_payment = checkout_request(user);
    bad_payment.payment_method = "Visa Card #4".to_string();
    assert!(matches!(
        ctx.checkout.place_order(&bad_payment).await,
        Err(CheckoutError::InvalidPaymentMethod(_))
    ));

    assert_eq!(ctx.store.order_count().await, 0);
    assert_eq!(ctx.store.cart(user).await.len(), 1);
    assert_eq!(ctx.store.product(product).await.expect("product").stock, 5);
}

#[tokio::test]
async fn missing_product_aborts_checkout() {
    let ctx = TestContext::new();
    let user = ctx.seed_user(1).await;
    ctx.store
        .seed_cart_item(user, ProductId::new(404), 1)
        .await;

    let err = ctx
        .checkout
        .place_order(&checkout_request(user))
        .await
        .expect_err("must fail");

    assert!(matches!(err, CheckoutError::ProductNotFound(id) if id == ProductId::new(404)));
    assert_eq!(ctx.store.order_count().await, 0);
}
