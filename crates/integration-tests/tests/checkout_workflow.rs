//! End-to-end checkout scenarios against the seeded store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pineapple_checkout_core::{
    CheckoutError, CheckoutStage, CheckoutToken, LineInput, OrderId, OrderStatus,
    PaymentErrorCode, Requirement,
};
use pineapple_checkout_integration_tests::{
    EMAIL, Harness, address, channel, declined, digital_lines, physical_lines, us_address,
    GatewayMode,
};
use rust_decimal::Decimal;

async fn physical_checkout(harness: &Harness) -> CheckoutToken {
    harness
        .service
        .create(&channel(), EMAIL, &physical_lines())
        .await
        .unwrap()
        .token()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_digital_cart_completes_unfulfilled_without_shipping() {
    let harness = Harness::new();
    let checkout = harness
        .service
        .create(&channel(), EMAIL, &digital_lines())
        .await
        .unwrap();
    assert!(!checkout.is_shipping_required());
    assert_eq!(checkout.stage(), CheckoutStage::PaymentPending);

    let attempt = harness
        .service
        .attempt_payment(checkout.token())
        .await
        .unwrap();
    assert!(attempt.success());

    let order = harness.service.complete(checkout.token()).await.unwrap();
    assert!(!order.is_shipping_required());
    assert_eq!(order.status(), OrderStatus::Unfulfilled);
    assert!(order.shipping_address().is_none());
    assert!(order.shipping_method().is_none());
    assert_eq!(harness.orders.len().await, 1);
}

#[tokio::test]
async fn test_physical_cart_completes_with_address_and_method() {
    let harness = Harness::new();
    let token = physical_checkout(&harness).await;

    harness
        .service
        .set_shipping_address(token, us_address())
        .await
        .unwrap();
    let checkout = harness
        .service
        .resolve_shipping_method(token, "Express")
        .await
        .unwrap();
    let method = checkout.shipping_method().unwrap();
    assert_eq!(method.id.as_str(), "us-express");
    assert_eq!(method.price.amount, Decimal::new(1500, 2));

    assert!(harness.service.attempt_payment(token).await.unwrap().success());
    let order = harness.service.complete(token).await.unwrap();

    assert!(order.is_shipping_required());
    assert_eq!(order.status(), OrderStatus::Unfulfilled);
    assert_eq!(order.shipping_address(), Some(&us_address()));
    assert_eq!(order.shipping_method().unwrap().name, "Express");
    assert_eq!(order.lines().len(), 2);
    assert_eq!(order.id(), OrderId::for_checkout(order.checkout_id()));
}

#[tokio::test]
async fn test_payment_needs_shipping_method_then_succeeds() {
    let harness = Harness::new();
    let token = physical_checkout(&harness).await;

    let attempt = harness.service.attempt_payment(token).await.unwrap();
    assert_eq!(attempt.errors.len(), 1);
    assert_eq!(attempt.errors[0].code, PaymentErrorCode::ShippingMethodRequired);
    assert_eq!(harness.gateway.calls(), 0);

    harness
        .service
        .set_shipping_address(token, us_address())
        .await
        .unwrap();
    harness
        .service
        .resolve_shipping_method(token, "Standard")
        .await
        .unwrap();

    let attempt = harness.service.attempt_payment(token).await.unwrap();
    assert!(attempt.errors.is_empty());
    assert_eq!(harness.gateway.calls(), 1);
}

// =============================================================================
// Gate properties
// =============================================================================

#[tokio::test]
async fn test_no_method_resolves_without_address() {
    let harness = Harness::new();
    let token = physical_checkout(&harness).await;

    for name in ["Standard", "Express", "Courier", "", "standard"] {
        let result = harness.service.resolve_shipping_method(token, name).await;
        assert!(
            matches!(result, Err(CheckoutError::ShippingMethodNotFound(_))),
            "method {name:?} resolved without an address"
        );
    }
    assert!(
        harness
            .service
            .available_shipping_methods(token)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        harness
            .service
            .get(token)
            .await
            .unwrap()
            .shipping_method()
            .is_none()
    );
}

#[tokio::test]
async fn test_methods_follow_the_address_country() {
    let harness = Harness::new();
    let token = physical_checkout(&harness).await;

    harness
        .service
        .set_shipping_address(token, address("CA"))
        .await
        .unwrap();
    let names: Vec<String> = harness
        .service
        .available_shipping_methods(token)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["Standard".to_string()]);

    let result = harness.service.resolve_shipping_method(token, "Express").await;
    assert!(matches!(result, Err(CheckoutError::ShippingMethodNotFound(_))));

    let checkout = harness
        .service
        .resolve_shipping_method(token, "Standard")
        .await
        .unwrap();
    assert_eq!(checkout.shipping_method().unwrap().id.as_str(), "ca-standard");
}

#[tokio::test]
async fn test_address_outside_channel_is_rejected() {
    let harness = Harness::new();
    let token = physical_checkout(&harness).await;

    let result = harness
        .service
        .set_shipping_address(token, address("PL"))
        .await;
    assert!(matches!(result, Err(CheckoutError::AddressRejected(_))));
    assert!(
        harness
            .service
            .get(token)
            .await
            .unwrap()
            .shipping_address()
            .is_none()
    );
}

#[tokio::test]
async fn test_new_address_clears_method_and_payment() {
    let harness = Harness::new();
    let token = physical_checkout(&harness).await;
    harness
        .service
        .set_shipping_address(token, us_address())
        .await
        .unwrap();
    harness
        .service
        .resolve_shipping_method(token, "Standard")
        .await
        .unwrap();
    harness.service.attempt_payment(token).await.unwrap();

    let checkout = harness
        .service
        .set_shipping_address(token, address("CA"))
        .await
        .unwrap();
    assert!(checkout.shipping_method().is_none());
    assert!(checkout.payment_attempt().is_none());
    assert_eq!(checkout.stage(), CheckoutStage::MethodPending);
}

#[tokio::test]
async fn test_declines_are_forwarded_verbatim() {
    let harness = Harness::with_gateway(
        declined("Card expired"),
        std::time::Duration::from_secs(1),
    );
    let token = harness
        .service
        .create(&channel(), EMAIL, &digital_lines())
        .await
        .unwrap()
        .token();

    let attempt = harness.service.attempt_payment(token).await.unwrap();
    assert!(!attempt.success());
    assert_eq!(attempt.errors.len(), 1);
    assert_eq!(attempt.errors[0].code, PaymentErrorCode::PaymentDeclined);
    assert_eq!(attempt.errors[0].message, "Card expired");

    let result = harness.service.complete(token).await;
    match result {
        Err(CheckoutError::CheckoutNotReady { unmet }) => {
            assert_eq!(unmet, vec![Requirement::Payment]);
        }
        other => panic!("expected CheckoutNotReady, got {other:?}"),
    }

    harness.gateway.set_mode(GatewayMode::Approve);
    assert!(harness.service.attempt_payment(token).await.unwrap().success());
    assert!(harness.service.complete(token).await.is_ok());
}

// =============================================================================
// Completion
// =============================================================================

#[tokio::test]
async fn test_complete_lists_every_unmet_requirement() {
    let harness = Harness::new();
    let token = physical_checkout(&harness).await;

    match harness.service.complete(token).await {
        Err(CheckoutError::CheckoutNotReady { unmet }) => assert_eq!(
            unmet,
            vec![
                Requirement::ShippingAddress,
                Requirement::ShippingMethod,
                Requirement::Payment,
            ]
        ),
        other => panic!("expected CheckoutNotReady, got {other:?}"),
    }
    assert!(harness.orders.is_empty().await);
    assert!(!harness.service.get(token).await.unwrap().is_completed());
}

#[tokio::test]
async fn test_second_complete_fails_and_order_is_unchanged() {
    let harness = Harness::new();
    let token = harness
        .service
        .create(&channel(), EMAIL, &digital_lines())
        .await
        .unwrap()
        .token();
    harness.service.attempt_payment(token).await.unwrap();

    let order = harness.service.complete(token).await.unwrap();
    let again = harness.service.complete(token).await;
    assert!(matches!(again, Err(CheckoutError::CheckoutCompleted)));

    assert_eq!(harness.service.order(order.id()).await.unwrap(), order);
    assert_eq!(
        harness.service.order_for_checkout(token).await.unwrap(),
        order
    );
    assert_eq!(harness.orders.len().await, 1);
}

#[tokio::test]
async fn test_completed_checkout_is_inert() {
    let harness = Harness::new();
    let token = harness
        .service
        .create(&channel(), EMAIL, &digital_lines())
        .await
        .unwrap()
        .token();
    harness.service.attempt_payment(token).await.unwrap();
    harness.service.complete(token).await.unwrap();

    let service = &harness.service;
    assert!(matches!(
        service.add_lines(token, &[LineInput::new("mug", 1)]).await,
        Err(CheckoutError::CheckoutCompleted)
    ));
    assert!(matches!(
        service.update_lines(token, &[LineInput::new("ebook", 5)]).await,
        Err(CheckoutError::CheckoutCompleted)
    ));
    assert!(matches!(
        service.set_email(token, "other@example.com").await,
        Err(CheckoutError::CheckoutCompleted)
    ));
    assert!(matches!(
        service.set_billing_address(token, us_address()).await,
        Err(CheckoutError::CheckoutCompleted)
    ));
    assert!(matches!(
        service.set_shipping_address(token, us_address()).await,
        Err(CheckoutError::CheckoutCompleted)
    ));
    assert!(matches!(
        service.attempt_payment(token).await,
        Err(CheckoutError::CheckoutCompleted)
    ));

    let checkout = service.get(token).await.unwrap();
    assert_eq!(checkout.stage(), CheckoutStage::Completed);
    assert_eq!(checkout.lines().len(), 2);

    let readiness = service.readiness(token).await.unwrap();
    assert!(!readiness.ready);
    assert!(readiness.unmet.is_empty());
}

// =============================================================================
// Lines
// =============================================================================

#[tokio::test]
async fn test_adding_physical_line_makes_digital_checkout_shippable() {
    let harness = Harness::new();
    let token = harness
        .service
        .create(&channel(), EMAIL, &digital_lines())
        .await
        .unwrap()
        .token();
    harness.service.attempt_payment(token).await.unwrap();

    let checkout = harness
        .service
        .add_lines(token, &[LineInput::new("poster", 1)])
        .await
        .unwrap();
    assert!(checkout.is_shipping_required());
    assert!(checkout.payment_attempt().is_none());
    assert_eq!(checkout.stage(), CheckoutStage::AddressPending);

    let checkout = harness
        .service
        .update_lines(token, &[LineInput::new("poster", 0)])
        .await
        .unwrap();
    assert!(!checkout.is_shipping_required());
    assert_eq!(checkout.stage(), CheckoutStage::PaymentPending);
}

#[tokio::test]
async fn test_removing_every_line_is_rejected() {
    let harness = Harness::new();
    let token = harness
        .service
        .create(&channel(), EMAIL, &[LineInput::new("ebook", 1)])
        .await
        .unwrap()
        .token();

    let result = harness
        .service
        .update_lines(token, &[LineInput::new("ebook", 0)])
        .await;
    assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    assert_eq!(harness.service.get(token).await.unwrap().lines().len(), 1);
}

#[tokio::test]
async fn test_unchanged_lines_keep_payment() {
    let harness = Harness::new();
    let token = harness
        .service
        .create(&channel(), EMAIL, &[LineInput::new("ebook", 1)])
        .await
        .unwrap()
        .token();
    harness.service.attempt_payment(token).await.unwrap();
    let before = harness.service.get(token).await.unwrap();

    let same = harness
        .service
        .update_lines(token, &[LineInput::new("ebook", 1)])
        .await
        .unwrap();
    let empty = harness.service.update_lines(token, &[]).await.unwrap();

    assert_eq!(same, before);
    assert_eq!(empty, before);
    assert_eq!(empty.stage(), CheckoutStage::PaymentReady);
    harness.service.complete(token).await.unwrap();
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let harness = Harness::new();
    let service = &harness.service;

    assert!(matches!(
        service
            .create(&"nowhere".into(), EMAIL, &digital_lines())
            .await,
        Err(CheckoutError::InvalidChannel(_))
    ));
    assert!(matches!(
        service.create(&channel(), EMAIL, &[]).await,
        Err(CheckoutError::EmptyCart)
    ));
    assert!(matches!(
        service
            .create(&channel(), EMAIL, &[LineInput::new("unicorn", 1)])
            .await,
        Err(CheckoutError::VariantNotFound(_))
    ));
    assert!(matches!(
        service
            .create(&channel(), EMAIL, &[LineInput::new("mug", 0)])
            .await,
        Err(CheckoutError::InvalidQuantity { .. })
    ));
    assert!(matches!(
        service.create(&channel(), "not-an-email", &digital_lines()).await,
        Err(CheckoutError::InvalidEmail(_))
    ));
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let harness = Harness::new();
    let token = CheckoutToken::generate();
    assert!(matches!(
        harness.service.get(token).await,
        Err(CheckoutError::CheckoutNotFound(t)) if t == token
    ));
    assert!(matches!(
        harness.service.complete(token).await,
        Err(CheckoutError::CheckoutNotFound(_))
    ));
}
