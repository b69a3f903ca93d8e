use super::*;

fn order() -> CreateOrderResponse {
    CreateOrderResponse {
        order_id: "order_1".to_owned(),
        amount: 100,
        currency: "INR".to_owned(),
        key_id: "rzp_test".to_owned(),
    }
}

#[test]
fn options_carry_order_and_prefill() {
    let options = checkout_options(&order(), "Ann", "a@b.com");
    assert_eq!(options["key"], "rzp_test");
    assert_eq!(options["order_id"], "order_1");
    assert_eq!(options["amount"], 100);
    assert_eq!(options["prefill"]["email"], "a@b.com");
    assert_eq!(options["name"], CHECKOUT_TITLE);
    assert!(options.get("handler").is_none());
}

#[test]
fn checkout_result_parses_signed_triple() {
    let result = parse_checkout_result(
        r#"{"razorpay_order_id":"order_1","razorpay_payment_id":"pay_1","razorpay_signature":"sig"}"#,
    )
    .expect("parse");
    assert_eq!(result.razorpay_payment_id, "pay_1");
}

#[test]
fn checkout_result_without_signature_is_rejected() {
    assert!(parse_checkout_result(r#"{"razorpay_order_id":"order_1","razorpay_payment_id":"pay_1"}"#).is_err());
}
