use super::*;

// =============================================================
// Request bodies
// =============================================================

#[test]
fn register_request_uses_confirm_password_key() {
    let body = RegisterRequest {
        name: "Ann".to_owned(),
        email: "a@b.com".to_owned(),
        password: "pw".to_owned(),
        confirm_password: "pw".to_owned(),
    };
    assert_eq!(
        serde_json::to_value(&body).expect("serialize"),
        serde_json::json!({"name": "Ann", "email": "a@b.com", "password": "pw", "confirmPassword": "pw"})
    );
}

#[test]
fn reset_password_request_uses_new_password_key() {
    let body = ResetPasswordRequest {
        email: "a@b.com".to_owned(),
        otp: "123456".to_owned(),
        new_password: "pw2".to_owned(),
    };
    let value = serde_json::to_value(&body).expect("serialize");
    assert_eq!(value["newPassword"], "pw2");
    assert_eq!(value["otp"], "123456");
}

#[test]
fn payment_verification_keeps_provider_key_names() {
    let body = PaymentVerification {
        razorpay_order_id: "order_1".to_owned(),
        razorpay_payment_id: "pay_1".to_owned(),
        razorpay_signature: "sig".to_owned(),
    };
    let value = serde_json::to_value(&body).expect("serialize");
    assert_eq!(value["razorpay_order_id"], "order_1");
    assert_eq!(value["razorpay_signature"], "sig");
}

// =============================================================
// Response bodies
// =============================================================

#[test]
fn auth_response_decodes_token_and_user() {
    let resp: AuthResponse = serde_json::from_value(serde_json::json!({
        "message": "Login successful",
        "token": "abc",
        "user": {"_id": "u1", "name": "Ann", "email": "a@b.com", "isGroupMember": false}
    }))
    .expect("decode");
    assert_eq!(resp.token.as_deref(), Some("abc"));
    assert_eq!(resp.user.id, "u1");
}

#[test]
fn create_order_response_decodes_camel_case() {
    let resp: CreateOrderResponse = serde_json::from_value(serde_json::json!({
        "orderId": "order_1",
        "amount": 49_900,
        "currency": "INR",
        "keyId": "rzp_test"
    }))
    .expect("decode");
    assert_eq!(resp.order_id, "order_1");
    assert_eq!(resp.amount, 49_900);
    assert_eq!(resp.key_id, "rzp_test");
}

#[test]
fn payment_status_defaults_to_not_member() {
    let resp: PaymentStatusResponse = serde_json::from_str("{}").expect("decode");
    assert!(!resp.is_group_member);
    let resp: PaymentStatusResponse = serde_json::from_str(r#"{"isGroupMember":true}"#).expect("decode");
    assert!(resp.is_group_member);
}

#[test]
fn payment_history_tolerates_sparse_rows() {
    let resp: PaymentHistoryResponse = serde_json::from_value(serde_json::json!({
        "payments": [{"razorpayOrderId": "order_1", "amount": 100, "status": "paid"}]
    }))
    .expect("decode");
    assert_eq!(resp.payments.len(), 1);
    assert_eq!(resp.payments[0].order_id, "order_1");
    assert!(resp.payments[0].currency.is_empty());
}

#[test]
fn messages_response_skips_unrenderable_rows() {
    let resp: MessagesResponse = serde_json::from_value(serde_json::json!({
        "messages": [
            {"_id": "m1", "userId": "u1", "name": "Ann", "message": "hi"},
            {"_id": "m2", "userId": "u1"},
            {"_id": "m3", "userId": "u2", "name": "Bo", "message": "yo"}
        ]
    }))
    .expect("decode");
    let ids: Vec<_> = resp.into_messages().into_iter().filter_map(|m| m.id).collect();
    assert_eq!(ids, vec!["m1".to_owned(), "m3".to_owned()]);
}

#[test]
fn online_users_response_accepts_either_key() {
    let a: OnlineUsersResponse = serde_json::from_str(r#"{"users":[{"userId":"u1","name":"Ann"}]}"#).expect("decode");
    let b: OnlineUsersResponse =
        serde_json::from_str(r#"{"onlineUsers":[{"userId":"u1","name":"Ann"}]}"#).expect("decode");
    assert_eq!(a, b);
}
