//! Request and response bodies of the HTTP API.
//!
//! DESIGN
//! ======
//! Shapes mirror the backend's JSON exactly (camelCase keys, except the
//! checkout verification triple which the payment provider names in
//! snake_case). Optional fields default so a sparse response still decodes.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use wire::{ChatMessage, OnlineUser, User};

/// `{ "message": ... }` acknowledgement returned by most mutating endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Successful OTP verification: the credential token plus the account.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `/api/auth/me` and the profile endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserResponse {
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureResponse {
    pub profile_pic: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

/// Order created by `/api/payment/create-order`, handed to the checkout widget.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    /// Amount in the currency's minor unit.
    pub amount: u64,
    pub currency: String,
    pub key_id: String,
}

/// Result handed back by the checkout widget and forwarded to `/api/payment/verify`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    #[serde(default)]
    pub is_group_member: bool,
}

/// One row of `/api/payment/history`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentRecord {
    #[serde(alias = "razorpayOrderId")]
    pub order_id: String,
    pub amount: u64,
    pub currency: String,
    pub status: String,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentHistoryResponse {
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

/// Raw history rows; each is run through [`ChatMessage::from_wire`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Value>,
}

impl MessagesResponse {
    /// Renderable messages in server order; unrenderable rows are skipped.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages.iter().filter_map(ChatMessage::from_wire).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct OnlineUsersResponse {
    #[serde(default, alias = "onlineUsers")]
    pub users: Vec<OnlineUser>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HealthResponse {
    pub status: Option<String>,
    pub message: Option<String>,
}
