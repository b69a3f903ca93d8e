//! Typed helpers for the backend HTTP API.
//!
//! Browser (csr): real HTTP calls via `gloo-net`, with credentials included,
//! a bearer `Authorization` header when a token is stored, and a 10 s
//! timeout. Elsewhere the transport is a stub that fails with
//! [`ApiError::Network`], so page logic compiles and tests natively.
//!
//! ERROR HANDLING
//! ==============
//! Every call returns `Result<T, ApiError>`. A 401 on any call clears the
//! stored token before the error is returned; pages decide whether it also
//! ends the session. Backend `message`/`error` fields are preserved so the
//! UI can show them verbatim via [`ApiError::user_message`].

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{
    AuthResponse, ChatMessage, CreateOrderResponse, EmailRequest, HealthResponse, LoginRequest, MessageResponse,
    MessagesResponse, OnlineUsersResponse, PaymentHistoryResponse, PaymentStatusResponse, PaymentVerification,
    RegisterRequest, ResetPasswordRequest, SendMessageRequest, UpdateProfileRequest, UserResponse, UsersResponse,
    VerifyOtpRequest,
};
use crate::util::token_store::TokenStore;

/// Per-request timeout applied by the browser transport.
pub const REQUEST_TIMEOUT_MS: u32 = 10_000;

/// API paths, relative to the configured base URL.
pub mod endpoints {
    pub const HEALTH: &str = "/api/health";
    pub const REGISTER: &str = "/api/auth/register";
    pub const LOGIN: &str = "/api/auth/login";
    pub const VERIFY_OTP: &str = "/api/auth/verify-otp";
    pub const ME: &str = "/api/auth/me";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
    pub const VERIFY_RESET_OTP: &str = "/api/auth/verify-reset-otp";
    pub const RESET_PASSWORD: &str = "/api/auth/reset-password";
    pub const PROFILE: &str = "/api/user/profile";
    pub const PROFILE_PICTURE: &str = "/api/user/profile/picture";
    pub const ALL_USERS: &str = "/api/user/all";
    pub const CREATE_ORDER: &str = "/api/payment/create-order";
    pub const VERIFY_PAYMENT: &str = "/api/payment/verify";
    pub const PAYMENT_HISTORY: &str = "/api/payment/history";
    pub const PAYMENT_STATUS: &str = "/api/payment/status";
    pub const CHAT_MESSAGES: &str = "/api/chat/messages";
    pub const CHAT_SEND: &str = "/api/chat/send";
    pub const CHAT_ONLINE_USERS: &str = "/api/chat/online-users";
    pub const CHAT_JOIN: &str = "/api/chat/join";
    pub const CHAT_LEAVE: &str = "/api/chat/leave";
}

/// Multipart field name of the profile picture upload.
pub const PROFILE_PICTURE_FIELD: &str = "profilePic";

/// Failure of an API call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// HTTP 401. The stored token has already been cleared.
    #[error("not authorized")]
    Unauthorized { message: Option<String> },
    /// Any other non-2xx status.
    #[error("server responded with status {status}")]
    Server { status: u16, message: Option<String> },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    /// 2xx response whose body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text to show the user: the backend's message when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthorized { message: Some(message) } | Self::Server { message: Some(message), .. } => {
                message.clone()
            }
            _ => fallback.to_owned(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HttpMethod {
    Get,
    Post,
    Put,
}

enum RequestBody {
    Empty,
    Json(Value),
    #[cfg(feature = "csr")]
    Form(web_sys::FormData),
}

/// HTTP client bound to one backend and one token store.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, tokens }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Absolute URL of an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `Authorization` header value for the stored token, if any.
    pub(crate) fn bearer(&self) -> Option<String> {
        self.tokens.load().map(|token| format!("Bearer {token}"))
    }

    /// Turn a completed exchange into a typed result, clearing the token on 401.
    pub(crate) fn settle<T: DeserializeOwned>(&self, status: u16, body: &str) -> Result<T, ApiError> {
        let result = interpret_response(status, body);
        if matches!(result, Err(ApiError::Unauthorized { .. })) {
            self.tokens.clear();
        }
        result
    }

    // =============================================================
    // Auth
    // =============================================================

    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.get(endpoints::HEALTH).await
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<MessageResponse, ApiError> {
        self.post(endpoints::REGISTER, body).await
    }

    pub async fn login(&self, body: &LoginRequest) -> Result<MessageResponse, ApiError> {
        self.post(endpoints::LOGIN, body).await
    }

    pub async fn verify_otp(&self, body: &VerifyOtpRequest) -> Result<AuthResponse, ApiError> {
        self.post(endpoints::VERIFY_OTP, body).await
    }

    pub async fn me(&self) -> Result<UserResponse, ApiError> {
        self.get(endpoints::ME).await
    }

    pub async fn logout(&self) -> Result<MessageResponse, ApiError> {
        self.send(HttpMethod::Post, endpoints::LOGOUT, RequestBody::Empty).await
    }

    pub async fn forgot_password(&self, body: &EmailRequest) -> Result<MessageResponse, ApiError> {
        self.post(endpoints::FORGOT_PASSWORD, body).await
    }

    pub async fn verify_reset_otp(&self, body: &VerifyOtpRequest) -> Result<MessageResponse, ApiError> {
        self.post(endpoints::VERIFY_RESET_OTP, body).await
    }

    pub async fn reset_password(&self, body: &ResetPasswordRequest) -> Result<MessageResponse, ApiError> {
        self.post(endpoints::RESET_PASSWORD, body).await
    }

    // =============================================================
    // Profile
    // =============================================================

    pub async fn profile(&self) -> Result<UserResponse, ApiError> {
        self.get(endpoints::PROFILE).await
    }

    pub async fn update_profile(&self, body: &UpdateProfileRequest) -> Result<UserResponse, ApiError> {
        self.put(endpoints::PROFILE, body).await
    }

    /// Upload a new profile picture as multipart field `profilePic`.
    #[cfg(feature = "csr")]
    pub async fn upload_profile_picture(
        &self,
        file: &web_sys::File,
    ) -> Result<super::types::ProfilePictureResponse, ApiError> {
        let form = web_sys::FormData::new().map_err(|_| ApiError::Network("form data unavailable".to_owned()))?;
        form.append_with_blob_and_filename(PROFILE_PICTURE_FIELD, file, &file.name())
            .map_err(|_| ApiError::Network("could not attach file".to_owned()))?;
        self.send(HttpMethod::Put, endpoints::PROFILE_PICTURE, RequestBody::Form(form))
            .await
    }

    pub async fn all_users(&self) -> Result<UsersResponse, ApiError> {
        self.get(endpoints::ALL_USERS).await
    }

    // =============================================================
    // Payment
    // =============================================================

    pub async fn create_order(&self) -> Result<CreateOrderResponse, ApiError> {
        self.send(HttpMethod::Post, endpoints::CREATE_ORDER, RequestBody::Empty)
            .await
    }

    pub async fn verify_payment(&self, body: &PaymentVerification) -> Result<MessageResponse, ApiError> {
        self.post(endpoints::VERIFY_PAYMENT, body).await
    }

    pub async fn payment_history(&self) -> Result<PaymentHistoryResponse, ApiError> {
        self.get(endpoints::PAYMENT_HISTORY).await
    }

    pub async fn payment_status(&self) -> Result<PaymentStatusResponse, ApiError> {
        self.get(endpoints::PAYMENT_STATUS).await
    }

    // =============================================================
    // Chat
    // =============================================================

    /// Message history in server order.
    pub async fn chat_messages(&self) -> Result<Vec<ChatMessage>, ApiError> {
        let resp: MessagesResponse = self.get(endpoints::CHAT_MESSAGES).await?;
        Ok(resp.into_messages())
    }

    pub async fn send_chat_message(&self, body: &SendMessageRequest) -> Result<MessageResponse, ApiError> {
        self.post(endpoints::CHAT_SEND, body).await
    }

    pub async fn online_users(&self) -> Result<OnlineUsersResponse, ApiError> {
        self.get(endpoints::CHAT_ONLINE_USERS).await
    }

    pub async fn join_chat(&self) -> Result<MessageResponse, ApiError> {
        self.send(HttpMethod::Post, endpoints::CHAT_JOIN, RequestBody::Empty)
            .await
    }

    pub async fn leave_chat(&self) -> Result<MessageResponse, ApiError> {
        self.send(HttpMethod::Post, endpoints::CHAT_LEAVE, RequestBody::Empty)
            .await
    }

    // =============================================================
    // Transport
    // =============================================================

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(HttpMethod::Get, path, RequestBody::Empty).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(HttpMethod::Post, path, RequestBody::Json(value)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(HttpMethod::Put, path, RequestBody::Json(value)).await
    }

    async fn send<T: DeserializeOwned>(&self, method: HttpMethod, path: &str, body: RequestBody) -> Result<T, ApiError> {
        #[cfg(feature = "csr")]
        {
            use futures::future::{Either, select};
            use gloo_net::http::Request;

            let url = self.url(path);
            let mut builder = match method {
                HttpMethod::Get => Request::get(&url),
                HttpMethod::Post => Request::post(&url),
                HttpMethod::Put => Request::put(&url),
            }
            .credentials(web_sys::RequestCredentials::Include);
            if let Some(bearer) = self.bearer() {
                builder = builder.header("Authorization", &bearer);
            }
            let request = match body {
                RequestBody::Empty => builder.build(),
                RequestBody::Json(value) => builder.json(&value),
                RequestBody::Form(form) => builder.body(form),
            }
            .map_err(|e| ApiError::Network(e.to_string()))?;

            let exchange = async move {
                let resp = request.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
                let status = resp.status();
                let text = resp.text().await.map_err(|e| ApiError::Decode(e.to_string()))?;
                Ok::<_, ApiError>((status, text))
            };
            let timeout = gloo_timers::future::TimeoutFuture::new(REQUEST_TIMEOUT_MS);
            let (status, text) = match select(Box::pin(exchange), timeout).await {
                Either::Left((result, _)) => result?,
                Either::Right(_) => {
                    leptos::logging::warn!("request to {path} timed out");
                    return Err(ApiError::Timeout);
                }
            };
            self.settle(status, &text)
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (method, path, body);
            Err(ApiError::Network("not available outside the browser".to_owned()))
        }
    }
}

/// Map a status code and body onto a typed result.
///
/// An empty 2xx body decodes as `{}`.
pub(crate) fn interpret_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if (200..300).contains(&status) {
        let body = if body.trim().is_empty() { "{}" } else { body };
        return serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()));
    }
    let message = error_message(body);
    if status == 401 {
        Err(ApiError::Unauthorized { message })
    } else {
        Err(ApiError::Server { status, message })
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .map(str::to_owned)
}
