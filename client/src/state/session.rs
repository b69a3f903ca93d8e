//! Authentication state machine for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and pages read [`AuthState`] from context to decide what to
//! render. Pages perform the HTTP calls; every transition here is a plain
//! synchronous method taking the call's `Result`, so the whole flow is
//! testable without a browser.
//!
//! DESIGN
//! ======
//! Each `submit_*` validates input, marks the state busy and returns the
//! request body to send. The matching `*_result` applies the response only
//! if the machine is still in the step that issued it, so a late response
//! after "back to login" or logout is ignored.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use chrono::{DateTime, NaiveDate};

use crate::net::api::ApiError;
use crate::net::types::{
    AuthResponse, EmailRequest, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest, User,
    VerifyOtpRequest,
};
use crate::util::token_store::TokenStore;

/// Identity and entitlement of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub is_group_member: bool,
    pub created_at: Option<String>,
}

impl From<User> for Session {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            display_name: user.name,
            email: user.email,
            profile_picture: user.profile_pic.filter(|url| !url.is_empty()),
            is_group_member: user.is_group_member,
            created_at: user.created_at,
        }
    }
}

impl Session {
    pub fn member_since(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.date_naive())
    }

    /// Upper-cased first letter of the display name, for avatar placeholders.
    pub fn initial(&self) -> char {
        self.display_name
            .chars()
            .next()
            .map_or('?', |c| c.to_uppercase().next().unwrap_or(c))
    }
}

/// Which flow dispatched the pending OTP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtpPurpose {
    Login,
    Register,
}

/// User-visible status line attached to the current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Info(text) | Self::Success(text) | Self::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStep {
    /// Startup check of a persisted token in flight.
    Probing,
    Anonymous,
    CredentialsSubmitted { purpose: OtpPurpose, email: String },
    OtpPending { purpose: OtpPurpose, email: String },
    Authenticated(Session),
    ForgotPassword,
    OtpPendingReset { email: String },
    PasswordReset { email: String, otp: String },
}

/// Input rejected before any request is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please enter the OTP")]
    MissingOtp,
    #[error("Please wait for the current request to finish")]
    Busy,
    #[error("This action is not available right now")]
    WrongStep,
}

/// Credentials kept in memory so an OTP can be re-sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResendRequest {
    Login(LoginRequest),
    Register(RegisterRequest),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthState {
    step: AuthStep,
    notice: Option<Notice>,
    busy: bool,
    resend: Option<ResendRequest>,
    reset_otp: Option<String>,
    /// Step and resend credentials to restore if a login or register call fails.
    before_submit: Option<(AuthStep, Option<ResendRequest>)>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthState {
    pub fn new() -> Self {
        Self {
            step: AuthStep::Probing,
            notice: None,
            busy: false,
            resend: None,
            reset_otp: None,
            before_submit: None,
        }
    }

    pub fn step(&self) -> &AuthStep {
        &self.step
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_probing(&self) -> bool {
        matches!(self.step, AuthStep::Probing)
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.step {
            AuthStep::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Email the current OTP was sent to.
    pub fn pending_email(&self) -> Option<&str> {
        match &self.step {
            AuthStep::CredentialsSubmitted { email, .. }
            | AuthStep::OtpPending { email, .. }
            | AuthStep::OtpPendingReset { email }
            | AuthStep::PasswordReset { email, .. } => Some(email),
            _ => None,
        }
    }

    /// Whether the OTP form for `purpose` should be shown.
    pub fn awaiting_otp(&self, purpose: OtpPurpose) -> bool {
        matches!(&self.step, AuthStep::OtpPending { purpose: p, .. } if *p == purpose)
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    // =============================================================
    // Startup probe
    // =============================================================

    /// Decide whether a persisted token has to be checked.
    ///
    /// Returns `true` when the caller must fetch `/api/auth/me` and report
    /// back through [`Self::finish_probe`].
    pub fn begin_probe(&mut self, tokens: &dyn TokenStore) -> bool {
        if tokens.load().is_some() {
            self.step = AuthStep::Probing;
            true
        } else {
            self.step = AuthStep::Anonymous;
            false
        }
    }

    pub fn finish_probe(&mut self, result: Result<User, ApiError>, tokens: &dyn TokenStore) {
        if !self.is_probing() {
            return;
        }
        match result {
            Ok(user) => self.step = AuthStep::Authenticated(Session::from(user)),
            Err(_) => {
                tokens.clear();
                self.step = AuthStep::Anonymous;
            }
        }
    }

    // =============================================================
    // Login / registration
    // =============================================================

    pub fn submit_credentials(&mut self, email: &str, password: &str) -> Result<LoginRequest, FormError> {
        self.check_can_start()?;
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(self.reject(FormError::MissingFields));
        }
        let request = LoginRequest { email: email.to_owned(), password: password.to_owned() };
        self.start_credentials(OtpPurpose::Login, email, ResendRequest::Login(request.clone()));
        Ok(request)
    }

    pub fn submit_registration(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<RegisterRequest, FormError> {
        self.check_can_start()?;
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.is_empty() || confirm_password.is_empty() {
            return Err(self.reject(FormError::MissingFields));
        }
        if password != confirm_password {
            return Err(self.reject(FormError::PasswordMismatch));
        }
        let request = RegisterRequest {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        };
        self.start_credentials(OtpPurpose::Register, email, ResendRequest::Register(request.clone()));
        Ok(request)
    }

    /// Apply the response to a login or register call.
    pub fn credentials_result(&mut self, result: Result<MessageResponse, ApiError>) {
        let AuthStep::CredentialsSubmitted { purpose, email } = &self.step else {
            return;
        };
        let (purpose, email) = (*purpose, email.clone());
        self.busy = false;
        let before_submit = self.before_submit.take();
        match result {
            Ok(resp) => {
                self.step = AuthStep::OtpPending { purpose, email };
                self.notice = Some(Notice::Info(
                    resp.message.unwrap_or_else(|| "OTP sent to your email".to_owned()),
                ));
            }
            Err(err) => {
                let fallback = match purpose {
                    OtpPurpose::Login => "Login failed",
                    OtpPurpose::Register => "Registration failed",
                };
                let (step, resend) = before_submit.unwrap_or((AuthStep::Anonymous, None));
                self.step = step;
                self.resend = resend;
                self.notice = Some(Notice::Error(err.user_message(fallback)));
            }
        }
    }

    pub fn submit_otp(&mut self, code: &str) -> Result<VerifyOtpRequest, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        let AuthStep::OtpPending { email, .. } = &self.step else {
            return Err(self.reject(FormError::WrongStep));
        };
        let email = email.clone();
        let code = code.trim();
        if code.is_empty() {
            return Err(self.reject(FormError::MissingOtp));
        }
        self.busy = true;
        self.notice = None;
        Ok(VerifyOtpRequest { email, otp: code.to_owned() })
    }

    /// Apply the response to `verify-otp`; on success the token is persisted.
    pub fn otp_result(&mut self, result: Result<AuthResponse, ApiError>, tokens: &dyn TokenStore) {
        let AuthStep::OtpPending { purpose, .. } = &self.step else {
            return;
        };
        let purpose = *purpose;
        self.busy = false;
        match result {
            Ok(resp) => {
                if let Some(token) = resp.token.as_deref().filter(|t| !t.is_empty()) {
                    tokens.save(token);
                }
                let fallback = match purpose {
                    OtpPurpose::Login => "Login successful!",
                    OtpPurpose::Register => "Registration successful!",
                };
                self.step = AuthStep::Authenticated(Session::from(resp.user));
                self.resend = None;
                self.notice = Some(Notice::Success(resp.message.unwrap_or_else(|| fallback.to_owned())));
            }
            Err(err) => {
                self.notice = Some(Notice::Error(err.user_message("OTP verification failed")));
            }
        }
    }

    /// Credentials to re-submit for a fresh OTP.
    pub fn request_resend(&mut self) -> Option<ResendRequest> {
        if self.busy || !matches!(self.step, AuthStep::OtpPending { .. }) {
            return None;
        }
        let request = self.resend.clone()?;
        self.busy = true;
        Some(request)
    }

    pub fn resend_result(&mut self, result: Result<MessageResponse, ApiError>) {
        if !matches!(self.step, AuthStep::OtpPending { .. }) {
            return;
        }
        self.busy = false;
        self.notice = Some(match result {
            Ok(_) => Notice::Success("OTP resent successfully!".to_owned()),
            Err(err) => Notice::Error(err.user_message("Failed to resend OTP")),
        });
    }

    /// Abandon any pre-auth flow.
    pub fn back_to_login(&mut self) {
        if self.is_authenticated() {
            return;
        }
        self.step = AuthStep::Anonymous;
        self.busy = false;
        self.resend = None;
        self.reset_otp = None;
        self.before_submit = None;
        self.notice = None;
    }

    // =============================================================
    // Session end
    // =============================================================

    /// Finish a logout. The backend result does not matter: the token is
    /// cleared and the machine returns to `Anonymous` either way.
    pub fn logout(&mut self, result: Result<MessageResponse, ApiError>, tokens: &dyn TokenStore) {
        let _ = result;
        tokens.clear();
        self.step = AuthStep::Anonymous;
        self.busy = false;
        self.resend = None;
        self.reset_otp = None;
        self.notice = None;
    }

    /// A protected call was rejected with 401.
    pub fn session_expired(&mut self, tokens: &dyn TokenStore) {
        tokens.clear();
        self.step = AuthStep::Anonymous;
        self.busy = false;
        self.notice = Some(Notice::Error("Your session has expired. Please log in again.".to_owned()));
    }

    // =============================================================
    // Forgot / reset password
    // =============================================================

    pub fn begin_forgot_password(&mut self) {
        if self.is_authenticated() || self.busy {
            return;
        }
        self.step = AuthStep::ForgotPassword;
        self.notice = None;
    }

    pub fn submit_forgot_password(&mut self, email: &str) -> Result<EmailRequest, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        if !matches!(self.step, AuthStep::ForgotPassword) {
            return Err(self.reject(FormError::WrongStep));
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(self.reject(FormError::MissingFields));
        }
        self.busy = true;
        self.notice = None;
        Ok(EmailRequest { email: email.to_owned() })
    }

    /// Apply the response to `forgot-password` for `email`.
    pub fn forgot_password_result(&mut self, email: &str, result: Result<MessageResponse, ApiError>) {
        if !matches!(self.step, AuthStep::ForgotPassword) {
            return;
        }
        self.busy = false;
        match result {
            Ok(resp) => {
                self.step = AuthStep::OtpPendingReset { email: email.to_owned() };
                self.notice = Some(Notice::Success(
                    resp.message.unwrap_or_else(|| "OTP sent to your email".to_owned()),
                ));
            }
            Err(err) => self.notice = Some(Notice::Error(err.user_message("Failed to send OTP"))),
        }
    }

    pub fn submit_reset_otp(&mut self, code: &str) -> Result<VerifyOtpRequest, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        let AuthStep::OtpPendingReset { email } = &self.step else {
            return Err(self.reject(FormError::WrongStep));
        };
        let email = email.clone();
        let code = code.trim();
        if code.is_empty() {
            return Err(self.reject(FormError::MissingOtp));
        }
        self.busy = true;
        self.notice = None;
        self.reset_otp = Some(code.to_owned());
        Ok(VerifyOtpRequest { email, otp: code.to_owned() })
    }

    pub fn reset_otp_result(&mut self, result: Result<MessageResponse, ApiError>) {
        let AuthStep::OtpPendingReset { email } = &self.step else {
            return;
        };
        let email = email.clone();
        self.busy = false;
        match (result, self.reset_otp.take()) {
            (Ok(resp), Some(otp)) => {
                self.step = AuthStep::PasswordReset { email, otp };
                self.notice = resp.message.map(Notice::Success);
            }
            (Ok(_), None) => self.notice = Some(Notice::Error(FormError::MissingOtp.to_string())),
            (Err(err), _) => self.notice = Some(Notice::Error(err.user_message("Invalid OTP"))),
        }
    }

    /// Enter the reset step directly from a `/reset-password?email=&otp=` link.
    pub fn enter_reset_link(&mut self, email: &str, otp: &str) {
        if self.is_authenticated() || self.busy || email.trim().is_empty() || otp.trim().is_empty() {
            return;
        }
        self.step = AuthStep::PasswordReset { email: email.trim().to_owned(), otp: otp.trim().to_owned() };
    }

    pub fn submit_new_password(&mut self, password: &str, confirm: &str) -> Result<ResetPasswordRequest, FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        let AuthStep::PasswordReset { email, otp } = &self.step else {
            return Err(self.reject(FormError::WrongStep));
        };
        let (email, otp) = (email.clone(), otp.clone());
        if password.is_empty() || confirm.is_empty() {
            return Err(self.reject(FormError::MissingFields));
        }
        if password != confirm {
            return Err(self.reject(FormError::PasswordMismatch));
        }
        self.busy = true;
        self.notice = None;
        Ok(ResetPasswordRequest { email, otp, new_password: password.to_owned() })
    }

    pub fn reset_password_result(&mut self, result: Result<MessageResponse, ApiError>) {
        if !matches!(self.step, AuthStep::PasswordReset { .. }) {
            return;
        }
        self.busy = false;
        match result {
            Ok(resp) => {
                self.step = AuthStep::Anonymous;
                self.notice = Some(Notice::Success(
                    resp.message.unwrap_or_else(|| "Password reset successfully".to_owned()),
                ));
            }
            Err(err) => self.notice = Some(Notice::Error(err.user_message("Failed to reset password"))),
        }
    }

    // =============================================================
    // Session mutations
    // =============================================================

    pub fn update_session(&mut self, user: User) {
        if let AuthStep::Authenticated(session) = &mut self.step {
            *session = Session::from(user);
        }
    }

    pub fn set_profile_picture(&mut self, url: &str) {
        if let AuthStep::Authenticated(session) = &mut self.step {
            session.profile_picture = Some(url.to_owned()).filter(|u| !u.is_empty());
        }
    }

    pub fn mark_group_member(&mut self) {
        if let AuthStep::Authenticated(session) = &mut self.step {
            session.is_group_member = true;
        }
    }

    fn check_can_start(&mut self) -> Result<(), FormError> {
        if self.busy {
            return Err(FormError::Busy);
        }
        if self.is_authenticated() || self.is_probing() {
            return Err(self.reject(FormError::WrongStep));
        }
        Ok(())
    }

    fn start_credentials(&mut self, purpose: OtpPurpose, email: &str, resend: ResendRequest) {
        let submitted = AuthStep::CredentialsSubmitted { purpose, email: email.to_owned() };
        let previous = std::mem::replace(&mut self.step, submitted);
        self.before_submit = Some((previous, self.resend.take()));
        self.busy = true;
        self.notice = None;
        self.resend = Some(resend);
    }

    fn reject(&mut self, err: FormError) -> FormError {
        self.notice = Some(Notice::Error(err.to_string()));
        err
    }
}
