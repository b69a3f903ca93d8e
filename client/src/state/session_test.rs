use super::*;
use crate::util::token_store::MemoryTokenStore;

fn user(id: &str, member: bool) -> User {
    serde_json::from_value(serde_json::json!({
        "_id": id,
        "name": "ann",
        "email": "a@b.com",
        "isGroupMember": member,
        "createdAt": "2024-01-15T08:00:00.000Z"
    }))
    .expect("user fixture")
}

fn ok_message(text: &str) -> Result<MessageResponse, ApiError> {
    Ok(MessageResponse { message: Some(text.to_owned()) })
}

fn server_error(message: &str) -> ApiError {
    ApiError::Server { status: 400, message: Some(message.to_owned()) }
}

fn anonymous() -> AuthState {
    let mut state = AuthState::new();
    state.begin_probe(&MemoryTokenStore::default());
    state
}

fn otp_pending() -> AuthState {
    let mut state = anonymous();
    state.submit_credentials("a@b.com", "pw").expect("credentials");
    state.credentials_result(ok_message("OTP sent"));
    state
}

// =============================================================
// Startup probe
// =============================================================

#[test]
fn probe_without_token_goes_anonymous() {
    let mut state = AuthState::new();
    assert!(state.is_probing());
    assert!(!state.begin_probe(&MemoryTokenStore::default()));
    assert_eq!(state.step(), &AuthStep::Anonymous);
}

#[test]
fn probe_with_valid_token_authenticates() {
    let tokens = MemoryTokenStore::with_token("abc");
    let mut state = AuthState::new();
    assert!(state.begin_probe(&tokens));
    state.finish_probe(Ok(user("u1", true)), &tokens);
    assert_eq!(state.session().map(|s| s.user_id.as_str()), Some("u1"));
    assert_eq!(tokens.load().as_deref(), Some("abc"));
}

#[test]
fn probe_failure_clears_token() {
    let tokens = MemoryTokenStore::with_token("stale");
    let mut state = AuthState::new();
    assert!(state.begin_probe(&tokens));
    state.finish_probe(Err(ApiError::Unauthorized { message: None }), &tokens);
    assert_eq!(state.step(), &AuthStep::Anonymous);
    assert_eq!(tokens.load(), None);
}

// =============================================================
// Login with OTP
// =============================================================

#[test]
fn login_then_otp_authenticates_and_persists_token() {
    let tokens = MemoryTokenStore::default();
    let mut state = anonymous();

    let request = state.submit_credentials(" a@b.com ", "pw").expect("credentials");
    assert_eq!(request.email, "a@b.com");
    assert!(state.is_busy());
    assert!(matches!(state.step(), AuthStep::CredentialsSubmitted { purpose: OtpPurpose::Login, .. }));

    state.credentials_result(ok_message("OTP sent"));
    assert!(state.awaiting_otp(OtpPurpose::Login));
    assert_eq!(state.pending_email(), Some("a@b.com"));
    assert_eq!(state.notice().map(Notice::text), Some("OTP sent"));

    let verify = state.submit_otp("123456").expect("otp");
    assert_eq!(verify, VerifyOtpRequest { email: "a@b.com".to_owned(), otp: "123456".to_owned() });

    state.otp_result(
        Ok(AuthResponse { token: Some("abc".to_owned()), user: user("u1", false), message: None }),
        &tokens,
    );
    assert!(state.is_authenticated());
    assert!(!state.is_busy());
    assert_eq!(tokens.load().as_deref(), Some("abc"));
    assert_eq!(state.notice(), Some(&Notice::Success("Login successful!".to_owned())));
}

#[test]
fn rejected_credentials_return_to_anonymous_with_backend_message() {
    let mut state = anonymous();
    state.submit_credentials("a@b.com", "bad").expect("credentials");
    state.credentials_result(Err(server_error("Invalid credentials")));
    assert_eq!(state.step(), &AuthStep::Anonymous);
    assert_eq!(state.notice(), Some(&Notice::Error("Invalid credentials".to_owned())));
    assert!(!state.is_busy());
}

#[test]
fn rejected_credentials_restore_the_step_they_were_submitted_from() {
    let mut state = anonymous();
    state.submit_registration("Ann", "ann@x.com", "pw", "pw").expect("registration");
    state.credentials_result(ok_message("OTP sent"));
    assert!(state.awaiting_otp(OtpPurpose::Register));

    state.submit_credentials("ann@x.com", "bad").expect("credentials");
    state.credentials_result(Err(server_error("Invalid credentials")));
    assert!(state.awaiting_otp(OtpPurpose::Register));
    assert_eq!(state.pending_email(), Some("ann@x.com"));
    assert!(matches!(state.request_resend(), Some(ResendRequest::Register(_))));
}

#[test]
fn rejected_otp_stays_pending() {
    let tokens = MemoryTokenStore::default();
    let mut state = otp_pending();
    state.submit_otp("000000").expect("otp");
    state.otp_result(Err(ApiError::Timeout), &tokens);
    assert!(state.awaiting_otp(OtpPurpose::Login));
    assert_eq!(state.notice(), Some(&Notice::Error("OTP verification failed".to_owned())));
    assert_eq!(tokens.load(), None);
}

#[test]
fn empty_inputs_are_rejected_without_transition() {
    let mut state = anonymous();
    assert_eq!(state.submit_credentials("  ", "pw"), Err(FormError::MissingFields));
    assert_eq!(state.step(), &AuthStep::Anonymous);
    assert!(state.notice().is_some_and(Notice::is_error));

    let mut state = otp_pending();
    assert_eq!(state.submit_otp(" "), Err(FormError::MissingOtp));
    assert!(!state.is_busy());
}

#[test]
fn duplicate_submit_while_busy_is_refused() {
    let mut state = anonymous();
    state.submit_credentials("a@b.com", "pw").expect("credentials");
    assert_eq!(state.submit_credentials("a@b.com", "pw"), Err(FormError::Busy));
}

#[test]
fn late_result_after_back_to_login_is_ignored() {
    let mut state = anonymous();
    state.submit_credentials("a@b.com", "pw").expect("credentials");
    state.back_to_login();
    state.credentials_result(ok_message("OTP sent"));
    assert_eq!(state.step(), &AuthStep::Anonymous);
    assert_eq!(state.notice(), None);
}

// =============================================================
// Resend
// =============================================================

#[test]
fn resend_reuses_original_credentials_and_keeps_step() {
    let mut state = otp_pending();
    let request = state.request_resend().expect("resend available");
    assert_eq!(
        request,
        ResendRequest::Login(LoginRequest { email: "a@b.com".to_owned(), password: "pw".to_owned() })
    );
    assert!(state.request_resend().is_none(), "second resend while busy");

    state.resend_result(ok_message("ignored"));
    assert!(state.awaiting_otp(OtpPurpose::Login));
    assert_eq!(state.notice(), Some(&Notice::Success("OTP resent successfully!".to_owned())));
}

#[test]
fn resend_failure_surfaces_message() {
    let mut state = otp_pending();
    state.request_resend().expect("resend available");
    state.resend_result(Err(ApiError::Network("offline".to_owned())));
    assert_eq!(state.notice(), Some(&Notice::Error("Failed to resend OTP".to_owned())));
}

// =============================================================
// Registration
// =============================================================

#[test]
fn registration_requires_matching_passwords() {
    let mut state = anonymous();
    assert_eq!(
        state.submit_registration("Ann", "a@b.com", "pw1", "pw2"),
        Err(FormError::PasswordMismatch)
    );
    assert_eq!(state.notice(), Some(&Notice::Error("Passwords do not match".to_owned())));
    assert_eq!(state.step(), &AuthStep::Anonymous);
}

#[test]
fn registration_flows_into_register_otp() {
    let tokens = MemoryTokenStore::default();
    let mut state = anonymous();
    state.submit_registration("Ann", "a@b.com", "pw", "pw").expect("register");
    state.credentials_result(ok_message("Check your email"));
    assert!(state.awaiting_otp(OtpPurpose::Register));
    assert!(matches!(state.request_resend(), Some(ResendRequest::Register(_))));
    state.resend_result(ok_message("again"));

    state.submit_otp("111111").expect("otp");
    state.otp_result(Ok(AuthResponse { token: None, user: user("u2", false), message: None }), &tokens);
    assert_eq!(state.notice(), Some(&Notice::Success("Registration successful!".to_owned())));
    assert_eq!(tokens.load(), None);
}

#[test]
fn registration_failure_uses_register_fallback() {
    let mut state = anonymous();
    state.submit_registration("Ann", "a@b.com", "pw", "pw").expect("register");
    state.credentials_result(Err(ApiError::Timeout));
    assert_eq!(state.notice(), Some(&Notice::Error("Registration failed".to_owned())));
}

// =============================================================
// Logout / expiry
// =============================================================

#[test]
fn logout_clears_token_even_when_backend_call_fails() {
    let tokens = MemoryTokenStore::with_token("abc");
    let mut state = AuthState::new();
    state.begin_probe(&tokens);
    state.finish_probe(Ok(user("u1", true)), &tokens);

    state.logout(Err(ApiError::Network("offline".to_owned())), &tokens);
    assert_eq!(state.step(), &AuthStep::Anonymous);
    assert_eq!(tokens.load(), None);
}

#[test]
fn session_expiry_returns_to_anonymous() {
    let tokens = MemoryTokenStore::with_token("abc");
    let mut state = AuthState::new();
    state.begin_probe(&tokens);
    state.finish_probe(Ok(user("u1", true)), &tokens);

    state.session_expired(&tokens);
    assert!(!state.is_authenticated());
    assert_eq!(tokens.load(), None);
    assert!(state.notice().is_some_and(Notice::is_error));
}

// =============================================================
// Forgot / reset password
// =============================================================

#[test]
fn forgot_password_branch_ends_anonymous_with_success() {
    let mut state = anonymous();
    state.begin_forgot_password();
    assert_eq!(state.step(), &AuthStep::ForgotPassword);

    let request = state.submit_forgot_password("a@b.com").expect("forgot");
    state.forgot_password_result(&request.email, ok_message("OTP sent"));
    assert_eq!(state.step(), &AuthStep::OtpPendingReset { email: "a@b.com".to_owned() });

    state.submit_reset_otp("424242").expect("reset otp");
    state.reset_otp_result(ok_message("OTP verified"));
    assert_eq!(
        state.step(),
        &AuthStep::PasswordReset { email: "a@b.com".to_owned(), otp: "424242".to_owned() }
    );

    assert_eq!(state.submit_new_password("new", "other"), Err(FormError::PasswordMismatch));
    let reset = state.submit_new_password("new", "new").expect("new password");
    assert_eq!(reset.otp, "424242");
    state.reset_password_result(Ok(MessageResponse::default()));
    assert_eq!(state.step(), &AuthStep::Anonymous);
    assert_eq!(state.notice(), Some(&Notice::Success("Password reset successfully".to_owned())));
}

#[test]
fn invalid_reset_otp_stays_in_step() {
    let mut state = anonymous();
    state.begin_forgot_password();
    state.submit_forgot_password("a@b.com").expect("forgot");
    state.forgot_password_result("a@b.com", ok_message("sent"));
    state.submit_reset_otp("1").expect("reset otp");
    state.reset_otp_result(Err(server_error("OTP expired")));
    assert!(matches!(state.step(), AuthStep::OtpPendingReset { .. }));
    assert_eq!(state.notice(), Some(&Notice::Error("OTP expired".to_owned())));
}

#[test]
fn reset_link_enters_password_step() {
    let mut state = anonymous();
    state.enter_reset_link("a@b.com", "999999");
    assert!(matches!(state.step(), AuthStep::PasswordReset { otp, .. } if otp == "999999"));

    let mut state = anonymous();
    state.enter_reset_link("a@b.com", "");
    assert_eq!(state.step(), &AuthStep::Anonymous);
}

// =============================================================
// Session mutations
// =============================================================

#[test]
fn session_mutations_apply_only_when_authenticated() {
    let tokens = MemoryTokenStore::with_token("abc");
    let mut state = anonymous();
    state.mark_group_member();
    assert!(state.session().is_none());

    state.begin_probe(&tokens);
    state.finish_probe(Ok(user("u1", false)), &tokens);
    state.mark_group_member();
    state.set_profile_picture("https://cdn/p.png");
    let session = state.session().expect("session");
    assert!(session.is_group_member);
    assert_eq!(session.profile_picture.as_deref(), Some("https://cdn/p.png"));
    assert_eq!(session.initial(), 'A');
    assert_eq!(session.member_since(), NaiveDate::from_ymd_opt(2024, 1, 15));
}
