use super::*;
use crate::net::types::User;
use crate::util::token_store::MemoryTokenStore;

fn authenticated() -> AuthState {
    let tokens = MemoryTokenStore::with_token("abc");
    let mut state = AuthState::new();
    state.begin_probe(&tokens);
    let user: User = serde_json::from_value(serde_json::json!({"_id": "u1", "name": "Alice"})).expect("user");
    state.finish_probe(Ok(user), &tokens);
    state
}

#[test]
fn should_not_redirect_while_probing() {
    let state = AuthState::new();
    assert_eq!(unauth_redirect_target(&state), None);
    assert_eq!(authed_redirect_target(&state), None);
}

#[test]
fn signed_out_users_are_sent_to_login() {
    let mut state = AuthState::new();
    state.begin_probe(&MemoryTokenStore::default());
    assert_eq!(unauth_redirect_target(&state), Some(LOGIN_ROUTE));
    assert_eq!(authed_redirect_target(&state), None);
}

#[test]
fn signed_in_users_are_sent_to_dashboard() {
    let state = authenticated();
    assert_eq!(unauth_redirect_target(&state), None);
    assert_eq!(authed_redirect_target(&state), Some(DASHBOARD_ROUTE));
}
