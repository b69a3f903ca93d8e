use super::*;

fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<&'a str> {
    move |key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

// =============================================================
// Defaults
// =============================================================

#[test]
fn defaults_point_at_hosted_backend() {
    let config = AppConfig::from_lookup(|_| None);
    assert_eq!(config.api_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.socket_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.app_name, DEFAULT_APP_NAME);
    assert_eq!(config.app_version, env!("CARGO_PKG_VERSION"));
    assert_eq!(config.debug, cfg!(debug_assertions));
}

#[test]
fn blank_values_count_as_unset() {
    let pairs = [("GROUPCHAT_API_URL", "  "), ("GROUPCHAT_APP_NAME", "")];
    let config = AppConfig::from_lookup(lookup_from(&pairs));
    assert_eq!(config.api_url, DEFAULT_BACKEND_URL);
    assert_eq!(config.app_name, DEFAULT_APP_NAME);
}

// =============================================================
// Overrides
// =============================================================

#[test]
fn trailing_slashes_are_trimmed() {
    let pairs = [
        ("GROUPCHAT_API_URL", "http://localhost:5000/"),
        ("GROUPCHAT_SOCKET_URL", "http://localhost:5001//"),
    ];
    let config = AppConfig::from_lookup(lookup_from(&pairs));
    assert_eq!(config.api_url, "http://localhost:5000");
    assert_eq!(config.socket_url, "http://localhost:5001");
    assert_eq!(config.api_endpoint("/api/health"), "http://localhost:5000/api/health");
}

#[test]
fn socket_url_follows_api_url_when_unset() {
    let pairs = [("GROUPCHAT_API_URL", "http://localhost:5000")];
    let config = AppConfig::from_lookup(lookup_from(&pairs));
    assert_eq!(config.socket_url, "http://localhost:5000");
}

#[test]
fn debug_flag_parses_common_spellings() {
    assert!(parse_flag(Some("TRUE"), false));
    assert!(parse_flag(Some("1"), false));
    assert!(!parse_flag(Some("off"), true));
    assert!(parse_flag(Some("maybe"), true));
    assert!(!parse_flag(None, false));
}
