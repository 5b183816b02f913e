//! End-to-end tests for the auth flows
//!
//! Drives the public [`AuthService`] surface the way the portal's route
//! handlers do: register, login, change and reset passwords, log out, and
//! verify sessions, with rate limiting and CSRF in the loop.

use std::sync::Arc;
use std::time::Duration;

use docvault_auth_core::{
    AuthConfig, AuthError, AuthService, CsrfGuard, InMemoryUserStore, KeyManager,
    RateLimitPolicy, RateLimiter,
};
use docvault_types::Role;

const IP: &str = "203.0.113.7";
const PASSWORD: &str = "Str0ng!Pass1234";
const NEW_PASSWORD: &str = "N3w!Password9876";

fn auth() -> AuthService<InMemoryUserStore> {
    auth_with(AuthConfig::new("docvault", "docvault-web"))
}

fn auth_with(config: AuthConfig) -> AuthService<InMemoryUserStore> {
    // Min bcrypt cost keeps the suite fast
    let config = config.with_bcrypt_cost(4);
    let keys = KeyManager::new("v1", &"!".repeat(72), Some(&"#".repeat(72))).unwrap();
    AuthService::new(config, keys, Arc::new(InMemoryUserStore::new()))
}

#[test]
fn test_full_login_lifecycle() {
    let auth = auth();
    let subject = auth.register("a@x.com", PASSWORD, IP).unwrap();

    let outcome = auth.login("a@x.com", PASSWORD, IP).unwrap();
    let identity = auth.verify_session(&outcome.token).unwrap();
    assert_eq!(identity.subject_id, subject);
    assert_eq!(identity.role, Role::Client);
    assert_eq!(identity.email, "a@x.com");

    auth.logout(identity.session_id);
    assert!(matches!(
        auth.verify_session(&outcome.token),
        Err(AuthError::Unauthorized)
    ));
}

#[test]
fn test_session_cookie_pairs_with_token() {
    let auth = auth();
    auth.register("a@x.com", PASSWORD, IP).unwrap();
    let outcome = auth.login("a@x.com", PASSWORD, IP).unwrap();

    let cookie = auth.config().session_cookie(&outcome.token);
    assert!(cookie.starts_with("docvault_session="));
    assert!(cookie.contains("HttpOnly"));

    // The token inside the cookie is the verifiable one
    let token = cookie
        .trim_start_matches("docvault_session=")
        .split(';')
        .next()
        .unwrap();
    assert!(auth.verify_session(token).is_ok());
}

#[test]
fn test_five_bad_logins_block_with_bounded_retry_after() {
    let auth = auth();
    auth.register("a@x.com", PASSWORD, IP).unwrap();

    for _ in 0..5 {
        assert!(matches!(
            auth.login("a@x.com", "Wr0ng!Pass1234", IP),
            Err(AuthError::Unauthorized)
        ));
    }

    // Even the correct password is refused while blocked
    match auth.login("a@x.com", PASSWORD, IP) {
        Err(AuthError::RateLimited { retry_after_secs }) => {
            assert!(retry_after_secs > 0);
            assert!(retry_after_secs <= 600);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }

    // A different client address for the same account still gets through
    assert!(auth.login("a@x.com", PASSWORD, "198.51.100.9").is_ok());
}

#[test]
fn test_login_block_does_not_leak_into_forgot_route() {
    let auth = auth();
    auth.register("a@x.com", PASSWORD, IP).unwrap();

    for _ in 0..5 {
        let _ = auth.login("a@x.com", "Wr0ng!Pass1234", IP);
    }
    assert!(matches!(
        auth.login("a@x.com", PASSWORD, IP),
        Err(AuthError::RateLimited { .. })
    ));

    // Separate bucket: the user can still start a reset
    assert!(auth.forgot_password("a@x.com", IP).unwrap().is_some());
}

#[test]
fn test_custom_route_policy_applies() {
    let config = AuthConfig::new("docvault", "docvault-web").with_forgot_limits(
        RateLimitPolicy::default()
            .with_limit(2)
            .with_block(Duration::from_secs(60)),
    );
    let auth = auth_with(config);

    let _ = auth.forgot_password("ghost@x.com", IP);
    let _ = auth.forgot_password("ghost@x.com", IP);
    match auth.forgot_password("ghost@x.com", IP) {
        Err(AuthError::RateLimited { retry_after_secs }) => assert!(retry_after_secs <= 60),
        other => panic!("expected rate limit, got {other:?}"),
    }
}

#[test]
fn test_change_password_logs_out_everywhere() {
    let auth = auth();
    auth.register("a@x.com", PASSWORD, IP).unwrap();
    let laptop = auth.login("a@x.com", PASSWORD, IP).unwrap();
    let phone = auth.login("a@x.com", PASSWORD, "198.51.100.9").unwrap();

    auth.change_password(&laptop.token, PASSWORD, NEW_PASSWORD)
        .unwrap();

    assert!(auth.verify_session(&laptop.token).is_err());
    assert!(auth.verify_session(&phone.token).is_err());
    assert!(auth.login("a@x.com", PASSWORD, IP).is_err());
    assert!(auth.login("a@x.com", NEW_PASSWORD, IP).is_ok());
}

#[test]
fn test_reset_flow_end_to_end() {
    let auth = auth();
    auth.register("a@x.com", PASSWORD, IP).unwrap();
    let session = auth.login("a@x.com", PASSWORD, IP).unwrap();

    // Unknown email gets the same outward outcome as a known one
    assert!(auth.forgot_password("ghost@x.com", IP).unwrap().is_none());
    let issue = auth.forgot_password("a@x.com", IP).unwrap().unwrap();
    assert_eq!(issue.email, "a@x.com");

    // The reset token is not a session
    assert!(auth.verify_session(&issue.token).is_err());

    auth.reset_password(&issue.token, NEW_PASSWORD).unwrap();
    assert!(auth.verify_session(&session.token).is_err());
    assert!(auth.login("a@x.com", NEW_PASSWORD, IP).is_ok());

    // Single use: replaying the token fails
    assert!(matches!(
        auth.reset_password(&issue.token, "An0ther!Pass9876"),
        Err(AuthError::TokenInvalid)
    ));
}

#[test]
fn test_logout_all_counts_sessions() {
    let auth = auth();
    auth.register("a@x.com", PASSWORD, IP).unwrap();
    let first = auth.login("a@x.com", PASSWORD, IP).unwrap();
    let second = auth.login("a@x.com", PASSWORD, IP).unwrap();
    let third = auth.login("a@x.com", PASSWORD, IP).unwrap();

    assert_eq!(auth.logout_all(first.identity.subject_id), 3);
    for token in [&first.token, &second.token, &third.token] {
        assert!(auth.verify_session(token).is_err());
    }

    // Logging in again opens a fresh, working session
    let fresh = auth.login("a@x.com", PASSWORD, IP).unwrap();
    assert!(auth.verify_session(&fresh.token).is_ok());
}

#[test]
fn test_csrf_guard_round() {
    let guard = CsrfGuard::new();
    let config = AuthConfig::new("docvault", "docvault-web");

    let token = guard.issue_token();
    let cookie = config.csrf_cookie(&token);
    assert!(cookie.starts_with("docvault_csrf="));
    assert!(!cookie.contains("HttpOnly"));

    // Mirrored value passes; anything else fails
    assert!(guard.validate(Some(&token), Some(&token)).is_ok());
    assert!(guard.validate(Some(&token), None).is_err());
    assert!(guard
        .validate(Some(&token), Some(&guard.issue_token()))
        .is_err());
}

#[test]
fn test_rate_limit_key_normalization_shares_bucket() {
    let auth = auth();
    auth.register("a@x.com", PASSWORD, IP).unwrap();

    // Case and whitespace variants of the email land in one bucket
    for email in ["a@x.com", "A@X.COM", " a@x.com "] {
        let _ = auth.login(email, "Wr0ng!Pass1234", IP);
    }
    let key = RateLimiter::key([IP, "a@x.com", "login"]);
    assert_eq!(
        auth.rate_limiter()
            .attempts_left(&key, &auth.config().login_limits),
        2
    );
}

#[test]
fn test_tokens_survive_key_rotation() {
    // Tokens signed under the previous key still verify after rotation
    let old_keys = KeyManager::new("old", &"#".repeat(72), None).unwrap();
    let config = AuthConfig::new("docvault", "docvault-web").with_bcrypt_cost(4);
    let store = Arc::new(InMemoryUserStore::new());
    let before = AuthService::new(config.clone(), old_keys, Arc::clone(&store));

    before.register("a@x.com", PASSWORD, IP).unwrap();
    let outcome = before.login("a@x.com", PASSWORD, IP).unwrap();
    assert!(before.verify_session(&outcome.token).is_ok());

    // After rotation the old token fails closed here only because the new
    // process has an empty registry; the signature itself still verifies
    let rotated = KeyManager::new("v2", &"!".repeat(72), Some(&"#".repeat(72))).unwrap();
    let after = AuthService::new(config, rotated, store);
    assert!(matches!(
        after.verify_session(&outcome.token),
        Err(AuthError::Unauthorized)
    ));

    // And a login against the rotated service works under the new key
    assert!(after.login("a@x.com", PASSWORD, IP).is_ok());
}
