use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use stockcast_server::auth::Clock;
use stockcast_server::error::{AppError, AuthError};
use stockcast_server::{AuthService, MemoryUserStore};

/// Steppable clock so expiry can be crossed without sleeping.
struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Utc::now())))
    }

    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn service_with_clock(clock: Arc<TestClock>) -> AuthService {
    AuthService::new(
        Arc::new(MemoryUserStore::new()),
        clock,
        "test_secret".to_string(),
        7,
        4, // minimum bcrypt cost keeps tests fast
    )
}

fn service() -> AuthService {
    service_with_clock(TestClock::new())
}

#[tokio::test]
async fn test_register_then_resolve() {
    let auth = service();

    let token = auth
        .register("a@x.com", "secret1", Some("Ada"))
        .await
        .unwrap();
    assert_eq!(token.token_type, "bearer");

    let user = auth.current_user(&token.access_token).await.unwrap();
    assert_eq!(user.email, "a@x.com");
    assert_eq!(user.name.as_deref(), Some("Ada"));

    // No projection ever carries the hash.
    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("password"));
    assert!(!json.contains("$2"));
}

#[tokio::test]
async fn test_register_validation_errors() {
    let auth = service();

    let err = auth.register("not-an-email", "secret1", None).await;
    assert!(matches!(
        err,
        Err(AppError::AuthError(AuthError::Validation(_)))
    ));

    let err = auth.register("a@x.com", "short", None).await;
    assert!(matches!(
        err,
        Err(AppError::AuthError(AuthError::Validation(_)))
    ));
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let auth = service();

    auth.register("a@x.com", "secret1", None).await.unwrap();
    let err = auth.register("a@x.com", "other-password", None).await;
    assert!(matches!(
        err,
        Err(AppError::AuthError(AuthError::DuplicateEmail))
    ));

    // Same account regardless of case.
    let err = auth.register("A@X.com", "other-password", None).await;
    assert!(matches!(
        err,
        Err(AppError::AuthError(AuthError::DuplicateEmail))
    ));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let auth = service();
    auth.register("a@x.com", "secret1", None).await.unwrap();

    let wrong_password = auth.login("a@x.com", "wrong").await.unwrap_err();
    let unknown_email = auth.login("ghost@x.com", "secret1").await.unwrap_err();

    assert!(matches!(
        wrong_password,
        AppError::AuthError(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        unknown_email,
        AppError::AuthError(AuthError::InvalidCredentials)
    ));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn test_login_issues_fresh_valid_token() {
    let auth = service();
    auth.register("a@x.com", "secret1", None).await.unwrap();

    let token = auth.login("a@x.com", "secret1").await.unwrap();
    assert_eq!(token.token_type, "bearer");

    let user = auth.current_user(&token.access_token).await.unwrap();
    assert_eq!(user.email, "a@x.com");
    assert_eq!(user.name, None);
}

#[tokio::test]
async fn test_token_expires() {
    let clock = TestClock::new();
    let auth = service_with_clock(clock.clone());

    let token = auth.register("a@x.com", "secret1", None).await.unwrap();
    assert!(auth.verify_token(&token.access_token).is_ok());
    assert!(auth.current_user(&token.access_token).await.is_ok());

    // One second shy of the seven-day lifetime: still valid.
    clock.advance(Duration::days(7) - Duration::seconds(1));
    assert!(auth.verify_token(&token.access_token).is_ok());

    // At the expiry instant the token is dead.
    clock.advance(Duration::seconds(1));
    assert!(matches!(
        auth.verify_token(&token.access_token),
        Err(AppError::AuthError(AuthError::Unauthorized))
    ));
    assert!(matches!(
        auth.current_user(&token.access_token).await,
        Err(AppError::AuthError(AuthError::Unauthorized))
    ));
}

#[tokio::test]
async fn test_tampered_signature_rejected() {
    let auth = service();
    let token = auth.register("a@x.com", "secret1", None).await.unwrap();

    let mut parts: Vec<String> = token
        .access_token
        .split('.')
        .map(str::to_owned)
        .collect();
    assert_eq!(parts.len(), 3);

    // Flip one character of the signature segment.
    let sig = parts[2].pop().unwrap();
    parts[2].push(if sig == 'A' { 'B' } else { 'A' });
    let tampered = parts.join(".");

    assert!(matches!(
        auth.verify_token(&tampered),
        Err(AppError::AuthError(AuthError::Unauthorized))
    ));
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let auth = service();
    let other = AuthService::new(
        Arc::new(MemoryUserStore::new()),
        TestClock::new(),
        "different_secret".to_string(),
        7,
        4,
    );

    let token = auth.register("a@x.com", "secret1", None).await.unwrap();
    assert!(other.verify_token(&token.access_token).is_err());
}

#[tokio::test]
async fn test_verify_token_skips_store_lookup() {
    let auth = service();
    let token = auth.register("a@x.com", "secret1", None).await.unwrap();

    let check = auth.verify_token(&token.access_token).unwrap();
    assert!(check.valid);
    assert_eq!(check.email, "a@x.com");

    let user = auth.current_user(&token.access_token).await.unwrap();
    assert_eq!(check.user_id, user.id.to_string());
}

#[tokio::test]
async fn test_malformed_tokens_rejected() {
    let auth = service();

    for garbage in ["", "not-a-token", "a.b", "a.b.c.d", "πφ.中文.!"] {
        assert!(
            matches!(
                auth.verify_token(garbage),
                Err(AppError::AuthError(AuthError::Unauthorized))
            ),
            "expected rejection for {:?}",
            garbage
        );
    }
}
