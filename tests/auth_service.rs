mod common;

use std::time::Duration;

use popmeet::auth::dto::{LoginRequest, RegisterRequest};
use popmeet::error::AppError;
use popmeet::repository::{RepoError, Repository};

use common::GOOGLE_PROVIDER_ID;

fn password_signup(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        name: "X".into(),
        email: email.into(),
        password: Some(password.into()),
        login_provider: None,
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn register_then_login_returns_same_user() {
    let (state, _repo) = common::state();

    let user = state
        .auth
        .register_user(password_signup("x@y.com", "secret"), None)
        .await
        .expect("register");
    assert!(user.active);
    assert!(user.profile.is_none());
    let security = user.security.as_ref().expect("security record");
    assert!(security.id > 0);
    assert_eq!(security.provider.name, "api");
    assert!(security.hash.as_deref().is_some_and(|h| !h.is_empty()));

    let outcome = state
        .auth
        .login(login("x@y.com", "secret"), Some("10.0.0.1".into()))
        .await
        .expect("login");
    assert_eq!(outcome.user.id, user.id);

    let claims = state
        .credentials
        .validate_token(&outcome.token)
        .expect("token validates");
    assert_eq!(claims.id, user.id);
    assert_eq!(claims.email, "x@y.com");
}

#[tokio::test]
async fn email_is_normalised_before_use() {
    let (state, _repo) = common::state();
    let user = state
        .auth
        .register_user(password_signup("  Mixed@Case.COM ", "pw"), None)
        .await
        .unwrap();
    assert_eq!(user.email, "mixed@case.com");

    let outcome = state.auth.login(login("MIXED@case.com", "pw"), None).await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn duplicate_active_email_conflicts_without_writing() {
    let (state, repo) = common::state();
    state
        .auth
        .register_user(password_signup("dup@y.com", "one"), None)
        .await
        .unwrap();
    let users_before = repo.user_count();

    let err = state
        .auth
        .register_user(password_signup("dup@y.com", "two"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
    assert_eq!(repo.user_count(), users_before);
}

#[tokio::test]
async fn email_of_inactive_user_can_be_reused() {
    let (state, repo) = common::state();
    let old = state
        .auth
        .register_user(password_signup("again@y.com", "one"), None)
        .await
        .unwrap();
    repo.set_user_active(old.id, false);

    let new = state
        .auth
        .register_user(password_signup("again@y.com", "two"), None)
        .await
        .expect("reuse");
    assert_ne!(new.id, old.id);
}

#[tokio::test]
async fn failed_security_insert_leaves_no_user_behind() {
    let (state, repo) = common::state();
    repo.fail_security_insert(true);

    let err = state
        .auth
        .register_user(password_signup("half@y.com", "secret"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TransactionFailure { .. }));
    assert_eq!(repo.user_count(), 0);
    assert_eq!(repo.security_count(), 0);

    let missing = repo.find_user_by_email("half@y.com").await;
    assert!(matches!(missing, Err(RepoError::NotFound { entity: "user", .. })));

    repo.fail_security_insert(false);
    let lookup = state.auth.login(login("half@y.com", "secret"), None).await;
    assert!(matches!(lookup, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_identically() {
    let (state, _repo) = common::state();
    state
        .auth
        .register_user(password_signup("a@b.com", "right"), None)
        .await
        .unwrap();

    let wrong = state.auth.login(login("a@b.com", "wrong"), None).await.unwrap_err();
    let unknown = state
        .auth
        .login(login("nonexistent@b.com", "x"), None)
        .await
        .unwrap_err();

    assert!(matches!(wrong, AppError::InvalidCredentials));
    assert!(matches!(unknown, AppError::InvalidCredentials));
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert_eq!(wrong.status(), unknown.status());
}

#[tokio::test]
async fn login_records_last_login_in_background() {
    let (state, repo) = common::state();
    let user = state
        .auth
        .register_user(password_signup("seen@y.com", "pw"), None)
        .await
        .unwrap();
    let security_id = user.security.unwrap().id;

    state
        .auth
        .login(login("seen@y.com", "pw"), Some("192.168.0.9".into()))
        .await
        .unwrap();

    let mut updates = repo.login_updates();
    for _ in 0..50 {
        if !updates.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        updates = repo.login_updates();
    }
    assert_eq!(updates, vec![(security_id, Some("192.168.0.9".to_string()))]);
}

#[tokio::test]
async fn registration_needs_exactly_one_credential_kind() {
    let (state, repo) = common::state();

    let both = RegisterRequest {
        login_provider: Some(GOOGLE_PROVIDER_ID),
        ..password_signup("both@y.com", "pw")
    };
    let neither = RegisterRequest {
        password: None,
        ..password_signup("neither@y.com", "pw")
    };

    for req in [both, neither] {
        let err = state.auth.register_user(req, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "{err}");
    }
    assert_eq!(repo.user_count(), 0);
}

#[tokio::test]
async fn federated_registration_stores_no_hash() {
    let (state, _repo) = common::state();
    let user = state
        .auth
        .register_user(
            RegisterRequest {
                name: "Fed".into(),
                email: "fed@y.com".into(),
                password: None,
                login_provider: Some(GOOGLE_PROVIDER_ID),
            },
            None,
        )
        .await
        .expect("federated register");

    let security = user.security.unwrap();
    assert_eq!(security.provider.id, GOOGLE_PROVIDER_ID);
    assert!(security.hash.is_none());

    // no password can ever match a federated account
    let err = state.auth.login(login("fed@y.com", ""), None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn unknown_provider_is_a_validation_failure() {
    let (state, _repo) = common::state();
    let err = state
        .auth
        .register_user(
            RegisterRequest {
                name: "Fed".into(),
                email: "fed@y.com".into(),
                password: None,
                login_provider: Some(999),
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "login_provider"));
}

#[tokio::test]
async fn invalid_name_is_rejected_before_any_write() {
    let (state, repo) = common::state();
    let req = RegisterRequest {
        name: "who?".into(),
        ..password_signup("q@y.com", "pw")
    };
    let err = state.auth.register_user(req, None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "name"));
    assert_eq!(repo.user_count(), 0);
}

#[tokio::test]
async fn overlong_email_is_rejected_before_any_write() {
    let (state, repo) = common::state();
    let email = format!("{}@y.com", "e".repeat(300));

    let err = state
        .auth
        .register_user(password_signup(&email, "pw"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "email"));
    assert_eq!(repo.user_count(), 0);
}

#[tokio::test]
async fn overlong_origin_does_not_break_registration_or_login() {
    let (state, repo) = common::state();
    let spoofed = "9".repeat(300);

    let user = state
        .auth
        .register_user(password_signup("long@y.com", "pw"), Some(spoofed.clone()))
        .await
        .expect("register despite spoofed origin");
    let security = user.security.expect("security record");
    assert_eq!(security.last_machine, None);

    state
        .auth
        .login(login("long@y.com", "pw"), Some(spoofed))
        .await
        .expect("login despite spoofed origin");

    let mut updates = repo.login_updates();
    for _ in 0..50 {
        if !updates.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        updates = repo.login_updates();
    }
    assert_eq!(updates, vec![(security.id, None)]);
}
