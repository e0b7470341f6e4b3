//! Admin login flow tests against the embedded store.

use std::sync::Arc;

use keymint_auth::AdminAuthenticator;
use keymint_core::config::auth::AuthConfig;
use keymint_core::error::ErrorKind;
use keymint_store::sqlite::SqliteStore;
use keymint_store::LicenseStore;

fn fast_config() -> AuthConfig {
    AuthConfig {
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..AuthConfig::default()
    }
}

async fn authenticator() -> (AdminAuthenticator, Arc<dyn LicenseStore>) {
    let store: Arc<dyn LicenseStore> =
        Arc::new(SqliteStore::connect_in_memory().await.expect("store"));
    let auth = AdminAuthenticator::new(&fast_config(), Arc::clone(&store)).expect("authenticator");
    auth.ensure_bootstrap_admin("admin", "admin123")
        .await
        .expect("bootstrap");
    (auth, store)
}

#[tokio::test]
async fn test_login_issues_verifiable_token_and_touches_last_login() {
    let (auth, store) = authenticator().await;

    let session = auth.login("admin", "admin123").await.expect("login");
    assert_eq!(session.username, "admin");
    // First ever login reports no prior login.
    assert!(session.last_login.is_none());

    let claims = auth.verify(&session.token).expect("verify");
    assert_eq!(claims.username, "admin");
    assert_eq!(claims.exp, session.expires_at.timestamp());

    let admin = store
        .find_admin("admin")
        .await
        .expect("find")
        .expect("present");
    assert!(admin.last_login.is_some());

    // Second login reports the previous one.
    let session = auth.login("admin", "admin123").await.expect("relogin");
    assert!(session.last_login.is_some());
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_unknown_user() {
    let (auth, _store) = authenticator().await;

    let err = auth
        .login("admin", "wrong")
        .await
        .expect_err("wrong password");
    assert_eq!(err.kind, ErrorKind::Auth);

    let err = auth
        .login("ghost", "admin123")
        .await
        .expect_err("unknown user");
    assert_eq!(err.kind, ErrorKind::Auth);

    // Both failures present the same message to the caller.
    assert_eq!(err.message, "Invalid credentials");
}

#[tokio::test]
async fn test_verify_rejects_garbage_tokens() {
    let (auth, _store) = authenticator().await;

    assert_eq!(
        auth.verify("").expect_err("empty").kind,
        ErrorKind::Auth
    );
    assert_eq!(
        auth.verify("abc.def.ghi").expect_err("garbage").kind,
        ErrorKind::Auth
    );
}

#[tokio::test]
async fn test_bootstrap_is_idempotent_and_keeps_first_password() {
    let (auth, _store) = authenticator().await;

    // Re-bootstrap with a different password; the original credential wins.
    auth.ensure_bootstrap_admin("admin", "other-password")
        .await
        .expect("re-bootstrap");

    auth.login("admin", "admin123").await.expect("original login");
    let err = auth
        .login("admin", "other-password")
        .await
        .expect_err("new password must not take");
    assert_eq!(err.kind, ErrorKind::Auth);
}
