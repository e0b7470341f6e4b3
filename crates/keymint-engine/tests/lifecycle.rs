//! License lifecycle tests: issuance, binding, rejection precedence, and
//! the audit trail, run against the embedded store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use keymint_core::config::license::LicenseConfig;
use keymint_core::error::ErrorKind;
use keymint_core::types::pagination::LogPage;
use keymint_engine::{AuditLogger, IssueLicense, LicenseService, RequestMeta, ValidationEngine};
use keymint_entity::{LicenseUpdate, NewLicense};
use keymint_store::sqlite::SqliteStore;
use keymint_store::LicenseStore;

struct Harness {
    store: Arc<dyn LicenseStore>,
    engine: ValidationEngine,
    service: LicenseService,
    audit: AuditLogger,
}

async fn harness() -> Harness {
    let store: Arc<dyn LicenseStore> =
        Arc::new(SqliteStore::connect_in_memory().await.expect("store"));
    let audit = AuditLogger::new(Arc::clone(&store));
    let engine = ValidationEngine::new(Arc::clone(&store), audit.clone());
    let service = LicenseService::new(Arc::clone(&store), audit.clone(), LicenseConfig::default());
    Harness {
        store,
        engine,
        service,
        audit,
    }
}

fn meta() -> RequestMeta {
    RequestMeta::new(Some("127.0.0.1".to_string()), Some("lifecycle-test".to_string()))
}

fn issue_request() -> IssueLicense {
    IssueLicense {
        user_email: "user@example.com".to_string(),
        user_name: "Test User".to_string(),
        duration_days: Some(365),
        notes: None,
    }
}

#[tokio::test]
async fn test_end_to_end_bind_confirm_and_mismatch() {
    let h = harness().await;

    let license = h.service.issue(issue_request(), None, &meta()).await.expect("issue");
    assert_eq!(license.license_key.len(), 24);
    assert_eq!(license.usage_count, 0);

    // First validation binds to M1.
    let validated = h
        .engine
        .validate(&license.license_key, Some("M1"), &meta())
        .await
        .expect("first validation");
    assert_eq!(validated.machine_id, "M1");
    assert_eq!(validated.license.usage_count, 1);
    assert_eq!(validated.license.machine_id.as_deref(), Some("M1"));

    // Second validation from the same machine confirms.
    let validated = h
        .engine
        .validate(&license.license_key, Some("M1"), &meta())
        .await
        .expect("second validation");
    assert_eq!(validated.license.usage_count, 2);

    // A different machine is rejected without mutation.
    let err = h
        .engine
        .validate(&license.license_key, Some("M2"), &meta())
        .await
        .expect_err("mismatch");
    assert_eq!(err.kind, ErrorKind::MachineMismatch);

    let after = h
        .store
        .find_by_key(&license.license_key)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(after.usage_count, 2);
    assert_eq!(after.machine_id.as_deref(), Some("M1"));
}

#[tokio::test]
async fn test_revoked_license_is_rejected_even_for_bound_machine() {
    let h = harness().await;

    let license = h.service.issue(issue_request(), None, &meta()).await.expect("issue");
    h.engine
        .validate(&license.license_key, Some("M1"), &meta())
        .await
        .expect("bind");

    h.service
        .revoke(&license.license_key, None, &meta())
        .await
        .expect("revoke");

    let err = h
        .engine
        .validate(&license.license_key, Some("M1"), &meta())
        .await
        .expect_err("revoked");
    assert_eq!(err.kind, ErrorKind::Revoked);
}

#[tokio::test]
async fn test_expired_license_is_rejected_regardless_of_state() {
    let h = harness().await;
    let now = Utc::now();

    // Written through the store directly; issuance refuses past expiries.
    h.store
        .create_license(&NewLicense {
            license_key: "EXPIREDKEY00000000000001".to_string(),
            user_email: "user@example.com".to_string(),
            user_name: "Test User".to_string(),
            created_at: now - Duration::days(30),
            expires_at: now - Duration::days(1),
            notes: None,
        })
        .await
        .expect("create");
    // Even an existing binding does not rescue an expired license.
    let update = LicenseUpdate {
        machine_id: Some("M1".to_string()),
        ..Default::default()
    };
    h.store
        .update("EXPIREDKEY00000000000001", &update)
        .await
        .expect("bind via admin update");

    let err = h
        .engine
        .validate("EXPIREDKEY00000000000001", Some("M1"), &meta())
        .await
        .expect_err("expired");
    assert_eq!(err.kind, ErrorKind::Expired);

    let after = h
        .store
        .find_by_key("EXPIREDKEY00000000000001")
        .await
        .expect("find")
        .expect("present");
    assert_eq!(after.usage_count, 0);
}

#[tokio::test]
async fn test_unknown_key_is_rejected_and_still_audited() {
    let h = harness().await;

    let err = h
        .engine
        .validate("NOSUCHKEY000000000000001", Some("M1"), &meta())
        .await
        .expect_err("unknown");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let logs = h.audit.list(LogPage::default()).await.expect("logs");
    let entry = logs
        .iter()
        .find(|e| e.license_key == "NOSUCHKEY000000000000001")
        .expect("audit entry for rejected validation");
    assert_eq!(entry.action, "validation_attempt");
    let details: serde_json::Value =
        serde_json::from_str(entry.details.as_deref().expect("details")).expect("json");
    assert_eq!(details["success"], false);
}

#[tokio::test]
async fn test_every_validation_appends_exactly_one_entry() {
    let h = harness().await;
    let license = h.service.issue(issue_request(), None, &meta()).await.expect("issue");

    h.engine
        .validate(&license.license_key, Some("M1"), &meta())
        .await
        .expect("ok");
    let _ = h
        .engine
        .validate(&license.license_key, Some("M2"), &meta())
        .await
        .expect_err("mismatch");
    let _ = h
        .engine
        .validate("NOSUCHKEY000000000000001", Some("M1"), &meta())
        .await
        .expect_err("unknown");

    let logs = h.audit.list(LogPage::default()).await.expect("logs");
    let attempts: Vec<_> = logs
        .iter()
        .filter(|e| e.action == "validation_attempt")
        .collect();
    assert_eq!(attempts.len(), 3);

    // The issuance wrote its own, distinctly-named entry.
    assert!(logs.iter().any(|e| e.action == "license_created"));
}

#[tokio::test]
async fn test_concurrent_validation_binds_exactly_once() {
    let h = harness().await;
    let license = h.service.issue(issue_request(), None, &meta()).await.expect("issue");

    let (m1, m2) = (meta(), meta());
    let (a, b) = tokio::join!(
        h.engine.validate(&license.license_key, Some("M1"), &m1),
        h.engine.validate(&license.license_key, Some("M2"), &m2),
    );

    // Exactly one concurrent caller wins the binding.
    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
    for outcome in [a, b] {
        if let Err(e) = outcome {
            assert_eq!(e.kind, ErrorKind::MachineMismatch);
        }
    }

    let after = h
        .store
        .find_by_key(&license.license_key)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(after.usage_count, 1);
}

#[tokio::test]
async fn test_issued_keys_are_unique_and_well_formed() {
    let h = harness().await;
    let mut keys = std::collections::HashSet::new();

    for _ in 0..50 {
        let license = h.service.issue(issue_request(), None, &meta()).await.expect("issue");
        assert_eq!(license.license_key.len(), 24);
        assert!(license.license_key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(license.license_key, license.license_key.to_uppercase());
        assert!(license.expires_at > license.created_at);
        assert!(keys.insert(license.license_key));
    }
}

#[tokio::test]
async fn test_info_is_read_only() {
    let h = harness().await;
    let license = h.service.issue(issue_request(), None, &meta()).await.expect("issue");

    let summary = h.service.info(&license.license_key).await.expect("info");
    assert_eq!(summary.usage_count, 0);
    assert!(summary.machine_id.is_none());

    // Still unbound and unused afterwards.
    let after = h
        .store
        .find_by_key(&license.license_key)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(after.usage_count, 0);
    assert!(after.machine_id.is_none());

    h.service
        .revoke(&license.license_key, None, &meta())
        .await
        .expect("revoke");
    let err = h.service.info(&license.license_key).await.expect_err("revoked");
    assert_eq!(err.kind, ErrorKind::Revoked);
}

#[tokio::test]
async fn test_revoke_of_unknown_or_already_revoked_is_not_found() {
    let h = harness().await;
    let license = h.service.issue(issue_request(), None, &meta()).await.expect("issue");

    h.service
        .revoke(&license.license_key, Some("admin"), &meta())
        .await
        .expect("revoke");
    let err = h
        .service
        .revoke(&license.license_key, Some("admin"), &meta())
        .await
        .expect_err("second revoke");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = h
        .service
        .revoke("NOSUCHKEY000000000000001", Some("admin"), &meta())
        .await
        .expect_err("unknown");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_admin_update_delete_and_audit_actions() {
    let h = harness().await;
    let license = h.service.issue(issue_request(), Some("admin"), &meta()).await.expect("issue");

    let update = LicenseUpdate {
        notes: Some("migrated workstation".to_string()),
        machine_id: Some("M9".to_string()),
        ..Default::default()
    };
    h.service
        .update(&license.license_key, update, "admin", &meta())
        .await
        .expect("update");

    let after = h
        .store
        .find_by_key(&license.license_key)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(after.machine_id.as_deref(), Some("M9"));

    let err = h
        .service
        .update(&license.license_key, LicenseUpdate::default(), "admin", &meta())
        .await
        .expect_err("empty update");
    assert_eq!(err.kind, ErrorKind::Validation);

    h.service
        .delete(&license.license_key, "admin", &meta())
        .await
        .expect("delete");
    assert!(h
        .store
        .find_by_key(&license.license_key)
        .await
        .expect("find")
        .is_none());

    let logs = h.audit.list(LogPage::default()).await.expect("logs");
    for action in [
        "admin_license_created",
        "admin_license_updated",
        "admin_license_deleted",
    ] {
        let entry = logs
            .iter()
            .find(|e| e.action == action)
            .unwrap_or_else(|| panic!("missing audit action {action}"));
        let details: serde_json::Value =
            serde_json::from_str(entry.details.as_deref().expect("details")).expect("json");
        assert_eq!(details["admin"], "admin");
    }
}

#[tokio::test]
async fn test_stats_reflect_lifecycle() {
    let h = harness().await;

    let active = h.service.issue(issue_request(), None, &meta()).await.expect("issue");
    let bound = h.service.issue(issue_request(), None, &meta()).await.expect("issue");
    let revoked = h.service.issue(issue_request(), None, &meta()).await.expect("issue");

    h.engine
        .validate(&bound.license_key, Some("M1"), &meta())
        .await
        .expect("bind");
    h.service
        .revoke(&revoked.license_key, None, &meta())
        .await
        .expect("revoke");

    let stats = h.service.stats().await.expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.revoked, 1);
    assert_eq!(stats.expired, 0);
    assert_eq!(stats.bound, 1);

    let _ = active;
}

#[tokio::test]
async fn test_issue_rejects_bad_input_before_store_access() {
    let h = harness().await;

    let err = h
        .service
        .issue(
            IssueLicense {
                user_email: "  ".to_string(),
                user_name: "Test".to_string(),
                duration_days: Some(30),
                notes: None,
            },
            None,
            &meta(),
        )
        .await
        .expect_err("blank email");
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = h
        .service
        .issue(
            IssueLicense {
                duration_days: Some(0),
                ..issue_request()
            },
            None,
            &meta(),
        )
        .await
        .expect_err("zero duration");
    assert_eq!(err.kind, ErrorKind::Validation);

    // Nothing was persisted or audited.
    assert!(h.service.list().await.expect("list").is_empty());
    assert!(h.audit.list(LogPage::default()).await.expect("logs").is_empty());
}
