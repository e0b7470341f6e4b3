//! Store contract tests, run against the embedded SQLite engine.

use chrono::{Duration, Utc};

use keymint_core::error::ErrorKind;
use keymint_core::types::pagination::LogPage;
use keymint_entity::{AuditAction, LicenseUpdate, NewAuditEntry, NewLicense};
use keymint_store::sqlite::SqliteStore;
use keymint_store::LicenseStore;

fn new_license(key: &str, days: i64) -> NewLicense {
    let now = Utc::now();
    NewLicense {
        license_key: key.to_string(),
        user_email: "user@example.com".to_string(),
        user_name: "Test User".to_string(),
        created_at: now,
        expires_at: now + Duration::days(days),
        notes: None,
    }
}

fn audit_entry(key: &str, action: AuditAction) -> NewAuditEntry {
    NewAuditEntry {
        license_key: key.to_string(),
        action,
        machine_id: None,
        ip_address: Some("127.0.0.1".to_string()),
        user_agent: Some("contract-test".to_string()),
        timestamp: Utc::now(),
        details: Some(serde_json::json!({ "success": true })),
    }
}

#[tokio::test]
async fn test_create_and_find_roundtrip() {
    let store = SqliteStore::connect_in_memory().await.expect("store");

    let created = store
        .create_license(&new_license("AAAA111122223333444455AA", 30))
        .await
        .expect("create");
    assert_eq!(created.license_key, "AAAA111122223333444455AA");
    assert!(created.is_active);
    assert_eq!(created.usage_count, 0);
    assert!(created.machine_id.is_none());
    assert!(created.last_used.is_none());

    let found = store
        .find_by_key("AAAA111122223333444455AA")
        .await
        .expect("find")
        .expect("present");
    assert_eq!(found.id, created.id);
    assert_eq!(found.user_email, "user@example.com");

    assert!(store.find_by_key("missing").await.expect("find").is_none());
}

#[tokio::test]
async fn test_duplicate_key_maps_to_duplicate_kind() {
    let store = SqliteStore::connect_in_memory().await.expect("store");

    store
        .create_license(&new_license("DUPLICATEKEY000000000001", 30))
        .await
        .expect("first create");
    let err = store
        .create_license(&new_license("DUPLICATEKEY000000000001", 30))
        .await
        .expect_err("second create must collide");
    assert_eq!(err.kind, ErrorKind::Duplicate);
}

#[tokio::test]
async fn test_bind_and_record_usage_is_conditional() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let key = "BINDKEY00000000000000001";
    store
        .create_license(&new_license(key, 30))
        .await
        .expect("create");

    // First bind takes the license.
    assert!(store
        .bind_and_record_usage(key, "machine-a", Utc::now())
        .await
        .expect("bind"));
    // Same machine revalidates.
    assert!(store
        .bind_and_record_usage(key, "machine-a", Utc::now())
        .await
        .expect("rebind"));
    // A different machine does not match the guard.
    assert!(!store
        .bind_and_record_usage(key, "machine-b", Utc::now())
        .await
        .expect("foreign bind"));

    let lic = store.find_by_key(key).await.expect("find").expect("present");
    assert_eq!(lic.machine_id.as_deref(), Some("machine-a"));
    assert_eq!(lic.usage_count, 2);
    assert!(lic.last_used.is_some());
}

#[tokio::test]
async fn test_concurrent_binding_is_first_writer_wins() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let key = "RACEKEY00000000000000001";
    store
        .create_license(&new_license(key, 30))
        .await
        .expect("create");

    let now = Utc::now();
    let (a, b) = tokio::join!(
        store.bind_and_record_usage(key, "machine-a", now),
        store.bind_and_record_usage(key, "machine-b", now),
    );
    let a = a.expect("bind a");
    let b = b.expect("bind b");

    // Exactly one writer binds; no interleaving binds both.
    assert!(a ^ b, "exactly one concurrent bind must win (a={a}, b={b})");

    let lic = store.find_by_key(key).await.expect("find").expect("present");
    assert_eq!(lic.usage_count, 1);
    let bound = lic.machine_id.expect("bound");
    assert!(bound == "machine-a" || bound == "machine-b");
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let key = "REVOKEKEY000000000000001";
    store
        .create_license(&new_license(key, 30))
        .await
        .expect("create");

    assert_eq!(store.revoke(key).await.expect("revoke"), 1);
    // Second revoke matches zero rows, without error.
    assert_eq!(store.revoke(key).await.expect("re-revoke"), 0);
    assert_eq!(store.revoke("missing").await.expect("unknown"), 0);

    let lic = store.find_by_key(key).await.expect("find").expect("present");
    assert!(!lic.is_active);
}

#[tokio::test]
async fn test_partial_update_and_unbind() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let key = "UPDATEKEY000000000000001";
    store
        .create_license(&new_license(key, 30))
        .await
        .expect("create");
    store
        .bind_and_record_usage(key, "machine-a", Utc::now())
        .await
        .expect("bind");

    let update = LicenseUpdate {
        user_name: Some("Renamed User".to_string()),
        notes: Some("renewed".to_string()),
        ..Default::default()
    };
    assert_eq!(store.update(key, &update).await.expect("update"), 1);

    let lic = store.find_by_key(key).await.expect("find").expect("present");
    assert_eq!(lic.user_name, "Renamed User");
    assert_eq!(lic.notes.as_deref(), Some("renewed"));
    // Untouched fields survive.
    assert_eq!(lic.user_email, "user@example.com");
    assert_eq!(lic.machine_id.as_deref(), Some("machine-a"));

    // Empty machine id clears the binding.
    let unbind = LicenseUpdate {
        machine_id: Some(String::new()),
        ..Default::default()
    };
    assert_eq!(store.update(key, &unbind).await.expect("unbind"), 1);
    let lic = store.find_by_key(key).await.expect("find").expect("present");
    assert!(lic.machine_id.is_none());

    // Empty update touches nothing.
    assert_eq!(
        store.update(key, &LicenseUpdate::default()).await.expect("noop"),
        0
    );
    assert_eq!(store.update("missing", &update).await.expect("unknown"), 0);
}

#[tokio::test]
async fn test_delete_removes_license_but_keeps_logs() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let key = "DELETEKEY000000000000001";
    store
        .create_license(&new_license(key, 30))
        .await
        .expect("create");
    store
        .append_log(&audit_entry(key, AuditAction::LicenseCreated))
        .await
        .expect("log");

    assert_eq!(store.delete(key).await.expect("delete"), 1);
    assert_eq!(store.delete(key).await.expect("re-delete"), 0);
    assert!(store.find_by_key(key).await.expect("find").is_none());

    // Audit entries for deleted licenses persist.
    let logs = store.list_logs(LogPage::default()).await.expect("logs");
    assert!(logs.iter().any(|e| e.license_key == key));
}

#[tokio::test]
async fn test_list_all_newest_first() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    for (i, key) in ["ORDERKEY0000000000000001", "ORDERKEY0000000000000002", "ORDERKEY0000000000000003"]
        .iter()
        .enumerate()
    {
        let mut data = new_license(key, 30);
        data.created_at = Utc::now() + Duration::seconds(i as i64);
        store.create_license(&data).await.expect("create");
    }

    let all = store.list_all().await.expect("list");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].license_key, "ORDERKEY0000000000000003");
    assert_eq!(all[2].license_key, "ORDERKEY0000000000000001");
}

#[tokio::test]
async fn test_stats_over_mixed_fixture() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let now = Utc::now();

    // Active unbound.
    store
        .create_license(&new_license("STATSKEY0000000000000001", 30))
        .await
        .expect("create");
    // Active bound.
    store
        .create_license(&new_license("STATSKEY0000000000000002", 30))
        .await
        .expect("create");
    store
        .bind_and_record_usage("STATSKEY0000000000000002", "machine-a", now)
        .await
        .expect("bind");
    // Revoked.
    store
        .create_license(&new_license("STATSKEY0000000000000003", 30))
        .await
        .expect("create");
    store.revoke("STATSKEY0000000000000003").await.expect("revoke");
    // Expired (still active).
    store
        .create_license(&new_license("STATSKEY0000000000000004", -1))
        .await
        .expect("create");

    let stats = store.stats(now).await.expect("stats");
    assert_eq!(stats.total, 4);
    assert_eq!(stats.active, 3);
    assert_eq!(stats.revoked, 1);
    assert_eq!(stats.expired, 1);
    assert_eq!(stats.bound, 1);
}

#[tokio::test]
async fn test_log_pagination_newest_first() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let base = Utc::now();
    for i in 0..5 {
        let mut entry = audit_entry("LOGKEY000000000000000001", AuditAction::ValidationAttempt);
        entry.timestamp = base + Duration::seconds(i);
        let id = store.append_log(&entry).await.expect("append");
        assert!(id > 0);
    }

    let first_page = store.list_logs(LogPage::new(2, 0)).await.expect("page 1");
    assert_eq!(first_page.len(), 2);
    assert!(first_page[0].timestamp >= first_page[1].timestamp);

    let second_page = store.list_logs(LogPage::new(2, 2)).await.expect("page 2");
    assert_eq!(second_page.len(), 2);
    assert!(first_page[1].timestamp >= second_page[0].timestamp);

    let rest = store.list_logs(LogPage::new(10, 4)).await.expect("tail");
    assert_eq!(rest.len(), 1);
}

#[tokio::test]
async fn test_admin_bootstrap_and_login_touch() {
    let store = SqliteStore::connect_in_memory().await.expect("store");
    let now = Utc::now();

    store
        .ensure_admin("admin", "$argon2id$fake-hash", now)
        .await
        .expect("bootstrap");
    // Second bootstrap is a no-op, not an error.
    store
        .ensure_admin("admin", "$argon2id$other-hash", now)
        .await
        .expect("re-bootstrap");

    let admin = store
        .find_admin("admin")
        .await
        .expect("find")
        .expect("present");
    assert_eq!(admin.password_hash, "$argon2id$fake-hash");
    assert!(admin.last_login.is_none());

    assert_eq!(
        store.touch_admin_login("admin", now).await.expect("touch"),
        1
    );
    let admin = store
        .find_admin("admin")
        .await
        .expect("find")
        .expect("present");
    assert!(admin.last_login.is_some());

    assert!(store.find_admin("ghost").await.expect("find").is_none());
    assert_eq!(
        store.touch_admin_login("ghost", now).await.expect("touch"),
        0
    );
}
