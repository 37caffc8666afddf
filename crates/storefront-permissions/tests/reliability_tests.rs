//! Reliability tests for storefront-permissions
//!
//! These tests cover behavior when the role/permission store misbehaves:
//! - Lookups degrade to an empty set instead of failing the caller
//! - Failures are never cached
//! - Fallible variants surface the store error explicitly

mod common;

use std::sync::Arc;

use common::{seeded_store, CountingStore, ADMIN_USER, STAFF_USER};
use storefront_permissions::{
    PermissionRouteTable, PermissionService, SqlRoleStore, StoreError,
};

fn service_with(store: Arc<CountingStore>) -> PermissionService {
    PermissionService::builder().store(store).build().unwrap()
}

// ============================================================================
// Store failures degrade to empty results
// ============================================================================

#[tokio::test]
async fn test_store_failure_yields_empty_permissions() {
    let store = Arc::new(CountingStore::new(seeded_store()));
    store.set_failing(true);
    let service = service_with(store.clone());

    let permissions = service.user_permissions(STAFF_USER).await;
    assert!(permissions.is_empty());
    assert!(service.user_roles(STAFF_USER).await.is_empty());
}

#[tokio::test]
async fn test_store_failure_is_not_cached() {
    let store = Arc::new(CountingStore::new(seeded_store()));
    let service = service_with(store.clone());

    store.set_failing(true);
    assert!(service.user_permissions(STAFF_USER).await.is_empty());

    store.set_failing(false);
    let permissions = service.user_permissions(STAFF_USER).await;
    assert!(permissions.contains(&"products.create".to_string()));
    assert_eq!(store.permission_queries(), 2);
    assert_eq!(service.cache_stats().fetch_failures, 1);
}

#[tokio::test]
async fn test_cached_entry_survives_later_store_outage() {
    let store = Arc::new(CountingStore::new(seeded_store()));
    let service = service_with(store.clone());

    let before = service.user_permissions(STAFF_USER).await;
    store.set_failing(true);
    let during = service.user_permissions(STAFF_USER).await;

    assert!(Arc::ptr_eq(&before, &during));
    assert_eq!(store.permission_queries(), 1);
}

// ============================================================================
// Fallible variants surface the error
// ============================================================================

#[tokio::test]
async fn test_try_variants_surface_store_errors() {
    let store = Arc::new(CountingStore::new(seeded_store()));
    store.set_failing(true);
    let service = service_with(store);

    assert!(matches!(
        service.try_user_permissions(STAFF_USER).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(
        service.try_user_roles(STAFF_USER).await,
        Err(StoreError::Unavailable(_))
    ));
}

#[tokio::test]
async fn test_authorize_fails_closed_on_store_error() {
    let store = Arc::new(CountingStore::new(seeded_store()));
    store.set_failing(true);
    let service = service_with(store);

    // Guarded route: error is surfaced rather than treated as a denial
    assert!(service
        .authorize(Some(ADMIN_USER), "POST", "/api/v1/products")
        .await
        .is_err());
    // Public routes never touch the store
    assert!(service
        .authorize(Some(ADMIN_USER), "GET", "/api/v1/products")
        .await
        .unwrap()
        .is_allowed());
}

#[tokio::test]
async fn test_clear_during_outage_then_recover() {
    let store = Arc::new(CountingStore::new(seeded_store()));
    let service = service_with(store.clone());

    service.user_permissions(STAFF_USER).await;
    store.set_failing(true);
    service.clear_permission_cache();
    assert!(service.user_permissions(STAFF_USER).await.is_empty());

    store.set_failing(false);
    assert!(!service.user_permissions(STAFF_USER).await.is_empty());
    assert_eq!(store.permission_queries(), 3);
}

// ============================================================================
// SQL store end to end
// ============================================================================

#[tokio::test]
async fn test_sql_store_behind_service() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqlRoleStore::new(pool);
    store.ensure_schema().await.unwrap();

    sqlx::raw_sql(
        r#"
INSERT INTO roles (role_id, role_name, is_active) VALUES (1, 'admin', 1), (2, 'staff', 1);
INSERT INTO permissions (permission_id, permission_name, module) VALUES
    (10, 'products.create', 'products'),
    (11, 'orders.manage_status', 'orders');
INSERT INTO role_permissions (role_id, permission_id) VALUES (2, 10);
INSERT INTO user_roles (user_id, role_id) VALUES (5, 2), (6, 1);
"#,
    )
    .execute(store.pool())
    .await
    .unwrap();

    let service = PermissionService::new(
        Arc::new(PermissionRouteTable::storefront_defaults().unwrap()),
        Arc::new(store.clone()),
    );

    assert!(service
        .authorize(Some(5), "POST", "/api/v1/products")
        .await
        .unwrap()
        .is_allowed());
    assert!(!service
        .authorize(Some(5), "PATCH", "/api/v1/orders/1/status")
        .await
        .unwrap()
        .is_allowed());
    assert!(service
        .authorize(Some(6), "PATCH", "/api/v1/orders/1/status")
        .await
        .unwrap()
        .is_allowed());

    // Closing the pool turns every query into an error
    store.pool().close().await;
    service.clear_permission_cache();
    assert!(service.user_permissions(5).await.is_empty());
    assert!(matches!(
        service.try_user_permissions(5).await,
        Err(StoreError::Database(_))
    ));
}
