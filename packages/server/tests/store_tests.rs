//! Postgres-backed reconciliation tests.
//!
//! Run with: cargo test -p kbo-sync --features integration

#![cfg(feature = "integration")]

mod common;

use std::sync::Arc;
use std::time::Duration;

use crate::common::{create_test_organization, unique_kbo_number, TestHarness};
use kbo_sync::domains::organization::activities::{run_sweep, sync_one, SweepOutcome, SyncResult};
use kbo_sync::domains::organization::models::{BusinessIdRecord, InternalOrgRecord, OvoStructure};
use kbo_sync::domains::organization::utils::RecordAction;
use kbo_sync::kernel::test_dependencies::{test_snapshot, MockRegistryClient};
use kbo_sync::kernel::{connect_options, BaseOrganizationStore, ServerDeps};
use sqlx::postgres::PgPoolOptions;
use test_context::test_context;

fn deps_with(ctx: &TestHarness, registry: MockRegistryClient) -> (ServerDeps, Arc<MockRegistryClient>) {
    let registry = Arc::new(registry);
    let deps = ServerDeps::new(Arc::new(ctx.store()), registry.clone());
    (deps, registry)
}

#[test_context(TestHarness)]
#[tokio::test]
async fn internal_record_joins_identifiers(ctx: &TestHarness) {
    let kbo = unique_kbo_number();
    let org = create_test_organization(&ctx.db_pool, Some(&kbo), Some("OVO000123"))
        .await
        .unwrap();

    let record = InternalOrgRecord::find_by_id(&org.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.uri, org.uri);
    assert_eq!(record.kbo_number.as_deref(), Some(kbo.as_str()));
    assert_eq!(record.kbo_identifier_uri, org.kbo_identifier_uri);
    assert_eq!(record.structured_id_uri.as_deref(), Some(org.structured_id_uri.as_str()));
    assert_eq!(record.ovo_number.as_deref(), Some("OVO000123"));
    assert!(record.ovo_structure_uri.is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn records_without_kbo_are_not_swept(ctx: &TestHarness) {
    let with_kbo = create_test_organization(&ctx.db_pool, Some(&unique_kbo_number()), None)
        .await
        .unwrap();
    let without_kbo = create_test_organization(&ctx.db_pool, None, None)
        .await
        .unwrap();

    let records = ctx
        .store()
        .get_all_internal_records_with_business_id()
        .await
        .unwrap();

    assert!(records.iter().any(|r| r.id == with_kbo.id));
    assert!(!records.iter().any(|r| r.id == without_kbo.id));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn sync_creates_then_updates_the_kbo_record(ctx: &TestHarness) {
    let kbo = unique_kbo_number();
    let org = create_test_organization(&ctx.db_pool, Some(&kbo), None)
        .await
        .unwrap();
    let (deps, registry) = deps_with(
        ctx,
        MockRegistryClient::new().with_snapshot(test_snapshot(&kbo, "2024-01-01T00:00:00Z")),
    );

    let result = sync_one(&deps, &org.id).await;
    let SyncResult::Reconciled(decision) = result else {
        panic!("expected Reconciled, got {:?}", result);
    };
    assert_eq!(decision.record, RecordAction::Create);

    let created = BusinessIdRecord::find_by_organization(&org.uri, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert!(created.uri.starts_with("http://data.lblod.info/id/kbo-organisaties/"));
    assert_eq!(Some(created.identifier_uri.clone()), org.kbo_identifier_uri);
    assert_eq!(created.kbo_number.as_deref(), Some(kbo.as_str()));

    let modified: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT modified FROM organizations WHERE id = $1")
            .bind(&org.id)
            .fetch_one(&ctx.db_pool)
            .await
            .unwrap();
    assert!(modified.is_some());

    let mut newer = test_snapshot(&kbo, "2024-06-01T00:00:00Z");
    newer.name = Some(Some("Gemeente Nieuwstad".into()));
    registry.set_snapshots(vec![newer]);

    let result = sync_one(&deps, &org.id).await;
    let SyncResult::Reconciled(decision) = result else {
        panic!("expected Reconciled, got {:?}", result);
    };
    assert_eq!(decision.record, RecordAction::Update);

    let updated = BusinessIdRecord::find_by_uri(&created.uri, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name.as_deref(), Some("Gemeente Nieuwstad"));
    assert_eq!(updated.change_time.as_deref(), Some("2024-06-01T00:00:00Z"));
    assert!(updated.updated_at >= created.updated_at);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn sync_constructs_ovo_structure_once(ctx: &TestHarness) {
    let kbo = unique_kbo_number();
    let org = create_test_organization(&ctx.db_pool, Some(&kbo), None)
        .await
        .unwrap();
    let mut snapshot = test_snapshot(&kbo, "2024-01-01");
    snapshot.ovo_number = Some(Some("OVO002".into()));
    let (deps, _) = deps_with(ctx, MockRegistryClient::new().with_snapshot(snapshot));

    sync_one(&deps, &org.id).await;

    let record = InternalOrgRecord::find_by_id(&org.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.ovo_number.as_deref(), Some("OVO002"));
    let structure_uri = record.ovo_structure_uri.clone().unwrap();
    let structure = OvoStructure::find_by_uri(&structure_uri, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(structure.structured_id_uri, org.structured_id_uri);

    let result = sync_one(&deps, &org.id).await;
    let SyncResult::Reconciled(decision) = result else {
        panic!("expected Reconciled, got {:?}", result);
    };
    assert!(decision.is_noop());
    let after = InternalOrgRecord::find_by_id(&org.id, &ctx.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.ovo_structure_uri, Some(structure_uri));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn sweep_reconciles_matched_organizations(ctx: &TestHarness) {
    let matched_kbo = unique_kbo_number();
    let matched = create_test_organization(&ctx.db_pool, Some(&matched_kbo), None)
        .await
        .unwrap();
    let unmatched = create_test_organization(&ctx.db_pool, Some(&unique_kbo_number()), None)
        .await
        .unwrap();
    let (deps, _) = deps_with(
        ctx,
        MockRegistryClient::new().with_snapshot(test_snapshot(&matched_kbo, "2024-01-01")),
    );

    let outcome = run_sweep(&deps).await.unwrap();

    let SweepOutcome::Completed(summary) = outcome else {
        panic!("expected a completed sweep");
    };
    assert!(summary.created >= 1);
    assert!(BusinessIdRecord::find_by_organization(&matched.uri, &ctx.db_pool)
        .await
        .unwrap()
        .is_some());
    assert!(BusinessIdRecord::find_by_organization(&unmatched.uri, &ctx.db_pool)
        .await
        .unwrap()
        .is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn ping_succeeds_against_live_database(ctx: &TestHarness) {
    ctx.store().ping().await.unwrap();
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stalled_query_hits_statement_timeout(ctx: &TestHarness) {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(&ctx.db_url, Duration::from_millis(200)).unwrap())
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let result = sqlx::query("SELECT pg_sleep(5)").execute(&pool).await;

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(4));
}
