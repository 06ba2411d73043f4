//! Integration tests for the pool inventory repository.
//!
//! Exercises `BarcodeItemRepo` against a real database:
//! - Ordered bulk insert and FIFO claims
//! - Concurrent claims with SKIP LOCKED
//! - Case-insensitive uniqueness on bulk and single-row inserts
//! - Stats, export scopes, disable, purge, and batch summaries

use std::collections::HashSet;

use sqlx::PgPool;
use tracecode_core::export::ExportScope;
use tracecode_db::errors::is_unique_violation;
use tracecode_db::models::status::BarcodeItemStatus;
use tracecode_db::repositories::BarcodeItemRepo;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn codes(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{prefix}{i:06}VN")).collect()
}

async fn seed(pool: &PgPool, codes: &[String]) -> Uuid {
    let batch_id = Uuid::now_v7();
    let inserted = BarcodeItemRepo::insert_batch(pool, codes, batch_id, "seed.xlsx")
        .await
        .unwrap();
    assert_eq!(inserted, codes.len() as u64);
    batch_id
}

// ---------------------------------------------------------------------------
// Test: claims
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claims_follow_import_order(pool: PgPool) {
    let batch = vec![
        "CC000001VN".to_string(),
        "AA000001VN".to_string(),
        "BB000001VN".to_string(),
    ];
    seed(&pool, &batch).await;

    for expected in &batch {
        let item = BarcodeItemRepo::claim_next(&pool, Some("ORD-1"))
            .await
            .unwrap()
            .expect("an item should be available");
        assert_eq!(&item.code, expected);
        assert_eq!(item.status(), Some(BarcodeItemStatus::Used));
        assert!(item.used_at.is_some());
        assert_eq!(item.used_by_key.as_deref(), Some("ORD-1"));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claim_on_empty_pool_returns_none_without_changes(pool: PgPool) {
    seed(&pool, &codes("RR", 1)).await;
    BarcodeItemRepo::claim_next(&pool, None).await.unwrap().unwrap();

    for _ in 0..3 {
        let claimed = BarcodeItemRepo::claim_next(&pool, Some("ORD-X")).await.unwrap();
        assert!(claimed.is_none());
    }

    let stats = BarcodeItemRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.used, 1);
    assert_eq!(stats.available, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_anonymous_claim_records_empty_key(pool: PgPool) {
    seed(&pool, &codes("RR", 1)).await;
    let item = BarcodeItemRepo::claim_next(&pool, None).await.unwrap().unwrap();
    assert_eq!(item.used_by_key.as_deref(), Some(""));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_claims_are_distinct(pool: PgPool) {
    const ITEMS: usize = 40;
    const CLAIMANTS: usize = 25;
    seed(&pool, &codes("EA", ITEMS)).await;

    let handles: Vec<_> = (0..CLAIMANTS)
        .map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let key = format!("ORD-{i}");
                let item = BarcodeItemRepo::claim_next(&pool, Some(&key))
                    .await
                    .unwrap()
                    .expect("pool should not run dry");
                item.code
            })
        })
        .collect();

    let claimed: Vec<String> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let distinct: HashSet<&String> = claimed.iter().collect();
    assert_eq!(distinct.len(), CLAIMANTS);

    let stats = BarcodeItemRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.used, CLAIMANTS as i64);
    assert_eq!(stats.available, (ITEMS - CLAIMANTS) as i64);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_used_fields_invariant_is_enforced(pool: PgPool) {
    seed(&pool, &codes("RR", 1)).await;

    let result = sqlx::query("UPDATE barcode_items SET status_id = $1")
        .bind(BarcodeItemStatus::Used.id())
        .execute(&pool)
        .await;
    assert!(tracecode_db::errors::is_check_violation(&result.unwrap_err()));
}

// ---------------------------------------------------------------------------
// Test: inserts and uniqueness
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_insert_rejects_whole_chunk_on_collision(pool: PgPool) {
    seed(&pool, &["RR000001VN".to_string()]).await;

    let chunk = vec!["RR000002VN".to_string(), "rr000001vn".to_string()];
    let err = BarcodeItemRepo::insert_batch(&pool, &chunk, Uuid::now_v7(), "b.csv")
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err));

    // Nothing from the failed chunk landed.
    assert!(BarcodeItemRepo::find_by_code(&pool, "RR000002VN")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_insert_one_reports_conflicts(pool: PgPool) {
    let batch_id = Uuid::now_v7();
    assert!(BarcodeItemRepo::insert_one(&pool, "EB123456", batch_id, "one.csv")
        .await
        .unwrap());
    assert!(!BarcodeItemRepo::insert_one(&pool, "eb123456", batch_id, "one.csv")
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_existing_keys_is_case_insensitive(pool: PgPool) {
    seed(&pool, &["AB123456".to_string(), "CD123456".to_string()]).await;

    let probe = vec![
        "ab123456".to_string(),
        "ZZ999999".to_string(),
        "Cd123456".to_string(),
    ];
    let existing = BarcodeItemRepo::find_existing_keys(&pool, &probe).await.unwrap();
    assert_eq!(existing.len(), 2);
    assert!(existing.contains("AB123456"));
    assert!(existing.contains("CD123456"));

    assert!(BarcodeItemRepo::find_existing_keys(&pool, &[])
        .await
        .unwrap()
        .is_empty());
}

// ---------------------------------------------------------------------------
// Test: read-only queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_scopes(pool: PgPool) {
    let all = codes("RR", 4);
    seed(&pool, &all).await;
    BarcodeItemRepo::claim_next(&pool, Some("ORD-1")).await.unwrap();
    assert!(BarcodeItemRepo::disable(&pool, &all[2]).await.unwrap());

    let remaining = BarcodeItemRepo::export_rows(&pool, ExportScope::Remaining)
        .await
        .unwrap();
    let remaining_codes: Vec<&str> = remaining.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(remaining_codes, vec![all[1].as_str(), all[3].as_str()]);

    let snapshot = BarcodeItemRepo::export_rows(&pool, ExportScope::Snapshot)
        .await
        .unwrap();
    assert_eq!(snapshot.len(), 4);
    assert!(snapshot.windows(2).all(|w| w[0].id < w[1].id));
    assert_eq!(snapshot[0].status(), Some(BarcodeItemStatus::Used));
    assert_eq!(snapshot[2].status(), Some(BarcodeItemStatus::Disabled));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stats_counts_each_state(pool: PgPool) {
    let all = codes("RR", 5);
    seed(&pool, &all).await;
    BarcodeItemRepo::claim_next(&pool, Some("ORD-1")).await.unwrap();
    BarcodeItemRepo::claim_next(&pool, Some("ORD-2")).await.unwrap();
    BarcodeItemRepo::disable(&pool, &all[4]).await.unwrap();

    let stats = BarcodeItemRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.available, 2);
    assert_eq!(stats.used, 2);
    assert_eq!(stats.disabled, 1);
    assert_eq!(stats.used_today, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_used_today_excludes_older_claims(pool: PgPool) {
    seed(&pool, &codes("RR", 2)).await;
    let first = BarcodeItemRepo::claim_next(&pool, Some("ORD-1")).await.unwrap().unwrap();
    BarcodeItemRepo::claim_next(&pool, Some("ORD-2")).await.unwrap();

    sqlx::query("UPDATE barcode_items SET used_at = NOW() - INTERVAL '3 days' WHERE id = $1")
        .bind(first.id)
        .execute(&pool)
        .await
        .unwrap();

    let stats = BarcodeItemRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.used, 2);
    assert_eq!(stats.used_today, 1);
}

// ---------------------------------------------------------------------------
// Test: administrative operations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_disable_only_touches_available_items(pool: PgPool) {
    let all = codes("RR", 2);
    seed(&pool, &all).await;
    let used = BarcodeItemRepo::claim_next(&pool, Some("ORD-1")).await.unwrap().unwrap();

    assert!(!BarcodeItemRepo::disable(&pool, &used.code).await.unwrap());
    assert!(BarcodeItemRepo::disable(&pool, &all[1].to_lowercase()).await.unwrap());
    assert!(!BarcodeItemRepo::disable(&pool, &all[1]).await.unwrap());
    assert!(!BarcodeItemRepo::disable(&pool, "MISSING01").await.unwrap());

    // A disabled item is never claimed.
    assert!(BarcodeItemRepo::claim_next(&pool, None).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_purge_used_respects_cutoff(pool: PgPool) {
    seed(&pool, &codes("RR", 3)).await;
    let old = BarcodeItemRepo::claim_next(&pool, Some("ORD-1")).await.unwrap().unwrap();
    BarcodeItemRepo::claim_next(&pool, Some("ORD-2")).await.unwrap();

    sqlx::query("UPDATE barcode_items SET used_at = NOW() - INTERVAL '40 days' WHERE id = $1")
        .bind(old.id)
        .execute(&pool)
        .await
        .unwrap();

    let cutoff = chrono::Utc::now() - chrono::Duration::days(30);
    assert_eq!(BarcodeItemRepo::purge_used(&pool, Some(cutoff)).await.unwrap(), 1);
    assert_eq!(BarcodeItemRepo::purge_used(&pool, None).await.unwrap(), 1);

    let stats = BarcodeItemRepo::stats(&pool).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.available, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_batches(pool: PgPool) {
    let first = seed(&pool, &codes("AA", 3)).await;
    let second = seed(&pool, &codes("BB", 2)).await;
    BarcodeItemRepo::claim_next(&pool, Some("ORD-1")).await.unwrap();

    let batches = BarcodeItemRepo::list_batches(&pool).await.unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].batch_id, second);
    assert_eq!(batches[0].total, 2);
    assert_eq!(batches[1].batch_id, first);
    assert_eq!(batches[1].used, 1);
    assert_eq!(batches[1].available, 2);
    assert_eq!(batches[1].source, "seed.xlsx");
}
