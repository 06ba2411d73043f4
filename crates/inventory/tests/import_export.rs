//! Integration tests for bulk import and export of the pool inventory.

use std::time::Duration;

use assert_matches::assert_matches;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracecode_core::export::{ExportFormat, ExportScope};
use tracecode_core::sheet::read_sheet;
use tracecode_db::models::status::BarcodeItemStatus;
use tracecode_db::repositories::BarcodeItemRepo;
use tracecode_inventory::{
    BarcodeAllocator, ExportError, ExportRequest, ImportError, InventoryExporter,
    InventoryImporter, PoolInventoryStore,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn csv_with_header(codes: &[String]) -> Vec<u8> {
    let mut text = String::from("STT,Barcode,Note\n");
    for (i, code) in codes.iter().enumerate() {
        text.push_str(&format!("{},{code},\n", i + 1));
    }
    text.into_bytes()
}

fn codes(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{prefix}{i:06}VN")).collect()
}

async fn import(pool: &PgPool, bytes: &[u8]) -> tracecode_core::importer::ImportResult {
    InventoryImporter::new(pool.clone())
        .import(bytes, "upload.csv", &CancellationToken::new())
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test: import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_counts_existing_codes(pool: PgPool) {
    let all = codes("RR", 10);
    import(&pool, &csv_with_header(&all[..3])).await;

    let result = import(&pool, &csv_with_header(&all)).await;
    assert_eq!(result.rows_read, 10);
    assert_eq!(result.valid_barcodes, 10);
    assert_eq!(result.added, 7);
    assert_eq!(result.already_exists, 3);
    assert_eq!(result.invalid, 0);
    assert_eq!(result.column, 1);
    assert_eq!(result.header_row, Some(0));
    assert!(result.warnings.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_rejects_malformed_values(pool: PgPool) {
    let text = "Barcode\nRR000001VN\nabc\nRR@00002VN\nrr000001vn\nRR000003VN\n";
    let result = import(&pool, text.as_bytes()).await;

    assert_eq!(result.rows_read, 5);
    assert_eq!(result.invalid, 2);
    assert_eq!(result.sample_invalid, vec!["abc", "RR@00002VN"]);
    assert_eq!(result.duplicates_in_file, 1);
    assert_eq!(result.added, 2);
    assert_eq!(result.already_exists, 0);
    assert_eq!(result.added + result.already_exists, result.valid_barcodes);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_preserves_file_order_and_batch(pool: PgPool) {
    let text = "ZZ000001VN\nAA000001VN\nMM000001VN\n";
    let result = import(&pool, text.as_bytes()).await;
    assert_eq!(result.header_row, None);
    assert_eq!(result.warnings.len(), 1);

    let rows = BarcodeItemRepo::export_rows(&pool, ExportScope::All)
        .await
        .unwrap();
    let order: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(order, vec!["ZZ000001VN", "AA000001VN", "MM000001VN"]);
    assert!(rows.iter().all(|r| r.batch_id == result.batch_id));
    assert!(rows.iter().all(|r| r.source == "upload.csv"));
    assert!(rows.iter().all(|r| r.status() == Some(BarcodeItemStatus::Available)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_headerless_import_keeps_codes_containing_header_words(pool: PgPool) {
    let text = "RR000001VN\nRR000002VN\nQRCODE0003\nRR000004VN\n";
    let result = import(&pool, text.as_bytes()).await;

    assert_eq!(result.header_row, None);
    assert_eq!(result.rows_read, 4);
    assert_eq!(result.added, 4);
    assert!(BarcodeItemRepo::find_by_code(&pool, "QRCODE0003")
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_codes_above_header_are_reported(pool: PgPool) {
    let text = "RR000001VN\nBarcode\nRR000002VN\n";
    let result = import(&pool, text.as_bytes()).await;

    assert_eq!(result.header_row, Some(1));
    assert_eq!(result.added, 1);
    assert_eq!(result.warnings.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_chunk_collision_falls_back_to_row_inserts(pool: PgPool) {
    // Another writer holds an uncommitted insert of one of the file's codes,
    // so the existence check misses it and the chunk insert blocks on it.
    let mut other = pool.begin().await.unwrap();
    sqlx::query(
        "INSERT INTO barcode_items (code, status_id, batch_id, source) \
         VALUES ($1, $2, $3, 'other.csv')",
    )
    .bind("RR000002VN")
    .bind(BarcodeItemStatus::Available.id())
    .bind(uuid::Uuid::now_v7())
    .execute(&mut *other)
    .await
    .unwrap();

    let importer = InventoryImporter::new(pool.clone());
    let handle = tokio::spawn(async move {
        let bytes = csv_with_header(&codes("RR", 3));
        let cancel = CancellationToken::new();
        let result = importer.import(&bytes, "race.csv", &cancel).await;
        result
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    other.commit().await.unwrap();

    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.added, 2);
    assert_eq!(result.already_exists, 1);

    let winner = BarcodeItemRepo::find_by_code(&pool, "RR000002VN")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(winner.source, "other.csv");
    let stats = PoolInventoryStore::new(pool.clone()).stats().await.unwrap();
    assert_eq!(stats.total, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_spans_multiple_chunks(pool: PgPool) {
    let all = codes("EA", 25);
    import(&pool, &csv_with_header(&all[10..12])).await;

    let result = InventoryImporter::new(pool.clone())
        .with_chunk_size(4)
        .import(&csv_with_header(&all), "big.csv", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.added, 23);
    assert_eq!(result.already_exists, 2);

    let stats = PoolInventoryStore::new(pool.clone()).stats().await.unwrap();
    assert_eq!(stats.total, 25);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_reads_xlsx_numeric_cells(pool: PgPool) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Mã vạch").unwrap();
    sheet.write_number(1, 0, 123456789012.0).unwrap();
    sheet.write_string(2, 0, "RR000001VN").unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let result = InventoryImporter::new(pool.clone())
        .import(&bytes, "handoff.xlsx", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.added, 2);
    assert!(BarcodeItemRepo::find_by_code(&pool, "123456789012")
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_of_used_codes_does_not_resurrect(pool: PgPool) {
    let all = codes("RR", 2);
    import(&pool, &csv_with_header(&all)).await;
    let allocator = BarcodeAllocator::new(pool.clone());
    let used = allocator
        .allocate(Some("ORD-1"), &CancellationToken::new())
        .await
        .unwrap();

    let result = import(&pool, &csv_with_header(&all)).await;
    assert_eq!(result.already_exists, 2);

    let item = BarcodeItemRepo::find_by_code(&pool, &used).await.unwrap().unwrap();
    assert_eq!(item.status(), Some(BarcodeItemStatus::Used));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancelled_import_returns_partial_result(pool: PgPool) {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = InventoryImporter::new(pool.clone())
        .import(&csv_with_header(&codes("RR", 5)), "x.csv", &cancel)
        .await
        .unwrap_err();
    let partial = assert_matches!(err, ImportError::Cancelled(partial) => partial);
    assert_eq!(partial.added, 0);
    assert_eq!(partial.valid_barcodes, 5);

    let stats = PoolInventoryStore::new(pool.clone()).stats().await.unwrap();
    assert_eq!(stats.total, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_without_table_is_infrastructure(pool: PgPool) {
    sqlx::query("DROP TABLE barcode_items")
        .execute(&pool)
        .await
        .unwrap();

    let err = InventoryImporter::new(pool.clone())
        .import(b"RR000001VN\n", "x.csv", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::Infrastructure(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unreadable_workbook(pool: PgPool) {
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend_from_slice(&[0u8; 64]);

    let err = InventoryImporter::new(pool.clone())
        .import(&bytes, "broken.xlsx", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_matches!(err, ImportError::Unreadable(_));
}

// ---------------------------------------------------------------------------
// Test: export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_snapshot_export_reimports_as_existing(pool: PgPool) {
    let all = codes("RR", 6);
    import(&pool, &csv_with_header(&all)).await;
    BarcodeAllocator::new(pool.clone())
        .allocate(Some("ORD-1"), &CancellationToken::new())
        .await
        .unwrap();

    let exporter = InventoryExporter::new(pool.clone(), "barcodes");
    for format in [ExportFormat::Csv, ExportFormat::Xlsx] {
        let file = exporter
            .export(
                &ExportRequest {
                    scope: ExportScope::Snapshot,
                    format,
                    include_header: false,
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(file.rows, 6);
        assert!(file.file_name.starts_with("barcodes_snapshot_"));
        assert!(file.file_name.ends_with(format.extension()));

        let result = import(&pool, &file.bytes).await;
        assert_eq!(result.added, 0);
        assert_eq!(result.already_exists, 6);
        assert_eq!(result.invalid, 0);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_remaining_export_excludes_used(pool: PgPool) {
    let all = codes("RR", 3);
    import(&pool, &csv_with_header(&all)).await;
    let used = BarcodeAllocator::new(pool.clone())
        .allocate(None, &CancellationToken::new())
        .await
        .unwrap();

    let file = InventoryExporter::new(pool.clone(), "handoff")
        .export(
            &ExportRequest {
                scope: ExportScope::Remaining,
                format: ExportFormat::Csv,
                include_header: false,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let rows = read_sheet(&file.bytes).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r[0] != used));
    assert_eq!(file.content_type, "text/csv; charset=utf-8");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_never_mutates(pool: PgPool) {
    import(&pool, &csv_with_header(&codes("RR", 4))).await;
    let store = PoolInventoryStore::new(pool.clone());
    let before = store.stats().await.unwrap();

    InventoryExporter::new(pool.clone(), "barcodes")
        .export(
            &ExportRequest {
                scope: ExportScope::All,
                format: ExportFormat::Xlsx,
                include_header: true,
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(store.stats().await.unwrap(), before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancelled_export(pool: PgPool) {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = InventoryExporter::new(pool.clone(), "barcodes")
        .export(
            &ExportRequest {
                scope: ExportScope::All,
                format: ExportFormat::Csv,
                include_header: true,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ExportError::Cancelled);
}

// ---------------------------------------------------------------------------
// Test: administrative store operations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_disable_and_list_batches(pool: PgPool) {
    let all = codes("RR", 3);
    let result = import(&pool, &csv_with_header(&all)).await;
    let store = PoolInventoryStore::new(pool.clone());

    assert!(store.disable(&all[0]).await.unwrap());
    assert!(!store.disable(&all[0]).await.unwrap());

    // The disabled first item is skipped by allocation.
    let code = BarcodeAllocator::new(pool.clone())
        .allocate(None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(code, all[1]);

    let batches = store.list_batches().await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_id, result.batch_id);
    assert_eq!(batches[0].disabled, 1);
    assert_eq!(batches[0].used, 1);
    assert_eq!(batches[0].available, 1);

    assert_eq!(store.purge_used(None).await.unwrap(), 1);
}
