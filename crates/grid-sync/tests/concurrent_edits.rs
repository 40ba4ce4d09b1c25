use std::time::Duration;

use grid_model::{CellValue, ColumnId, ColumnKind, RowId, TableId};
use grid_sync::{MemoryBackend, SessionConfig, SyncError, TableSession};
use pretty_assertions::assert_eq;

fn config() -> SessionConfig {
    SessionConfig {
        page_size: 100,
        prefetch_lookahead: 50,
        persist_debounce: Duration::from_millis(20),
    }
}

async fn seeded() -> (
    MemoryBackend,
    TableSession<MemoryBackend>,
    TableId,
    ColumnId,
    Vec<RowId>,
) {
    let backend = MemoryBackend::new();
    let table = backend.create_table("Ledger");
    let amount = backend
        .seed_column(table, "Amount", ColumnKind::Number)
        .expect("seed column");
    let rows = backend.seed_rows(table, 5).expect("seed rows");
    for (i, row) in rows.iter().enumerate() {
        backend
            .seed_cell(*row, amount, CellValue::number(i as f64))
            .expect("seed cell");
    }
    let session = TableSession::open(backend.clone(), table, config())
        .await
        .expect("open session");
    (backend, session, table, amount, rows)
}

#[tokio::test(flavor = "current_thread")]
async fn failed_edit_reverts_only_its_own_cell() {
    let (backend, session, _table, amount, rows) = seeded().await;

    backend.set_latency(Duration::from_millis(20));
    // The first dispatched update fails; the second lands.
    backend.fail_next("update_cell", SyncError::Conflict);

    let (first, second) = tokio::join!(
        session.update_cell(rows[0], amount, CellValue::number(100.0)),
        session.update_cell(rows[1], amount, CellValue::number(200.0)),
    );
    assert!(matches!(first, Err(SyncError::Conflict)));
    second.expect("second edit lands");

    // The failed edit rolled back to its pre-edit value without disturbing
    // the concurrent successful edit.
    assert_eq!(
        session.cell(rows[0], amount).expect("cell").value,
        CellValue::number(0.0)
    );
    assert_eq!(
        session.cell(rows[1], amount).expect("cell").value,
        CellValue::number(200.0)
    );
}

#[tokio::test(flavor = "current_thread")]
async fn fetch_raced_by_insert_is_discarded() {
    let (backend, session, table, _amount, _rows) = seeded().await;

    backend.set_latency(Duration::from_millis(30));
    // The page fetch starts under the pre-insert epoch; the insert bumps it,
    // so the fetch result (a snapshot without the new row) must be dropped
    // rather than merged over the speculative insert.
    let (refetch, inserted) = tokio::join!(session.load_page(0), session.insert_row_at(0));
    refetch.expect("page fetch itself succeeds");
    let inserted = inserted.expect("insert lands");

    let local: Vec<RowId> = session.rows().iter().map(|r| r.id).collect();
    let server = backend.table_snapshot(table).expect("table");
    let server_ids: Vec<RowId> = server.rows().iter().map(|r| r.id).collect();
    assert_eq!(local, server_ids);
    assert_eq!(local[0], inserted);
    assert_eq!(session.rows().len(), 6);
    for (i, row) in session.rows().iter().enumerate() {
        assert_eq!(row.position, i as u32);
    }
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_inserts_converge_on_server_order() {
    let (backend, session, table, _amount, _rows) = seeded().await;

    backend.set_latency(Duration::from_millis(15));
    let (a, b) = tokio::join!(session.insert_row_at(0), session.insert_row_at(2));
    let a = a.expect("first insert");
    let b = b.expect("second insert");
    assert!(!a.is_temporary());
    assert!(!b.is_temporary());

    let rows = session.rows();
    assert_eq!(rows.len(), 7);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.position, i as u32);
    }
    let server = backend.table_snapshot(table).expect("table");
    let server_ids: Vec<RowId> = server.rows().iter().map(|r| r.id).collect();
    let local: Vec<RowId> = rows.iter().map(|r| r.id).collect();
    assert_eq!(local, server_ids);
}
