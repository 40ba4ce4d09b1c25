use std::time::Duration;

use grid_model::{
    CellValue, ColumnId, ColumnKind, Filter, FilterCriterion, NumberComparison, RowId, Sort,
    TableId, ViewConfig, ViewId,
};
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
    ViewId,
    Vec<RowId>,
) {
    let backend = MemoryBackend::new();
    let table = backend.create_table("Scores");
    let points = backend
        .seed_column(table, "Points", ColumnKind::Number)
        .expect("seed column");
    let rows = backend.seed_rows(table, 6).expect("seed rows");
    for (i, row) in rows.iter().enumerate() {
        backend
            .seed_cell(*row, points, CellValue::number(i as f64 * 10.0))
            .expect("seed cell");
    }
    let view = backend.seed_view(table, "All").expect("seed view");
    let session = TableSession::open(backend.clone(), table, config())
        .await
        .expect("open session");
    (backend, session, table, points, view, rows)
}

fn above_25_descending(points: ColumnId) -> ViewConfig {
    ViewConfig {
        filters: vec![Filter {
            column_id: points,
            criterion: FilterCriterion::Number(NumberComparison::GreaterThan(25.0)),
        }],
        sorts: vec![Sort {
            column_id: points,
            descending: true,
        }],
        hidden: Vec::new(),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn rapid_config_edits_coalesce_to_one_write() {
    let (backend, session, table, points, view, _rows) = seeded().await;

    let config = above_25_descending(points);
    session
        .set_view_config(view, config.clone())
        .expect("set config");
    session
        .set_view_config(view, config.clone())
        .expect("set config again");

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(backend.op_count("update_view_config"), 1);
    let server = backend.table_snapshot(table).expect("table");
    assert_eq!(server.view(view).expect("view").config, config);
}

#[tokio::test(flavor = "current_thread")]
async fn unchanged_config_issues_no_write() {
    let (backend, session, _table, _points, view, _rows) = seeded().await;

    // The loaded configuration counts as already persisted; saving an
    // identical one schedules nothing.
    session
        .set_view_config(view, ViewConfig::default())
        .expect("set config");

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(backend.op_count("update_view_config"), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn resaving_a_persisted_config_issues_no_second_write() {
    let (backend, session, _table, points, view, _rows) = seeded().await;

    let config = above_25_descending(points);
    session
        .set_view_config(view, config.clone())
        .expect("set config");
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(backend.op_count("update_view_config"), 1);

    // Reopening the editor and saving the same configuration again.
    session.set_view_config(view, config).expect("resave");
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(backend.op_count("update_view_config"), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn rows_for_view_applies_filters_and_sorts() {
    let (_backend, session, _table, points, view, rows) = seeded().await;

    session
        .set_view_config(view, above_25_descending(points))
        .expect("set config");

    let visible = session.rows_for_view(view).expect("view rows");
    let ids: Vec<RowId> = visible.iter().map(|r| r.id).collect();
    // Points 50, 40, 30 pass the > 25 filter, descending.
    assert_eq!(ids, vec![rows[5], rows[4], rows[3]]);
}

#[tokio::test(flavor = "current_thread")]
async fn create_view_commits_and_persists_config() {
    let (backend, session, table, points, _view, _rows) = seeded().await;

    let id = session.create_view("Top scores").await.expect("create view");
    assert!(!id.is_temporary());

    let config = above_25_descending(points);
    session
        .set_view_config(id, config.clone())
        .expect("set config");
    tokio::time::sleep(Duration::from_millis(80)).await;

    let server = backend.table_snapshot(table).expect("table");
    let persisted = server.view(id).expect("view");
    assert_eq!(persisted.name, "Top scores");
    assert_eq!(persisted.config, config);
}

#[tokio::test(flavor = "current_thread")]
async fn rename_view_rolls_back_on_failure() {
    let (backend, session, _table, _points, view, _rows) = seeded().await;
    let before = session.views();

    backend.fail_next("rename_view", SyncError::Timeout);
    session
        .rename_view(view, "Renamed")
        .await
        .expect_err("injected failure");

    assert_eq!(session.views(), before);
}

#[tokio::test(flavor = "current_thread")]
async fn deleted_view_cannot_be_configured() {
    let (backend, session, table, points, view, _rows) = seeded().await;

    session.delete_view(view).await.expect("delete view");
    assert!(session.views().is_empty());
    let server = backend.table_snapshot(table).expect("table");
    assert!(server.view(view).is_none());

    let err = session
        .set_view_config(view, above_25_descending(points))
        .expect_err("view is gone");
    assert!(matches!(err, SyncError::Store(_)));
}
