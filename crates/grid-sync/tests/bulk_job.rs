use std::time::Duration;

use grid_model::{ColumnKind, TableId};
use grid_sync::{JobStatus, MemoryBackend, SessionConfig, SyncError, TableSession};
use pretty_assertions::assert_eq;

const POLL: Duration = Duration::from_millis(10);

fn config() -> SessionConfig {
    SessionConfig {
        page_size: 100,
        prefetch_lookahead: 50,
        persist_debounce: Duration::from_millis(20),
    }
}

async fn empty_table() -> (MemoryBackend, TableSession<MemoryBackend>, TableId) {
    let backend = MemoryBackend::new();
    let table = backend.create_table("Import");
    backend
        .seed_column(table, "Value", ColumnKind::Number)
        .expect("seed column");
    let session = TableSession::open(backend.clone(), table, config())
        .await
        .expect("open session");
    (backend, session, table)
}

#[tokio::test(flavor = "current_thread")]
async fn bulk_append_completes_and_refetches_from_scratch() {
    let (backend, session, table) = empty_table().await;

    let status = session
        .bulk_append(100_000, 10_000, POLL)
        .await
        .expect("bulk append");

    assert_eq!(status.status, JobStatus::Done);
    assert_eq!(status.inserted, 100_000);
    assert_eq!(backend.server_row_count(table), 100_000);
    assert!(!session.bulk_running());
    assert_eq!(session.bulk_progress(), 0.0);
    // The cache was dropped and only the first page refetched.
    assert_eq!(session.loaded_row_count(), 100);
    for (i, row) in session.rows().iter().enumerate() {
        assert_eq!(row.position, i as u32);
    }
}

#[tokio::test(flavor = "current_thread")]
async fn bulk_progress_is_monotone_while_running() {
    let (_backend, session, _table) = empty_table().await;

    let run = session.bulk_append(2_000, 100, POLL);
    let sample = async {
        let mut samples = Vec::new();
        let mut seen_running = false;
        loop {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if session.bulk_running() {
                seen_running = true;
                samples.push(session.bulk_progress());
            } else if seen_running || samples.len() > 1_000 {
                break;
            }
        }
        samples
    };
    let (status, samples) = tokio::join!(run, sample);
    let status = status.expect("bulk append");

    assert_eq!(status.status, JobStatus::Done);
    assert!(!samples.is_empty());
    for pair in samples.windows(2) {
        assert!(pair[0] <= pair[1], "progress moved backwards: {pair:?}");
    }
    for p in &samples {
        assert!((0.0..=1.0).contains(p));
    }
}

#[tokio::test(flavor = "current_thread")]
async fn second_job_is_rejected_while_one_runs() {
    let (_backend, session, _table) = empty_table().await;

    let first = session.bulk_append(1_000, 100, POLL);
    let second = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.bulk_append(10, 5, POLL).await
    };
    let (first, second) = tokio::join!(first, second);

    first.expect("first job completes");
    assert!(matches!(second, Err(SyncError::ValidationFailed(_))));
}

#[tokio::test(flavor = "current_thread")]
async fn simultaneous_starts_admit_exactly_one_job() {
    let (backend, session, table) = empty_table().await;
    // Latency keeps the first start request in flight while the second lands.
    backend.set_latency(Duration::from_millis(30));

    let (a, b) = tokio::join!(
        session.bulk_append(100, 10, POLL),
        session.bulk_append(100, 10, POLL),
    );

    let accepted = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(accepted, 1, "exactly one start may claim the job slot");
    let rejected = if a.is_err() { a } else { b };
    assert!(matches!(rejected, Err(SyncError::ValidationFailed(_))));
    assert_eq!(backend.op_count("start_bulk_insert"), 1);
    assert_eq!(backend.server_row_count(table), 100);
}

#[tokio::test(flavor = "current_thread")]
async fn failed_start_releases_the_slot() {
    let (backend, session, table) = empty_table().await;
    backend.fail_next(
        "start_bulk_insert",
        SyncError::Network("connection reset".into()),
    );

    let err = session.bulk_append(50, 10, POLL).await.expect_err("start fails");
    assert!(matches!(err, SyncError::Network(_)));
    assert!(!session.bulk_running());

    let status = session.bulk_append(50, 10, POLL).await.expect("retry succeeds");
    assert_eq!(status.status, JobStatus::Done);
    assert_eq!(backend.server_row_count(table), 50);
}

#[tokio::test(flavor = "current_thread")]
async fn failed_job_surfaces_error_and_resets() {
    let (backend, session, table) = empty_table().await;
    backend.fail_bulk_after(2, "disk full");

    let err = session
        .bulk_append(1_000, 100, POLL)
        .await
        .expect_err("job aborts");

    assert!(matches!(err, SyncError::JobFailed(message) if message == "disk full"));
    assert!(!session.bulk_running());
    assert_eq!(session.bulk_progress(), 0.0);
    // Rows the job inserted before aborting are only trusted via refetch.
    assert_eq!(backend.server_row_count(table), 200);
    assert_eq!(session.loaded_row_count(), 100);
}

#[tokio::test(flavor = "current_thread")]
async fn zero_total_job_settles_immediately() {
    let (backend, session, table) = empty_table().await;

    let status = session.bulk_append(0, 100, POLL).await.expect("bulk append");

    assert_eq!(status.status, JobStatus::Done);
    assert_eq!(status.inserted, 0);
    assert_eq!(status.percent(), 0.0);
    assert_eq!(backend.server_row_count(table), 0);
}
