use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use grid_model::{
    Cell, CellValue, Column, ColumnId, ColumnKind, EntityStore, JobId, Row, RowId, StoreError,
    TableId, TableMeta, View, ViewConfig, ViewId,
};
use uuid::Uuid;

use crate::client::{BulkJobStatus, GridClient, JobStatus, RowPage, MAX_PAGE_SIZE};
use crate::error::{Result, SyncError};

/// Per-batch pacing of the simulated bulk insert worker.
const BULK_BATCH_DELAY: Duration = Duration::from_millis(5);

#[derive(Debug, Clone)]
struct JobState {
    status: JobStatus,
    inserted: u64,
    total: u64,
    error: Option<String>,
}

struct Backend {
    tables: HashMap<TableId, EntityStore>,
    jobs: HashMap<JobId, JobState>,
    /// Failures to inject, queued per operation name.
    fail_next: HashMap<&'static str, VecDeque<SyncError>>,
    /// How many times each operation was called.
    op_counts: HashMap<&'static str, u64>,
    latency: Duration,
    /// Abort bulk jobs after this many batches.
    bulk_fail_after: Option<(u64, String)>,
}

/// In-memory [`GridClient`] for tests and offline development.
///
/// Holds authoritative table state behind the same request semantics a real
/// transport would expose: committed ids only, pages capped at
/// [`MAX_PAGE_SIZE`], bulk inserts running on a background task. Tests can
/// count calls per operation, inject failures for the next call of an
/// operation, and add artificial latency to widen race windows.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Backend>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Backend {
                tables: HashMap::new(),
                jobs: HashMap::new(),
                fail_next: HashMap::new(),
                op_counts: HashMap::new(),
                latency: Duration::ZERO,
                bulk_fail_after: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.inner.lock().expect("backend mutex poisoned")
    }

    /// Count the call, pop any injected failure, then sleep out the
    /// configured latency. Every trait method passes through here first.
    async fn gate(&self, op: &'static str) -> Result<()> {
        let (latency, injected) = {
            let mut inner = self.lock();
            *inner.op_counts.entry(op).or_insert(0) += 1;
            let injected = inner.fail_next.get_mut(op).and_then(VecDeque::pop_front);
            (inner.latency, injected)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match injected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // ---- test configuration -----------------------------------------------

    /// Artificial per-request delay, applied after counting the call.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Fail the next call of `op` with `err`. Queued failures apply in order,
    /// one per call.
    pub fn fail_next(&self, op: &'static str, err: SyncError) {
        self.lock().fail_next.entry(op).or_default().push_back(err);
    }

    /// Abort any bulk job after it has completed `batches` batches.
    pub fn fail_bulk_after(&self, batches: u64, message: impl Into<String>) {
        self.lock().bulk_fail_after = Some((batches, message.into()));
    }

    /// How many times `op` has been called.
    pub fn op_count(&self, op: &'static str) -> u64 {
        self.lock().op_counts.get(op).copied().unwrap_or(0)
    }

    // ---- seeding ------------------------------------------------------------

    pub fn create_table(&self, name: impl Into<String>) -> TableId {
        let id = TableId::new();
        self.lock()
            .tables
            .insert(id, EntityStore::new(TableMeta::new(id, name)));
        id
    }

    /// Append a column, back-filling null cells for existing rows.
    pub fn seed_column(&self, table: TableId, name: &str, kind: ColumnKind) -> Result<ColumnId> {
        let mut inner = self.lock();
        let store = inner.tables.get_mut(&table).ok_or(SyncError::NotFound)?;
        let at = store.column_count();
        let column = store
            .insert_column_at(ColumnId::committed(Uuid::new_v4()), at, name, kind)
            .map_err(server_err)?;
        Ok(column.id)
    }

    /// Append `count` empty rows.
    pub fn seed_rows(&self, table: TableId, count: u32) -> Result<Vec<RowId>> {
        let mut inner = self.lock();
        let store = inner.tables.get_mut(&table).ok_or(SyncError::NotFound)?;
        let mut ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let at = store.row_count();
            ids.push(store.insert_row_at(RowId::committed(Uuid::new_v4()), at).id);
        }
        Ok(ids)
    }

    pub fn seed_cell(&self, row: RowId, column: ColumnId, value: CellValue) -> Result<()> {
        let mut inner = self.lock();
        let store = inner.store_for_row(row)?;
        store.write_cell(row, column, value).map_err(server_err)?;
        Ok(())
    }

    pub fn seed_view(&self, table: TableId, name: &str) -> Result<ViewId> {
        let mut inner = self.lock();
        let store = inner.tables.get_mut(&table).ok_or(SyncError::NotFound)?;
        let view = View::new(ViewId::committed(Uuid::new_v4()), table, name);
        let id = view.id;
        store.insert_view(view);
        Ok(id)
    }

    /// Clone of the authoritative state for assertions.
    pub fn table_snapshot(&self, table: TableId) -> Option<EntityStore> {
        self.lock().tables.get(&table).cloned()
    }

    pub fn server_row_count(&self, table: TableId) -> u32 {
        self.lock()
            .tables
            .get(&table)
            .map(EntityStore::row_count)
            .unwrap_or(0)
    }
}

impl Backend {
    fn store(&mut self, table: TableId) -> Result<&mut EntityStore> {
        self.tables.get_mut(&table).ok_or(SyncError::NotFound)
    }

    fn store_for_column(&mut self, column: ColumnId) -> Result<&mut EntityStore> {
        self.tables
            .values_mut()
            .find(|s| s.column(column).is_some())
            .ok_or(SyncError::NotFound)
    }

    fn store_for_row(&mut self, row: RowId) -> Result<&mut EntityStore> {
        self.tables
            .values_mut()
            .find(|s| s.row(row).is_some())
            .ok_or(SyncError::NotFound)
    }

    fn store_for_view(&mut self, view: ViewId) -> Result<&mut EntityStore> {
        self.tables
            .values_mut()
            .find(|s| s.view(view).is_some())
            .ok_or(SyncError::NotFound)
    }
}

/// Map a store failure onto the wire taxonomy: missing entities read as
/// `NotFound`, everything else as a validation rejection.
fn server_err(err: StoreError) -> SyncError {
    match err {
        StoreError::ColumnNotFound(_)
        | StoreError::RowNotFound(_)
        | StoreError::ViewNotFound(_)
        | StoreError::CellNotFound { .. } => SyncError::NotFound,
        StoreError::KindMismatch { .. } | StoreError::Column(_) => {
            SyncError::ValidationFailed(err.to_string())
        }
    }
}

impl GridClient for MemoryBackend {
    fn get_table(&self, table: TableId) -> impl Future<Output = Result<TableMeta>> + Send {
        async move {
            self.gate("get_table").await?;
            let mut inner = self.lock();
            Ok(inner.store(table)?.table().clone())
        }
    }

    fn rename_table(&self, table: TableId, name: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("rename_table").await?;
            let mut inner = self.lock();
            inner.store(table)?.rename_table(name);
            Ok(())
        }
    }

    fn set_table_starred(
        &self,
        table: TableId,
        starred: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("set_table_starred").await?;
            let mut inner = self.lock();
            inner.store(table)?.set_starred(starred);
            Ok(())
        }
    }

    fn list_columns(&self, table: TableId) -> impl Future<Output = Result<Vec<Column>>> + Send {
        async move {
            self.gate("list_columns").await?;
            let mut inner = self.lock();
            Ok(inner.store(table)?.columns().to_vec())
        }
    }

    fn add_column(
        &self,
        table: TableId,
        name: &str,
        kind: ColumnKind,
        position: Option<u32>,
    ) -> impl Future<Output = Result<Column>> + Send {
        async move {
            self.gate("add_column").await?;
            let mut inner = self.lock();
            let store = inner.store(table)?;
            let at = position.unwrap_or(store.column_count());
            let column = store
                .insert_column_at(ColumnId::committed(Uuid::new_v4()), at, name, kind)
                .map_err(server_err)?;
            Ok(column.clone())
        }
    }

    fn rename_column(&self, column: ColumnId, name: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("rename_column").await?;
            let mut inner = self.lock();
            let store = inner.store_for_column(column)?;
            store.rename_column(column, name).map_err(server_err)
        }
    }

    fn set_column_kind(
        &self,
        column: ColumnId,
        kind: ColumnKind,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("set_column_kind").await?;
            let mut inner = self.lock();
            let store = inner.store_for_column(column)?;
            store.set_column_kind(column, kind).map_err(server_err)
        }
    }

    fn set_column_width(
        &self,
        column: ColumnId,
        width: u32,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("set_column_width").await?;
            let mut inner = self.lock();
            let store = inner.store_for_column(column)?;
            store.set_column_width(column, width).map_err(server_err)
        }
    }

    fn delete_column(&self, column: ColumnId) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("delete_column").await?;
            let mut inner = self.lock();
            let store = inner.store_for_column(column)?;
            store.delete_column(column).map_err(server_err)?;
            Ok(())
        }
    }

    fn list_rows(
        &self,
        table: TableId,
        skip: u32,
        take: u32,
    ) -> impl Future<Output = Result<RowPage>> + Send {
        async move {
            self.gate("list_rows").await?;
            if take > MAX_PAGE_SIZE {
                return Err(SyncError::ValidationFailed(format!(
                    "page size {take} exceeds the maximum of {MAX_PAGE_SIZE}"
                )));
            }
            let mut inner = self.lock();
            let (rows, cells) = inner.store(table)?.row_page(skip, take);
            Ok(RowPage { rows, cells })
        }
    }

    fn insert_row_at(
        &self,
        table: TableId,
        position: u32,
    ) -> impl Future<Output = Result<Row>> + Send {
        async move {
            self.gate("insert_row_at").await?;
            let mut inner = self.lock();
            let store = inner.store(table)?;
            let row = store.insert_row_at(RowId::committed(Uuid::new_v4()), position);
            Ok(row.clone())
        }
    }

    fn delete_row(&self, row: RowId) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("delete_row").await?;
            let mut inner = self.lock();
            let store = inner.store_for_row(row)?;
            store.delete_row(row).map_err(server_err)?;
            Ok(())
        }
    }

    fn update_cell(
        &self,
        row: RowId,
        column: ColumnId,
        value: CellValue,
    ) -> impl Future<Output = Result<Cell>> + Send {
        async move {
            self.gate("update_cell").await?;
            let mut inner = self.lock();
            let store = inner.store_for_row(row)?;
            let cell = store.write_cell(row, column, value).map_err(server_err)?;
            Ok(cell.clone())
        }
    }

    fn start_bulk_insert(
        &self,
        table: TableId,
        total: u64,
        batch_size: u64,
    ) -> impl Future<Output = Result<JobId>> + Send {
        async move {
            self.gate("start_bulk_insert").await?;
            let job = JobId::new();
            {
                let mut inner = self.lock();
                inner.store(table)?;
                inner.jobs.insert(
                    job,
                    JobState {
                        status: JobStatus::Running,
                        inserted: 0,
                        total,
                        error: None,
                    },
                );
            }

            let backend = self.clone();
            tokio::spawn(async move {
                let batch = batch_size.max(1);
                let mut done = 0u64;
                let mut batches = 0u64;
                loop {
                    tokio::time::sleep(BULK_BATCH_DELAY).await;
                    let mut inner = backend.lock();

                    if let Some((after, message)) = inner.bulk_fail_after.clone() {
                        if batches >= after {
                            if let Some(state) = inner.jobs.get_mut(&job) {
                                state.status = JobStatus::Error;
                                state.error = Some(message);
                            }
                            return;
                        }
                    }

                    let n = batch.min(total - done);
                    if let Ok(store) = inner.store(table) {
                        for _ in 0..n {
                            let at = store.row_count();
                            store.insert_row_at(RowId::committed(Uuid::new_v4()), at);
                        }
                    }
                    done += n;
                    batches += 1;
                    if let Some(state) = inner.jobs.get_mut(&job) {
                        state.inserted = done;
                        if done >= total {
                            state.status = JobStatus::Done;
                        }
                    }
                    if done >= total {
                        return;
                    }
                }
            });

            Ok(job)
        }
    }

    fn bulk_job_status(&self, job: JobId) -> impl Future<Output = Result<BulkJobStatus>> + Send {
        async move {
            self.gate("bulk_job_status").await?;
            let inner = self.lock();
            let state = inner.jobs.get(&job).ok_or(SyncError::NotFound)?;
            Ok(BulkJobStatus {
                status: state.status,
                inserted: state.inserted,
                total: state.total,
                error: state.error.clone(),
            })
        }
    }

    fn list_views(&self, table: TableId) -> impl Future<Output = Result<Vec<View>>> + Send {
        async move {
            self.gate("list_views").await?;
            let mut inner = self.lock();
            Ok(inner.store(table)?.views().to_vec())
        }
    }

    fn create_view(&self, table: TableId, name: &str) -> impl Future<Output = Result<View>> + Send {
        async move {
            self.gate("create_view").await?;
            let mut inner = self.lock();
            let store = inner.store(table)?;
            let view = View::new(ViewId::committed(Uuid::new_v4()), table, name);
            store.insert_view(view.clone());
            Ok(view)
        }
    }

    fn rename_view(&self, view: ViewId, name: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("rename_view").await?;
            let mut inner = self.lock();
            let store = inner.store_for_view(view)?;
            store.rename_view(view, name).map_err(server_err)
        }
    }

    fn update_view_config(
        &self,
        view: ViewId,
        config: &ViewConfig,
    ) -> impl Future<Output = Result<()>> + Send {
        let config = config.clone();
        async move {
            self.gate("update_view_config").await?;
            let mut inner = self.lock();
            let store = inner.store_for_view(view)?;
            store.set_view_config(view, config).map_err(server_err)
        }
    }

    fn delete_view(&self, view: ViewId) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.gate("delete_view").await?;
            let mut inner = self.lock();
            let store = inner.store_for_view(view)?;
            store.delete_view(view).map_err(server_err)?;
            Ok(())
        }
    }
}
