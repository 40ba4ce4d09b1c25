use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use grid_model::{
    Cell, CellValue, Column, ColumnId, ColumnKind, EntityStore, Row, RowId, StoreError, TableId,
    TableMeta, View, ViewConfig, ViewId,
};

use crate::bulk::BulkJobTracker;
use crate::client::{BulkJobStatus, GridClient, MAX_PAGE_SIZE};
use crate::debounce::Debouncer;
use crate::error::{Result, SyncError};
use crate::pages::{CacheStats, PageCache};
use crate::views::ViewConfigSync;

/// Tuning knobs for one open table.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Rows per fetched page; clamped to `[1, MAX_PAGE_SIZE]`.
    pub page_size: u32,
    /// Prefetch the next page once the viewport is within this many rows of
    /// the end of loaded data.
    pub prefetch_lookahead: u32,
    /// Debounce window for column-width and view-config persistence.
    pub persist_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            prefetch_lookahead: 100,
            persist_debounce: Duration::from_millis(400),
        }
    }
}

/// Independently refetchable slices of session state. Each region carries its
/// own fetch epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Region {
    Table,
    Columns,
    Rows,
    Views,
}

/// Monotone per-region counters. A mutation bumps its region's epoch before
/// touching state; a fetch records the epoch it started under and its result
/// is discarded if the epoch moved while it was in flight. This stands in for
/// literal request cancellation without racing the transport.
#[derive(Debug, Default)]
struct Epochs {
    table: u64,
    columns: u64,
    rows: u64,
    views: u64,
}

impl Epochs {
    fn get(&self, region: Region) -> u64 {
        match region {
            Region::Table => self.table,
            Region::Columns => self.columns,
            Region::Rows => self.rows,
            Region::Views => self.views,
        }
    }

    fn bump(&mut self, region: Region) {
        match region {
            Region::Table => self.table += 1,
            Region::Columns => self.columns += 1,
            Region::Rows => self.rows += 1,
            Region::Views => self.views += 1,
        }
    }
}

struct State {
    store: EntityStore,
    pages: PageCache,
    epochs: Epochs,
    /// `skip` values with a row fetch currently in flight, so duplicate
    /// prefetch triggers collapse into one request.
    fetches_in_flight: HashSet<u32>,
}

/// Inverse delta captured before a speculative apply.
///
/// Each variant holds exactly what its mutation displaced, so a failed
/// mutation restores only its own footprint. Two concurrent mutations that
/// touch different entities roll back independently; state written by the
/// other mutation is never disturbed.
enum Snapshot {
    Table(TableMeta),
    ColumnRecord(Column),
    ColumnWithCells { column: Column, cells: Vec<Cell> },
    InsertedColumn(ColumnId),
    DeletedColumn { column: Column, cells: Vec<Cell> },
    InsertedRow(RowId),
    DeletedRow { row: Row, cells: Vec<Cell> },
    CellWrite(Cell),
    ViewRecord(View),
    InsertedView(ViewId),
    DeletedView(View),
}

impl Snapshot {
    fn restore(self, state: &mut State) {
        match self {
            Snapshot::Table(table) => state.store.replace_table(table),
            Snapshot::ColumnRecord(column) => state.store.put_column(column),
            Snapshot::ColumnWithCells { column, cells } => {
                state.store.put_column(column);
                state.pages.restore_cells(cells);
            }
            Snapshot::InsertedColumn(id) => {
                if state.store.delete_column(id).is_ok() {
                    state.pages.drop_column(id);
                }
            }
            Snapshot::DeletedColumn { column, cells } => {
                state.store.insert_existing_column(column);
                state.pages.restore_cells(cells);
            }
            Snapshot::InsertedRow(id) => {
                let _ = state.pages.delete_row(id);
            }
            Snapshot::DeletedRow { row, cells } => {
                let position = row.position;
                state.pages.insert_row_at(position, row, cells);
            }
            Snapshot::CellWrite(cell) => state.pages.restore_cell(cell),
            Snapshot::ViewRecord(view) => state.store.put_view(view),
            Snapshot::InsertedView(id) => {
                let _ = state.store.delete_view(id);
            }
            Snapshot::DeletedView(view) => state.store.insert_view(view),
        }
    }
}

/// One open table: local entity state, the paginated row cache, and the
/// optimistic mutation pipeline that keeps both converging on server truth.
///
/// Every mutation follows the same shape: invalidate in-flight fetches for
/// the affected region, snapshot the displaced state, apply speculatively,
/// dispatch, then commit (re-keying temporary ids) or roll back the snapshot.
/// Either way a reconciling refetch of the region runs before the call
/// returns, so local state cannot drift even if a speculative apply was
/// imperfect.
///
/// Sessions are per-table and dropped on close; no state outlives them.
pub struct TableSession<C: GridClient + Clone> {
    client: C,
    table_id: TableId,
    config: SessionConfig,
    state: Arc<Mutex<State>>,
    width_writer: Debouncer<(ColumnId, u32)>,
    view_sync: ViewConfigSync,
    bulk: BulkJobTracker<C>,
}

impl<C: GridClient + Clone> TableSession<C> {
    /// Open a table: fetch its metadata, columns, views, and the first page
    /// of rows.
    pub async fn open(client: C, table_id: TableId, config: SessionConfig) -> Result<Self> {
        let mut config = config;
        config.page_size = config.page_size.clamp(1, MAX_PAGE_SIZE);

        let table = client.get_table(table_id).await?;
        let columns = client.list_columns(table_id).await?;
        let views = client.list_views(table_id).await?;
        let first = client.list_rows(table_id, 0, config.page_size).await?;

        let mut store = EntityStore::new(table);
        store.replace_columns(columns);
        store.replace_views(views.clone());
        let mut pages = PageCache::new(config.page_size);
        pages.merge_page(0, first);

        let state = Arc::new(Mutex::new(State {
            store,
            pages,
            epochs: Epochs::default(),
            fetches_in_flight: HashSet::new(),
        }));

        let view_sync = ViewConfigSync::new(client.clone(), config.persist_debounce);
        for view in &views {
            view_sync.mark_sent(view.id, &view.config);
        }

        let width_writer = {
            let client = client.clone();
            let state = state.clone();
            Debouncer::spawn(
                config.persist_debounce,
                move |(column, width): (ColumnId, u32)| {
                    let client = client.clone();
                    let state = state.clone();
                    async move {
                        if client.set_column_width(column, width).await.is_err() {
                            // The write is debounced away from its snapshot,
                            // so a failed persist falls back to refetching
                            // the columns region.
                            let epoch = state
                                .lock()
                                .expect("session mutex poisoned")
                                .epochs
                                .get(Region::Columns);
                            if let Ok(columns) = client.list_columns(table_id).await {
                                let mut state =
                                    state.lock().expect("session mutex poisoned");
                                if state.epochs.get(Region::Columns) == epoch {
                                    state.store.replace_columns(columns);
                                }
                            }
                        }
                    }
                },
            )
        };

        Ok(Self {
            client: client.clone(),
            table_id,
            config,
            state,
            width_writer,
            view_sync,
            bulk: BulkJobTracker::new(client, table_id),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("session mutex poisoned")
    }

    // ---- read model -----------------------------------------------------

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn table(&self) -> TableMeta {
        self.lock().store.table().clone()
    }

    /// Columns ordered by position.
    pub fn columns(&self) -> Vec<Column> {
        self.lock().store.columns().to_vec()
    }

    pub fn views(&self) -> Vec<View> {
        self.lock().store.views().to_vec()
    }

    /// All loaded rows in position order.
    pub fn rows(&self) -> Vec<Row> {
        self.lock()
            .pages
            .merged_rows()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn loaded_row_count(&self) -> u32 {
        self.lock().pages.loaded_row_count()
    }

    pub fn cell(&self, row: RowId, column: ColumnId) -> Option<Cell> {
        self.lock().pages.cell(row, column).cloned()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.lock().pages.stats()
    }

    /// Loaded rows filtered and ordered by a view's configuration. Filters
    /// and sorts are evaluated client-side over resident cells.
    pub fn rows_for_view(&self, view: ViewId) -> Result<Vec<Row>> {
        let state = self.lock();
        let config = state
            .store
            .view(view)
            .ok_or(SyncError::NotFound)?
            .config
            .clone();
        let mut rows: Vec<Row> = state
            .pages
            .merged_rows()
            .into_iter()
            .filter(|row| {
                config.matches_row(|column| state.pages.cell(row.id, column).map(|c| &c.value))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            config
                .compare_rows(
                    |column| state.pages.cell(a.id, column).map(|c| &c.value),
                    |column| state.pages.cell(b.id, column).map(|c| &c.value),
                )
                .then(a.position.cmp(&b.position))
        });
        Ok(rows)
    }

    // ---- mutation pipeline ----------------------------------------------

    /// The optimistic pipeline every mutation runs through.
    ///
    /// `prepare` bumps nothing itself: the epoch bump, snapshot, and
    /// speculative apply all happen under one lock acquisition with no
    /// suspension in between, so no fetch result or competing mutation can
    /// interleave. `dispatch` performs the network call; `commit` runs on
    /// success (re-keying temporary ids, adopting server-confirmed records)
    /// and the snapshot is restored on failure. A reconciling refetch of the
    /// region runs either way before this returns.
    async fn mutate<'a, Ctx, Out, Ret, Fut>(
        &'a self,
        region: Region,
        prepare: impl FnOnce(&mut State) -> Result<(Snapshot, Ctx)>,
        dispatch: impl FnOnce(&'a C, Ctx) -> Fut,
        commit: impl FnOnce(&mut State, Ctx, Out) -> Ret,
    ) -> Result<Ret>
    where
        Ctx: Clone,
        Fut: Future<Output = Result<Out>>,
    {
        let (snapshot, ctx) = {
            let mut state = self.lock();
            state.epochs.bump(region);
            prepare(&mut state)?
        };

        let result = dispatch(&self.client, ctx.clone()).await;

        let outcome = {
            let mut state = self.lock();
            match result {
                Ok(out) => Ok(commit(&mut state, ctx, out)),
                Err(err) => {
                    snapshot.restore(&mut state);
                    Err(err)
                }
            }
        };

        self.reconcile(region).await;
        outcome
    }

    /// Best-effort refetch of one region, discarded if the region's epoch
    /// moves while the fetch is in flight.
    async fn reconcile(&self, region: Region) {
        let epoch = self.lock().epochs.get(region);
        match region {
            Region::Table => {
                if let Ok(table) = self.client.get_table(self.table_id).await {
                    let mut state = self.lock();
                    if state.epochs.get(Region::Table) == epoch {
                        state.store.replace_table(table);
                    }
                }
            }
            Region::Columns => {
                // Push any pending width write first so the refetch cannot
                // resurrect a stale width.
                self.width_writer.flush().await;
                if let Ok(columns) = self.client.list_columns(self.table_id).await {
                    let mut state = self.lock();
                    if state.epochs.get(Region::Columns) == epoch {
                        state.store.replace_columns(columns);
                    }
                }
            }
            Region::Views => {
                self.view_sync.flush().await;
                if let Ok(views) = self.client.list_views(self.table_id).await {
                    let mut state = self.lock();
                    if state.epochs.get(Region::Views) == epoch {
                        for view in &views {
                            self.view_sync.mark_sent(view.id, &view.config);
                        }
                        state.store.replace_views(views);
                    }
                }
            }
            Region::Rows => {
                let skips = self.lock().pages.loaded_skips();
                for skip in skips {
                    let Ok(page) = self
                        .client
                        .list_rows(self.table_id, skip, self.config.page_size)
                        .await
                    else {
                        return;
                    };
                    let mut state = self.lock();
                    if state.epochs.get(Region::Rows) != epoch {
                        return;
                    }
                    state.pages.merge_page(skip, page);
                }
            }
        }
    }

    // ---- table ----------------------------------------------------------

    pub async fn rename_table(&self, name: &str) -> Result<()> {
        if self.lock().store.table().name == name {
            return Ok(());
        }
        self.mutate(
            Region::Table,
            |state| {
                let snapshot = Snapshot::Table(state.store.table().clone());
                state.store.rename_table(name);
                Ok((snapshot, ()))
            },
            |client, _| client.rename_table(self.table_id, name),
            |_, _, _| (),
        )
        .await
    }

    pub async fn set_starred(&self, starred: bool) -> Result<()> {
        if self.lock().store.table().starred == starred {
            return Ok(());
        }
        self.mutate(
            Region::Table,
            |state| {
                let snapshot = Snapshot::Table(state.store.table().clone());
                state.store.set_starred(starred);
                Ok((snapshot, ()))
            },
            |client, _| client.set_table_starred(self.table_id, starred),
            |_, _, _| (),
        )
        .await
    }

    // ---- columns ---------------------------------------------------------

    /// Create a column, appended unless `position` is given. The column is
    /// visible immediately under a temporary id; the returned id is the
    /// committed one.
    pub async fn add_column(
        &self,
        name: &str,
        kind: ColumnKind,
        position: Option<u32>,
    ) -> Result<ColumnId> {
        self.mutate(
            Region::Columns,
            |state| {
                let temp = ColumnId::mint_temporary();
                let at = position.unwrap_or(state.store.column_count());
                let column = state.store.insert_column_at(temp, at, name, kind)?.clone();
                state.pages.patch_new_column(&column);
                Ok((Snapshot::InsertedColumn(temp), temp))
            },
            |client, _| client.add_column(self.table_id, name, kind, position),
            |state, temp, committed: Column| {
                state.store.rekey_column(temp, committed.id);
                state.pages.rekey_column(temp, committed.id);
                committed.id
            },
        )
        .await
    }

    pub async fn rename_column(&self, id: ColumnId, name: &str) -> Result<()> {
        require_committed(id.is_temporary(), "column")?;
        {
            let state = self.lock();
            let column = state.store.column(id).ok_or(SyncError::NotFound)?;
            if column.name == name.trim() {
                // Same name resolves locally; no write is issued.
                return Ok(());
            }
        }
        self.mutate(
            Region::Columns,
            |state| {
                let column = state.store.column(id).ok_or(SyncError::NotFound)?.clone();
                state.store.rename_column(id, name)?;
                Ok((Snapshot::ColumnRecord(column), ()))
            },
            |client, _| client.rename_column(id, name),
            |_, _, _| (),
        )
        .await
    }

    /// Change a column's kind. Every loaded cell under the column resets to
    /// the typed null of the new kind, mirroring the server-side clear.
    pub async fn set_column_kind(&self, id: ColumnId, kind: ColumnKind) -> Result<()> {
        require_committed(id.is_temporary(), "column")?;
        {
            let state = self.lock();
            let column = state.store.column(id).ok_or(SyncError::NotFound)?;
            if column.kind == kind {
                return Ok(());
            }
        }
        self.mutate(
            Region::Columns,
            |state| {
                let column = state.store.column(id).ok_or(SyncError::NotFound)?.clone();
                let cells = state.pages.clear_column_values(id, kind);
                state.store.set_column_kind(id, kind)?;
                Ok((Snapshot::ColumnWithCells { column, cells }, ()))
            },
            |client, _| client.set_column_kind(id, kind),
            |_, _, _| (),
        )
        .await
    }

    /// Resize a column. Applies locally right away; persistence rides the
    /// debounced writer, so drag streams cost one network write.
    pub fn set_column_width(&self, id: ColumnId, width: u32) -> Result<()> {
        require_committed(id.is_temporary(), "column")?;
        {
            let mut state = self.lock();
            state.epochs.bump(Region::Columns);
            state.store.set_column_width(id, width)?;
        }
        self.width_writer.submit((id, width));
        Ok(())
    }

    pub async fn delete_column(&self, id: ColumnId) -> Result<()> {
        require_committed(id.is_temporary(), "column")?;
        self.mutate(
            Region::Columns,
            |state| {
                let (column, _) = state.store.delete_column(id)?;
                let cells = state.pages.drop_column(id);
                Ok((Snapshot::DeletedColumn { column, cells }, ()))
            },
            |client, _| client.delete_column(id),
            |_, _, _| (),
        )
        .await
    }

    // ---- rows -----------------------------------------------------------

    /// Insert a row at a position (clamped to the loaded range), back-filled
    /// with typed-null cells. Returns the committed row id.
    pub async fn insert_row_at(&self, position: u32) -> Result<RowId> {
        self.mutate(
            Region::Rows,
            |state| {
                let temp = RowId::mint_temporary();
                let at = position.min(state.pages.loaded_row_count());
                let row = Row::new(temp, self.table_id, at);
                let cells: Vec<Cell> = state
                    .store
                    .columns()
                    .iter()
                    .map(|c| Cell::null(temp, c.id, c.kind))
                    .collect();
                state.pages.insert_row_at(at, row, cells);
                Ok((Snapshot::InsertedRow(temp), (temp, at)))
            },
            |client, (_, at)| client.insert_row_at(self.table_id, at),
            |state, (temp, _), committed: Row| {
                state.pages.rekey_row(temp, committed.id);
                committed.id
            },
        )
        .await
    }

    pub async fn delete_row(&self, id: RowId) -> Result<()> {
        require_committed(id.is_temporary(), "row")?;
        self.mutate(
            Region::Rows,
            |state| {
                let (row, cells) = state.pages.delete_row(id).ok_or(SyncError::NotFound)?;
                Ok((Snapshot::DeletedRow { row, cells }, ()))
            },
            |client, _| client.delete_row(id),
            |_, _, _| (),
        )
        .await
    }

    /// Write one cell. Kind mismatches are rejected locally before anything
    /// is applied or dispatched.
    pub async fn update_cell(&self, row: RowId, column: ColumnId, value: CellValue) -> Result<()> {
        require_committed(row.is_temporary(), "row")?;
        require_committed(column.is_temporary(), "column")?;
        let applied = value.clone();
        self.mutate(
            Region::Rows,
            move |state| {
                let expected = state.store.column(column).ok_or(SyncError::NotFound)?.kind;
                if applied.kind() != expected {
                    return Err(StoreError::KindMismatch {
                        expected,
                        got: applied.kind(),
                    }
                    .into());
                }
                let previous = state
                    .pages
                    .write_cell(row, column, applied)
                    .ok_or(SyncError::NotFound)?;
                Ok((Snapshot::CellWrite(previous), ()))
            },
            move |client, _| client.update_cell(row, column, value),
            |state, _, confirmed: Cell| {
                // Last network response wins for this cell.
                state.pages.restore_cell(confirmed);
            },
        )
        .await
    }

    // ---- views ----------------------------------------------------------

    /// Create a saved view with an empty configuration. Returns the committed
    /// view id.
    pub async fn create_view(&self, name: &str) -> Result<ViewId> {
        self.mutate(
            Region::Views,
            |state| {
                let temp = ViewId::mint_temporary();
                let view = View::new(temp, self.table_id, name);
                state.store.insert_view(view);
                Ok((Snapshot::InsertedView(temp), temp))
            },
            |client, _| client.create_view(self.table_id, name),
            |state, temp, committed: View| {
                state.store.rekey_view(temp, committed.id);
                let id = committed.id;
                self.view_sync.mark_sent(id, &committed.config);
                state.store.put_view(committed);
                id
            },
        )
        .await
    }

    pub async fn rename_view(&self, id: ViewId, name: &str) -> Result<()> {
        require_committed(id.is_temporary(), "view")?;
        {
            let state = self.lock();
            let view = state.store.view(id).ok_or(SyncError::NotFound)?;
            if view.name == name {
                return Ok(());
            }
        }
        self.mutate(
            Region::Views,
            |state| {
                let view = state.store.view(id).ok_or(SyncError::NotFound)?.clone();
                state.store.rename_view(id, name)?;
                Ok((Snapshot::ViewRecord(view), ()))
            },
            |client, _| client.rename_view(id, name),
            |_, _, _| (),
        )
        .await
    }

    /// Replace a view's filter/sort/hidden configuration. Applies locally
    /// right away; persistence is debounced and deduplicated against the
    /// last-sent snapshot.
    pub fn set_view_config(&self, id: ViewId, config: ViewConfig) -> Result<()> {
        require_committed(id.is_temporary(), "view")?;
        {
            let mut state = self.lock();
            state.epochs.bump(Region::Views);
            state.store.set_view_config(id, config.clone())?;
        }
        self.view_sync.submit(id, config);
        Ok(())
    }

    pub async fn delete_view(&self, id: ViewId) -> Result<()> {
        require_committed(id.is_temporary(), "view")?;
        self.mutate(
            Region::Views,
            |state| {
                let view = state.store.delete_view(id)?;
                Ok((Snapshot::DeletedView(view), ()))
            },
            |client, _| client.delete_view(id),
            |_, _, _| self.view_sync.forget(id),
        )
        .await
    }

    // ---- paging ---------------------------------------------------------

    /// Fetch one page of rows into the cache. Duplicate requests for a page
    /// already in flight collapse into the first; results that raced a
    /// structural row mutation are discarded.
    pub async fn load_page(&self, skip: u32) -> Result<()> {
        let epoch = {
            let mut state = self.lock();
            if !state.fetches_in_flight.insert(skip) {
                return Ok(());
            }
            state.epochs.get(Region::Rows)
        };

        let result = self
            .client
            .list_rows(self.table_id, skip, self.config.page_size)
            .await;

        let mut state = self.lock();
        state.fetches_in_flight.remove(&skip);
        match result {
            Ok(page) => {
                if state.epochs.get(Region::Rows) == epoch {
                    state.pages.merge_page(skip, page);
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch the next page if the viewport has scrolled within the lookahead
    /// of the end of loaded data. No-op when the table end is already loaded.
    pub async fn ensure_prefetch(&self, viewport_end: u32) -> Result<()> {
        let next = self
            .lock()
            .pages
            .needs_prefetch(viewport_end, self.config.prefetch_lookahead);
        match next {
            Some(skip) => self.load_page(skip).await,
            None => Ok(()),
        }
    }

    /// Refetch every loaded row page from the server.
    pub async fn refetch_rows(&self) {
        self.reconcile(Region::Rows).await;
    }

    /// Refetch the column set from the server, flushing any pending width
    /// write first.
    pub async fn refetch_columns(&self) {
        self.reconcile(Region::Columns).await;
    }

    /// Refetch the view set from the server, flushing any pending config
    /// write first.
    pub async fn refetch_views(&self) {
        self.reconcile(Region::Views).await;
    }

    /// Refetch every region from the server.
    pub async fn refresh(&self) {
        self.reconcile(Region::Table).await;
        self.reconcile(Region::Columns).await;
        self.reconcile(Region::Views).await;
        self.reconcile(Region::Rows).await;
    }

    // ---- bulk append ------------------------------------------------------

    /// Run a server-side bulk append to completion.
    ///
    /// Starts the job, polls its status at `poll_interval` until it settles,
    /// then drops every loaded page and refetches from scratch. The refetch
    /// happens on failure too: a partially completed job may have inserted
    /// rows, and none of them are trusted until a fetch confirms them.
    pub async fn bulk_append(
        &self,
        total: u64,
        batch_size: u64,
        poll_interval: Duration,
    ) -> Result<BulkJobStatus> {
        self.bulk.start(total, batch_size).await?;
        let settled = self.bulk.poll_until_settled(poll_interval).await;

        {
            let mut state = self.lock();
            state.epochs.bump(Region::Rows);
            state.pages.clear();
        }
        let refetch = self.load_page(0).await;

        let status = settled?;
        refetch?;
        Ok(status)
    }

    pub fn bulk_running(&self) -> bool {
        self.bulk.is_running()
    }

    /// Bulk progress fraction in `[0, 1]`; 0 when idle.
    pub fn bulk_progress(&self) -> f64 {
        self.bulk.progress()
    }

    // ---- lifecycle --------------------------------------------------------

    /// Close the session, draining any pending debounced writes.
    pub async fn close(self) {
        self.width_writer.shutdown().await;
        self.view_sync.shutdown().await;
    }
}

/// Mutations may only target entities the server already knows about. An
/// entity still awaiting its committed id cannot be addressed in a request.
fn require_committed(temporary: bool, entity: &str) -> Result<()> {
    if temporary {
        return Err(SyncError::ValidationFailed(format!(
            "{entity} has not been committed yet"
        )));
    }
    Ok(())
}
