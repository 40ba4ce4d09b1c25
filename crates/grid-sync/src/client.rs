use std::future::Future;

use grid_model::{
    Cell, CellValue, Column, ColumnId, ColumnKind, JobId, Row, RowId, TableId, TableMeta, View,
    ViewConfig, ViewId,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Largest page a row listing may request.
pub const MAX_PAGE_SIZE: u32 = 200;

/// One fetched page of rows. A page always carries the complete cell set for
/// the rows it includes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub cells: Vec<Cell>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Done,
    Error,
}

/// Progress snapshot for a server-side bulk insert job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkJobStatus {
    pub status: JobStatus,
    pub inserted: u64,
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkJobStatus {
    /// Completion fraction in `[0, 1]`; `total == 0` reads as 0 rather than
    /// dividing by zero.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.inserted as f64 / self.total as f64
        }
    }
}

/// The transport-agnostic network contract the engine drives.
///
/// Implementations own request shaping and transport; the engine only
/// depends on the request/response semantics below. All ids passed in are
/// committed ids: the engine never dispatches a call that references a
/// temporary id.
///
/// The trait uses `async fn` and is consumed through generics; no dynamic
/// dispatch is needed anywhere in the engine.
pub trait GridClient: Send + Sync + 'static {
    fn get_table(&self, table: TableId) -> impl Future<Output = Result<TableMeta>> + Send;
    fn rename_table(
        &self,
        table: TableId,
        name: &str,
    ) -> impl Future<Output = Result<()>> + Send;
    fn set_table_starred(
        &self,
        table: TableId,
        starred: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Columns of a table, ordered by position.
    fn list_columns(&self, table: TableId) -> impl Future<Output = Result<Vec<Column>>> + Send;
    /// Create a column; appended when `position` is omitted.
    fn add_column(
        &self,
        table: TableId,
        name: &str,
        kind: ColumnKind,
        position: Option<u32>,
    ) -> impl Future<Output = Result<Column>> + Send;
    fn rename_column(
        &self,
        column: ColumnId,
        name: &str,
    ) -> impl Future<Output = Result<()>> + Send;
    /// Changing the kind clears the now-invalid value field on all the
    /// column's cells server-side.
    fn set_column_kind(
        &self,
        column: ColumnId,
        kind: ColumnKind,
    ) -> impl Future<Output = Result<()>> + Send;
    fn set_column_width(
        &self,
        column: ColumnId,
        width: u32,
    ) -> impl Future<Output = Result<()>> + Send;
    fn delete_column(&self, column: ColumnId) -> impl Future<Output = Result<()>> + Send;

    /// Page of rows by rank; `take` must be `<= MAX_PAGE_SIZE`.
    fn list_rows(
        &self,
        table: TableId,
        skip: u32,
        take: u32,
    ) -> impl Future<Output = Result<RowPage>> + Send;
    fn insert_row_at(
        &self,
        table: TableId,
        position: u32,
    ) -> impl Future<Output = Result<Row>> + Send;
    fn delete_row(&self, row: RowId) -> impl Future<Output = Result<()>> + Send;
    fn update_cell(
        &self,
        row: RowId,
        column: ColumnId,
        value: CellValue,
    ) -> impl Future<Output = Result<Cell>> + Send;

    fn start_bulk_insert(
        &self,
        table: TableId,
        total: u64,
        batch_size: u64,
    ) -> impl Future<Output = Result<JobId>> + Send;
    fn bulk_job_status(&self, job: JobId) -> impl Future<Output = Result<BulkJobStatus>> + Send;

    fn list_views(&self, table: TableId) -> impl Future<Output = Result<Vec<View>>> + Send;
    fn create_view(
        &self,
        table: TableId,
        name: &str,
    ) -> impl Future<Output = Result<View>> + Send;
    fn rename_view(&self, view: ViewId, name: &str) -> impl Future<Output = Result<()>> + Send;
    /// Idempotent: sending the same configuration twice is a no-op
    /// server-side.
    fn update_view_config(
        &self,
        view: ViewId,
        config: &ViewConfig,
    ) -> impl Future<Output = Result<()>> + Send;
    fn delete_view(&self, view: ViewId) -> impl Future<Output = Result<()>> + Send;
}
