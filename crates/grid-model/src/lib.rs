//! `grid-model` defines the core in-memory data structures for gridbase
//! tables: typed columns, position-ordered rows, kind-discriminated cells,
//! and saved views.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the synchronization engine (`grid-sync`)
//! - server backends (the model doubles as the authoritative record set)
//! - IPC boundaries via `serde` (JSON-safe schema)

mod cell;
mod column;
mod ids;
mod row;
mod store;
mod table;
mod view;

pub use cell::{Cell, CellValue};
pub use column::{
    validate_column_name, validate_column_width, Column, ColumnError, ColumnKind,
    DEFAULT_COLUMN_WIDTH, MAX_COLUMN_NAME_LEN, MAX_COLUMN_WIDTH, MIN_COLUMN_WIDTH,
};
pub use ids::{ColumnId, EntityId, JobId, RowId, TableId, ViewId};
pub use row::Row;
pub use store::{EntityStore, Result as StoreResult, StoreError};
pub use table::TableMeta;
pub use view::{
    Filter, FilterCriterion, FilterValue, NumberComparison, Sort, TextMatch, TextMatchKind, View,
    ViewConfig,
};
