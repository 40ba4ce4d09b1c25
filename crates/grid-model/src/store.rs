use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use crate::{
    validate_column_name, validate_column_width, Cell, CellValue, Column, ColumnError, ColumnId,
    ColumnKind, Row, RowId, TableMeta, View, ViewConfig, ViewId, DEFAULT_COLUMN_WIDTH,
};

/// Errors raised by [`EntityStore`] operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("column not found: {0}")]
    ColumnNotFound(ColumnId),
    #[error("row not found: {0}")]
    RowNotFound(RowId),
    #[error("view not found: {0}")]
    ViewNotFound(ViewId),
    #[error("no cell for row {row} and column {column}")]
    CellNotFound { row: RowId, column: ColumnId },
    #[error("cell value kind {got:?} does not match column kind {expected:?}")]
    KindMismatch {
        expected: ColumnKind,
        got: ColumnKind,
    },
    #[error(transparent)]
    Column(#[from] ColumnError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// In-memory records for one table: columns, rows, cells, and views.
///
/// The store owns the position invariants: columns and rows each keep a dense
/// 0-based rank, and a cell exists for every (row, column) pair. Every
/// structural mutation re-establishes both before returning, so callers can
/// address entities by rank without renumbering on every read.
///
/// One store is created per open table and dropped when the table closes;
/// nothing here is global.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityStore {
    table: TableMeta,
    columns: Vec<Column>,
    rows: Vec<Row>,
    cells: HashMap<(RowId, ColumnId), Cell>,
    views: Vec<View>,
}

impl EntityStore {
    pub fn new(table: TableMeta) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            cells: HashMap::new(),
            views: Vec::new(),
        }
    }

    pub fn table(&self) -> &TableMeta {
        &self.table
    }

    /// Columns in position order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in position order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn cell(&self, row: RowId, column: ColumnId) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn column_count(&self) -> u32 {
        self.columns.len() as u32
    }

    pub fn rename_table(&mut self, name: impl Into<String>) {
        self.table.name = name.into();
    }

    pub fn set_starred(&mut self, starred: bool) {
        self.table.starred = starred;
    }

    /// Replace the column set wholesale (reconciling refetch).
    pub fn replace_columns(&mut self, mut columns: Vec<Column>) {
        columns.sort_by_key(|c| c.position);
        self.columns = columns;
    }

    /// Replace the view set wholesale (reconciling refetch).
    pub fn replace_views(&mut self, views: Vec<View>) {
        self.views = views;
    }

    /// Replace the table header (reconciling refetch).
    pub fn replace_table(&mut self, table: TableMeta) {
        self.table = table;
    }

    /// Replace a column record in place (same id, positions untouched by the
    /// caller's contract).
    pub fn put_column(&mut self, column: Column) {
        if let Some(existing) = self.columns.iter_mut().find(|c| c.id == column.id) {
            *existing = column;
            self.columns.sort_by_key(|c| c.position);
        }
    }

    /// Replace a view record in place (same id).
    pub fn put_view(&mut self, view: View) {
        if let Some(existing) = self.views.iter_mut().find(|v| v.id == view.id) {
            *existing = view;
        }
    }

    /// Insert a column at the given rank (clamped to `[0, N]`), shifting the
    /// ranks after it and back-filling a typed-null cell for every resident
    /// row.
    pub fn insert_column_at(
        &mut self,
        id: ColumnId,
        at: u32,
        name: &str,
        kind: ColumnKind,
    ) -> Result<&Column> {
        validate_column_name(name)?;
        let at = (at as usize).min(self.columns.len());
        for column in &mut self.columns {
            if column.position >= at as u32 {
                column.position += 1;
            }
        }
        let column = Column {
            id,
            table_id: self.table.id,
            name: name.trim().to_string(),
            kind,
            position: at as u32,
            width: DEFAULT_COLUMN_WIDTH,
        };
        self.columns.insert(at, column);
        for row in &self.rows {
            self.cells
                .insert((row.id, id), Cell::null(row.id, id, kind));
        }
        debug_assert!(self.positions_are_dense());
        Ok(&self.columns[at])
    }

    /// Re-insert a previously deleted column at its recorded rank, shifting
    /// ranks after it. Cells are not back-filled; the caller restores them.
    pub fn insert_existing_column(&mut self, column: Column) {
        let at = (column.position as usize).min(self.columns.len());
        for existing in &mut self.columns {
            if existing.position >= column.position {
                existing.position += 1;
            }
        }
        self.columns.insert(at, column);
    }

    pub fn rename_column(&mut self, id: ColumnId, name: &str) -> Result<()> {
        validate_column_name(name)?;
        let column = self.column_mut(id)?;
        column.name = name.trim().to_string();
        Ok(())
    }

    /// Change a column's kind, clearing the now-invalid value on every cell
    /// of that column.
    pub fn set_column_kind(&mut self, id: ColumnId, kind: ColumnKind) -> Result<()> {
        let column = self.column_mut(id)?;
        column.kind = kind;
        for cell in self.cells.values_mut() {
            if cell.column_id == id {
                cell.value = CellValue::null_for(kind);
            }
        }
        Ok(())
    }

    pub fn set_column_width(&mut self, id: ColumnId, width: u32) -> Result<()> {
        validate_column_width(width)?;
        let column = self.column_mut(id)?;
        column.width = width;
        Ok(())
    }

    /// Delete a column, cascading its cells and re-densifying the remaining
    /// ranks. Returns the column and its cells so a rollback can restore them.
    pub fn delete_column(&mut self, id: ColumnId) -> Result<(Column, Vec<Cell>)> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::ColumnNotFound(id))?;
        let column = self.columns.remove(idx);
        let mut removed = Vec::new();
        self.cells.retain(|_, cell| {
            if cell.column_id == id {
                removed.push(cell.clone());
                false
            } else {
                true
            }
        });
        self.redensify_columns();
        Ok((column, removed))
    }

    /// Insert a row at the given rank (clamped to `[0, N]`), shifting the
    /// ranks after it and back-filling a typed-null cell for every column.
    pub fn insert_row_at(&mut self, id: RowId, at: u32) -> &Row {
        let at = (at as usize).min(self.rows.len());
        for row in &mut self.rows {
            if row.position >= at as u32 {
                row.position += 1;
            }
        }
        let row = Row::new(id, self.table.id, at as u32);
        self.rows.insert(at, row);
        for column in &self.columns {
            self.cells
                .insert((id, column.id), Cell::null(id, column.id, column.kind));
        }
        debug_assert!(self.positions_are_dense());
        &self.rows[at]
    }

    /// Re-insert a previously deleted row and its cells at its recorded rank.
    pub fn insert_existing_row(&mut self, row: Row, cells: Vec<Cell>) {
        let at = (row.position as usize).min(self.rows.len());
        for existing in &mut self.rows {
            if existing.position >= row.position {
                existing.position += 1;
            }
        }
        self.rows.insert(at, row);
        for cell in cells {
            self.cells.insert((cell.row_id, cell.column_id), cell);
        }
    }

    /// Delete a row, cascading its cells and decrementing the ranks of rows
    /// after it. Returns the row and its cells so a rollback can restore them.
    pub fn delete_row(&mut self, id: RowId) -> Result<(Row, Vec<Cell>)> {
        let idx = self
            .rows
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::RowNotFound(id))?;
        let row = self.rows.remove(idx);
        let mut removed = Vec::new();
        self.cells.retain(|_, cell| {
            if cell.row_id == id {
                removed.push(cell.clone());
                false
            } else {
                true
            }
        });
        for other in &mut self.rows {
            if other.position > row.position {
                other.position -= 1;
            }
        }
        debug_assert!(self.positions_are_dense());
        Ok((row, removed))
    }

    /// Write a cell value. The value's kind must match the column's kind, and
    /// the (row, column) pair must exist.
    pub fn write_cell(&mut self, row_id: RowId, column_id: ColumnId, value: CellValue) -> Result<&Cell> {
        let kind = self
            .column(column_id)
            .ok_or(StoreError::ColumnNotFound(column_id))?
            .kind;
        if !value.matches(kind) {
            return Err(StoreError::KindMismatch {
                expected: kind,
                got: value.kind(),
            });
        }
        let cell = self
            .cells
            .get_mut(&(row_id, column_id))
            .ok_or(StoreError::CellNotFound {
                row: row_id,
                column: column_id,
            })?;
        cell.value = value;
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == row_id) {
            row.updated_at = Utc::now();
        }
        Ok(&self.cells[&(row_id, column_id)])
    }

    pub fn insert_view(&mut self, view: View) {
        self.views.push(view);
    }

    pub fn rename_view(&mut self, id: ViewId, name: impl Into<String>) -> Result<()> {
        let view = self.view_mut(id)?;
        view.name = name.into();
        Ok(())
    }

    pub fn set_view_config(&mut self, id: ViewId, config: ViewConfig) -> Result<()> {
        let view = self.view_mut(id)?;
        view.config = config;
        Ok(())
    }

    pub fn delete_view(&mut self, id: ViewId) -> Result<View> {
        let idx = self
            .views
            .iter()
            .position(|v| v.id == id)
            .ok_or(StoreError::ViewNotFound(id))?;
        Ok(self.views.remove(idx))
    }

    /// Rewrite every reference to a column id (the column record and all of
    /// its cells). Returns the number of references rewritten.
    pub fn rekey_column(&mut self, from: ColumnId, to: ColumnId) -> usize {
        let mut rewritten = 0;
        for column in &mut self.columns {
            if column.id == from {
                column.id = to;
                rewritten += 1;
            }
        }
        let keys: Vec<_> = self
            .cells
            .keys()
            .filter(|(_, c)| *c == from)
            .copied()
            .collect();
        for key in keys {
            let mut cell = self.cells.remove(&key).expect("cell key just listed");
            cell.column_id = to;
            self.cells.insert((key.0, to), cell);
            rewritten += 1;
        }
        for view in &mut self.views {
            for hidden in &mut view.config.hidden {
                if *hidden == from {
                    *hidden = to;
                    rewritten += 1;
                }
            }
            for filter in &mut view.config.filters {
                if filter.column_id == from {
                    filter.column_id = to;
                    rewritten += 1;
                }
            }
            for sort in &mut view.config.sorts {
                if sort.column_id == from {
                    sort.column_id = to;
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    /// Rewrite every reference to a row id (the row record and all of its
    /// cells). Returns the number of references rewritten.
    pub fn rekey_row(&mut self, from: RowId, to: RowId) -> usize {
        let mut rewritten = 0;
        for row in &mut self.rows {
            if row.id == from {
                row.id = to;
                rewritten += 1;
            }
        }
        let keys: Vec<_> = self
            .cells
            .keys()
            .filter(|(r, _)| *r == from)
            .copied()
            .collect();
        for key in keys {
            let mut cell = self.cells.remove(&key).expect("cell key just listed");
            cell.row_id = to;
            self.cells.insert((to, key.1), cell);
            rewritten += 1;
        }
        rewritten
    }

    pub fn rekey_view(&mut self, from: ViewId, to: ViewId) -> usize {
        let mut rewritten = 0;
        for view in &mut self.views {
            if view.id == from {
                view.id = to;
                rewritten += 1;
            }
        }
        rewritten
    }

    /// Slice a page of rows by rank, with the complete cell set for each row
    /// included.
    pub fn row_page(&self, skip: u32, take: u32) -> (Vec<Row>, Vec<Cell>) {
        let rows: Vec<Row> = self
            .rows
            .iter()
            .skip(skip as usize)
            .take(take as usize)
            .cloned()
            .collect();
        let mut cells = Vec::with_capacity(rows.len() * self.columns.len());
        for row in &rows {
            for column in &self.columns {
                if let Some(cell) = self.cells.get(&(row.id, column.id)) {
                    cells.push(cell.clone());
                }
            }
        }
        (rows, cells)
    }

    /// Whether row and column positions each form exactly `{0, …, N-1}`.
    pub fn positions_are_dense(&self) -> bool {
        ranks_are_dense(self.columns.iter().map(|c| c.position))
            && ranks_are_dense(self.rows.iter().map(|r| r.position))
    }

    /// Whether a cell exists for every (row, column) pair.
    pub fn cells_are_complete(&self) -> bool {
        self.rows.iter().all(|row| {
            self.columns
                .iter()
                .all(|column| self.cells.contains_key(&(row.id, column.id)))
        }) && self.cells.len() == self.rows.len() * self.columns.len()
    }

    fn column_mut(&mut self, id: ColumnId) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::ColumnNotFound(id))
    }

    fn view_mut(&mut self, id: ViewId) -> Result<&mut View> {
        self.views
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(StoreError::ViewNotFound(id))
    }

    fn redensify_columns(&mut self) {
        self.columns.sort_by_key(|c| c.position);
        for (rank, column) in self.columns.iter_mut().enumerate() {
            column.position = rank as u32;
        }
    }
}

fn ranks_are_dense(positions: impl Iterator<Item = u32>) -> bool {
    let mut seen: Vec<u32> = positions.collect();
    seen.sort_unstable();
    seen.iter().enumerate().all(|(i, &p)| p == i as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TableId;

    fn store_with(columns: &[(&str, ColumnKind)], rows: usize) -> EntityStore {
        let mut store = EntityStore::new(TableMeta::new(TableId::new(), "Table"));
        for (i, (name, kind)) in columns.iter().enumerate() {
            store
                .insert_column_at(ColumnId::committed(uuid::Uuid::new_v4()), i as u32, name, *kind)
                .expect("insert column");
        }
        for i in 0..rows {
            store.insert_row_at(RowId::committed(uuid::Uuid::new_v4()), i as u32);
        }
        store
    }

    #[test]
    fn insert_column_backfills_cells() {
        let store = store_with(&[("Name", ColumnKind::Text)], 3);
        assert!(store.cells_are_complete());
        let mut store = store;
        store
            .insert_column_at(
                ColumnId::committed(uuid::Uuid::new_v4()),
                0,
                "Amount",
                ColumnKind::Number,
            )
            .expect("insert column");
        assert!(store.cells_are_complete());
        assert_eq!(store.columns()[0].name, "Amount");
        assert_eq!(store.columns()[1].position, 1);
    }

    #[test]
    fn delete_column_redensifies_and_cascades() {
        let mut store = store_with(
            &[
                ("A", ColumnKind::Text),
                ("B", ColumnKind::Number),
                ("C", ColumnKind::Text),
            ],
            2,
        );
        let b = store.columns()[1].id;
        let (_, removed) = store.delete_column(b).expect("delete column");
        assert_eq!(removed.len(), 2);
        assert!(store.positions_are_dense());
        assert!(store.cells_are_complete());
        assert_eq!(store.columns()[1].name, "C");
        assert_eq!(store.columns()[1].position, 1);
    }

    #[test]
    fn insert_row_clamps_position() {
        let mut store = store_with(&[("A", ColumnKind::Text)], 2);
        let id = RowId::committed(uuid::Uuid::new_v4());
        let row = store.insert_row_at(id, 99);
        assert_eq!(row.position, 2);
        assert!(store.positions_are_dense());
        assert!(store.cells_are_complete());
    }

    #[test]
    fn write_cell_enforces_kind() {
        let mut store = store_with(&[("Amount", ColumnKind::Number)], 1);
        let row = store.rows()[0].id;
        let col = store.columns()[0].id;
        let err = store
            .write_cell(row, col, CellValue::text("nope"))
            .expect_err("kind mismatch");
        assert_eq!(
            err,
            StoreError::KindMismatch {
                expected: ColumnKind::Number,
                got: ColumnKind::Text,
            }
        );
        store
            .write_cell(row, col, CellValue::number(42.0))
            .expect("write number");
        assert_eq!(
            store.cell(row, col).expect("cell").value,
            CellValue::number(42.0)
        );
    }

    #[test]
    fn write_cell_missing_pair_is_not_found() {
        let mut store = store_with(&[("A", ColumnKind::Text)], 1);
        let col = store.columns()[0].id;
        let ghost = RowId::mint_temporary();
        let err = store
            .write_cell(ghost, col, CellValue::text("x"))
            .expect_err("missing row");
        assert_eq!(
            err,
            StoreError::CellNotFound {
                row: ghost,
                column: col,
            }
        );
    }

    #[test]
    fn set_column_kind_clears_values() {
        let mut store = store_with(&[("X", ColumnKind::Text)], 2);
        let col = store.columns()[0].id;
        let row = store.rows()[0].id;
        store
            .write_cell(row, col, CellValue::text("hello"))
            .expect("write");
        store
            .set_column_kind(col, ColumnKind::Number)
            .expect("set kind");
        assert_eq!(
            store.cell(row, col).expect("cell").value,
            CellValue::Number(None)
        );
    }

    #[test]
    fn rekey_column_rewrites_everything() {
        let mut store = store_with(&[("A", ColumnKind::Text)], 2);
        let temp = ColumnId::mint_temporary();
        store
            .insert_column_at(temp, 1, "B", ColumnKind::Text)
            .expect("insert");
        let real = ColumnId::committed(uuid::Uuid::new_v4());
        let rewritten = store.rekey_column(temp, real);
        // One column record plus two cells.
        assert_eq!(rewritten, 3);
        assert!(store.column(temp).is_none());
        assert!(store.column(real).is_some());
        assert!(store.cells_are_complete());
    }
}
