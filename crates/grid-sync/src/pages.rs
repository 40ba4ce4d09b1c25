use std::collections::HashMap;

use grid_model::{Cell, CellValue, Column, ColumnId, ColumnKind, Row, RowId};

use crate::client::RowPage;

/// Cumulative counters for cache activity.
///
/// Intended for observability (debug overlays, assertions in tests); nothing
/// reads these for correctness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub pages_loaded: u64,
    pub pages_replaced: u64,
    pub rows_rekeyed: u64,
    pub cells_rekeyed: u64,
}

#[derive(Clone, Debug, PartialEq)]
struct Page {
    skip: u32,
    /// Rows kept sorted by position.
    rows: Vec<Row>,
    cells: HashMap<(RowId, ColumnId), Cell>,
}

/// A single logical, position-ordered row sequence assembled from
/// independently fetched pages.
///
/// Pages are stored in fetch order and merged on read. Structural mutations
/// (insert/delete) are not confined to one page: position shifts apply to
/// every loaded row, so the merged sequence stays consistent with the dense
/// server-side ranks. Pages that are not loaded need no patching; they are
/// fetched with correct positions and cells already included.
///
/// Pages are assumed to form a dense prefix of the table (`skip` 0, 100,
/// 200, …), which is how the session fetches them.
#[derive(Clone, Debug, PartialEq)]
pub struct PageCache {
    pages: Vec<Page>,
    page_size: u32,
    /// Set once a fetch returned fewer rows than requested.
    end_reached: bool,
    stats: CacheStats,
}

impl PageCache {
    pub fn new(page_size: u32) -> Self {
        Self {
            pages: Vec::new(),
            page_size: page_size.max(1),
            end_reached: false,
            stats: CacheStats::default(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn loaded_row_count(&self) -> u32 {
        self.pages.iter().map(|p| p.rows.len() as u32).sum()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every loaded page (bulk-job reconciliation refetches from
    /// scratch).
    pub fn clear(&mut self) {
        self.pages.clear();
        self.end_reached = false;
    }

    /// Merge a fetched page into the cache.
    ///
    /// A page with the same `skip` replaces the previous fetch (reconciling
    /// refetch); any row that already lives in a *different* page is removed
    /// from there first, so each row appears in exactly one page.
    pub fn merge_page(&mut self, skip: u32, page: RowPage) {
        let RowPage { mut rows, cells } = page;
        rows.sort_by_key(|r| r.position);

        let fetched = rows.len() as u32;
        let incoming: Vec<RowId> = rows.iter().map(|r| r.id).collect();
        for existing in &mut self.pages {
            if existing.skip == skip {
                continue;
            }
            existing.rows.retain(|r| !incoming.contains(&r.id));
            existing.cells.retain(|(row, _), _| !incoming.contains(row));
        }

        let mut cell_map = HashMap::with_capacity(cells.len());
        for cell in cells {
            cell_map.insert((cell.row_id, cell.column_id), cell);
        }

        let replaced = if let Some(existing) = self.pages.iter_mut().find(|p| p.skip == skip) {
            existing.rows = rows;
            existing.cells = cell_map;
            true
        } else {
            self.pages.push(Page {
                skip,
                rows,
                cells: cell_map,
            });
            false
        };

        if replaced {
            self.stats.pages_replaced += 1;
        } else {
            self.stats.pages_loaded += 1;
        }

        let max_skip = self.pages.iter().map(|p| p.skip).max().unwrap_or(0);
        if skip >= max_skip {
            self.end_reached = fetched < self.page_size;
        }
    }

    /// All loaded rows merged into one position-ordered sequence.
    pub fn merged_rows(&self) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self.pages.iter().flat_map(|p| p.rows.iter()).collect();
        rows.sort_by_key(|r| r.position);
        rows
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.pages
            .iter()
            .flat_map(|p| p.rows.iter())
            .find(|r| r.id == id)
    }

    pub fn cell(&self, row: RowId, column: ColumnId) -> Option<&Cell> {
        self.pages.iter().find_map(|p| p.cells.get(&(row, column)))
    }

    /// Every loaded cell, in no particular order.
    pub fn iter_cells(&self) -> impl Iterator<Item = &Cell> {
        self.pages.iter().flat_map(|p| p.cells.values())
    }

    /// Insert a row at a position, shifting every loaded row at or after it
    /// across all pages. The row lands in the page that held the previous
    /// occupant of that position, or the last loaded page if none does.
    pub fn insert_row_at(&mut self, position: u32, row: Row, cells: Vec<Cell>) {
        let target = self
            .pages
            .iter()
            .position(|p| p.rows.iter().any(|r| r.position == position))
            .or_else(|| {
                self.pages
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, p)| p.skip)
                    .map(|(i, _)| i)
            });

        for page in &mut self.pages {
            for existing in &mut page.rows {
                if existing.position >= position {
                    existing.position += 1;
                }
            }
        }

        let Some(target) = target else {
            // Nothing loaded yet; start a fresh page so the row is visible.
            let mut cell_map = HashMap::with_capacity(cells.len());
            for cell in cells {
                cell_map.insert((cell.row_id, cell.column_id), cell);
            }
            self.pages.push(Page {
                skip: 0,
                rows: vec![row],
                cells: cell_map,
            });
            return;
        };

        let mut row = row;
        row.position = position;
        let page = &mut self.pages[target];
        let slot = page
            .rows
            .iter()
            .position(|r| r.position > position)
            .unwrap_or(page.rows.len());
        page.rows.insert(slot, row);
        for cell in cells {
            page.cells.insert((cell.row_id, cell.column_id), cell);
        }
    }

    /// Remove a row, decrementing the position of every loaded row after it
    /// across all pages. Returns the row and its cells for rollback use.
    pub fn delete_row(&mut self, id: RowId) -> Option<(Row, Vec<Cell>)> {
        let (page_idx, row_idx) = self.pages.iter().enumerate().find_map(|(pi, p)| {
            p.rows.iter().position(|r| r.id == id).map(|ri| (pi, ri))
        })?;
        let row = self.pages[page_idx].rows.remove(row_idx);

        let mut removed_cells = Vec::new();
        for page in &mut self.pages {
            page.cells.retain(|(r, _), cell| {
                if *r == id {
                    removed_cells.push(cell.clone());
                    false
                } else {
                    true
                }
            });
        }

        for page in &mut self.pages {
            for other in &mut page.rows {
                if other.position > row.position {
                    other.position -= 1;
                }
            }
        }
        Some((row, removed_cells))
    }

    /// Write one cell in place. Returns the previous cell so a failed
    /// mutation can restore exactly its own delta.
    pub fn write_cell(&mut self, row: RowId, column: ColumnId, value: CellValue) -> Option<Cell> {
        for page in &mut self.pages {
            if let Some(cell) = page.cells.get_mut(&(row, column)) {
                let previous = cell.clone();
                cell.value = value;
                return Some(previous);
            }
        }
        None
    }

    /// Put a cell back (rollback or server-confirmed value).
    pub fn restore_cell(&mut self, cell: Cell) {
        for page in &mut self.pages {
            if page.cells.contains_key(&(cell.row_id, cell.column_id))
                || page.rows.iter().any(|r| r.id == cell.row_id)
            {
                page.cells.insert((cell.row_id, cell.column_id), cell);
                return;
            }
        }
    }

    /// Back-fill a typed-null cell under a new column for every resident row
    /// on every loaded page. Pages not yet loaded need no patch; they are
    /// fetched with the column's cells included.
    pub fn patch_new_column(&mut self, column: &Column) {
        for page in &mut self.pages {
            for row in &page.rows {
                page.cells
                    .insert((row.id, column.id), Cell::null(row.id, column.id, column.kind));
            }
        }
    }

    /// Remove every loaded cell under a column. Returns them for rollback.
    pub fn drop_column(&mut self, column: ColumnId) -> Vec<Cell> {
        let mut removed = Vec::new();
        for page in &mut self.pages {
            page.cells.retain(|(_, c), cell| {
                if *c == column {
                    removed.push(cell.clone());
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    /// Restore previously removed cells into the pages that hold their rows.
    pub fn restore_cells(&mut self, cells: Vec<Cell>) {
        for cell in cells {
            self.restore_cell(cell);
        }
    }

    /// Clear every loaded cell under a column to the typed null of the given
    /// kind (column kind change). Returns the previous cells for rollback.
    pub fn clear_column_values(&mut self, column: ColumnId, kind: ColumnKind) -> Vec<Cell> {
        let mut previous = Vec::new();
        for page in &mut self.pages {
            for (key, cell) in page.cells.iter_mut() {
                if key.1 == column {
                    previous.push(cell.clone());
                    cell.value = CellValue::null_for(kind);
                }
            }
        }
        previous
    }

    /// Rewrite a row id everywhere it appears: the row record and every
    /// cell's `row_id`, across all loaded pages.
    pub fn rekey_row(&mut self, from: RowId, to: RowId) -> usize {
        let mut rewritten = 0;
        for page in &mut self.pages {
            for row in &mut page.rows {
                if row.id == from {
                    row.id = to;
                    rewritten += 1;
                }
            }
            let keys: Vec<_> = page
                .cells
                .keys()
                .filter(|(r, _)| *r == from)
                .copied()
                .collect();
            for key in keys {
                let mut cell = page.cells.remove(&key).expect("cell key just listed");
                cell.row_id = to;
                page.cells.insert((to, key.1), cell);
                rewritten += 1;
            }
        }
        if rewritten > 0 {
            self.stats.rows_rekeyed += 1;
        }
        rewritten
    }

    /// Rewrite a column id on every cell that references it, across all
    /// loaded pages.
    pub fn rekey_column(&mut self, from: ColumnId, to: ColumnId) -> usize {
        let mut rewritten = 0;
        for page in &mut self.pages {
            let keys: Vec<_> = page
                .cells
                .keys()
                .filter(|(_, c)| *c == from)
                .copied()
                .collect();
            for key in keys {
                let mut cell = page.cells.remove(&key).expect("cell key just listed");
                cell.column_id = to;
                page.cells.insert((key.0, to), cell);
                rewritten += 1;
            }
        }
        self.stats.cells_rekeyed += rewritten as u64;
        rewritten
    }

    /// Number of loaded references (row records + cell fields) to a row id.
    /// Used to check re-keying completeness.
    pub fn row_references(&self, id: RowId) -> usize {
        self.pages
            .iter()
            .map(|p| {
                p.rows.iter().filter(|r| r.id == id).count()
                    + p.cells.keys().filter(|(r, _)| *r == id).count()
            })
            .sum()
    }

    /// Number of loaded cell references to a column id.
    pub fn column_references(&self, id: ColumnId) -> usize {
        self.pages
            .iter()
            .map(|p| p.cells.keys().filter(|(_, c)| *c == id).count())
            .sum()
    }

    /// The `skip` values of every loaded page, in fetch order.
    pub fn loaded_skips(&self) -> Vec<u32> {
        self.pages.iter().map(|p| p.skip).collect()
    }

    /// Advisory prefetch trigger: the `skip` of the next page to request when
    /// the viewport is within `lookahead` rows of the end of loaded data.
    ///
    /// Duplicate or missed triggers are harmless; `merge_page` is idempotent
    /// for a given `skip` and the session dedupes in-flight fetches.
    pub fn needs_prefetch(&self, viewport_end: u32, lookahead: u32) -> Option<u32> {
        if self.end_reached {
            return None;
        }
        let loaded = self.loaded_row_count();
        if viewport_end.saturating_add(lookahead) < loaded {
            return None;
        }
        Some(loaded)
    }
}
