use serde::{Deserialize, Serialize};

use crate::{ColumnId, ColumnKind, RowId};

/// The value held by a cell.
///
/// Exactly one side of the text/number pair exists; the discriminant is the
/// owning column's [`ColumnKind`]. A `None` payload is the typed null that
/// back-fills cells when rows or columns are created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    Text(Option<String>),
    Number(Option<f64>),
}

impl CellValue {
    /// The typed null for a column of the given kind.
    pub const fn null_for(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Text => CellValue::Text(None),
            ColumnKind::Number => CellValue::Number(None),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(Some(value.into()))
    }

    pub const fn number(value: f64) -> Self {
        CellValue::Number(Some(value))
    }

    /// The column kind this value is shaped for.
    pub const fn kind(&self) -> ColumnKind {
        match self {
            CellValue::Text(_) => ColumnKind::Text,
            CellValue::Number(_) => ColumnKind::Number,
        }
    }

    /// Whether this value is shaped for a column of the given kind.
    pub const fn matches(&self, kind: ColumnKind) -> bool {
        matches!(
            (self, kind),
            (CellValue::Text(_), ColumnKind::Text) | (CellValue::Number(_), ColumnKind::Number)
        )
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, CellValue::Text(None) | CellValue::Number(None))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub const fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(Some(n)) => Some(*n),
            _ => None,
        }
    }
}

/// A single cell, keyed by `(row_id, column_id)` and unique per pair.
///
/// A cell exists for every (existing row, existing column) pair: creating a
/// column back-fills typed nulls for all current rows, and creating a row
/// back-fills typed nulls for all current columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub value: CellValue,
}

impl Cell {
    pub fn new(row_id: RowId, column_id: ColumnId, value: CellValue) -> Self {
        Self {
            row_id,
            column_id,
            value,
        }
    }

    /// A typed-null cell for the given pair.
    pub fn null(row_id: RowId, column_id: ColumnId, kind: ColumnKind) -> Self {
        Self::new(row_id, column_id, CellValue::null_for(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kind_discrimination() {
        assert!(CellValue::text("a").matches(ColumnKind::Text));
        assert!(!CellValue::text("a").matches(ColumnKind::Number));
        assert!(CellValue::Number(None).matches(ColumnKind::Number));
        assert!(CellValue::null_for(ColumnKind::Text).is_null());
    }

    #[test]
    fn value_serde_shape() {
        let json = serde_json::to_value(CellValue::number(4.5)).expect("serialize");
        assert_eq!(json, serde_json::json!({ "number": 4.5 }));
        let json = serde_json::to_value(CellValue::Text(None)).expect("serialize");
        assert_eq!(json, serde_json::json!({ "text": null }));
    }
}
