use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ColumnId, TableId};

/// Minimum column width in pixels.
pub const MIN_COLUMN_WIDTH: u32 = 60;

/// Maximum column width in pixels.
pub const MAX_COLUMN_WIDTH: u32 = 1000;

/// Default width for newly created columns.
pub const DEFAULT_COLUMN_WIDTH: u32 = 180;

/// Maximum column name length in characters.
pub const MAX_COLUMN_NAME_LEN: usize = 255;

/// Errors raised when creating or mutating a column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    #[error("column name cannot be empty")]
    EmptyName,
    #[error("column name exceeds the {MAX_COLUMN_NAME_LEN} character limit")]
    NameTooLong,
    #[error("column width {width} is outside {MIN_COLUMN_WIDTH}..={MAX_COLUMN_WIDTH}")]
    WidthOutOfRange { width: u32 },
}

/// The value discriminant for a column and all of its cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Number,
}

/// A typed column within a table.
///
/// `position` is a dense 0-based rank among the columns of the same table: no
/// two columns share a position, and deleting a column re-densifies the ranks
/// of everything after it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub table_id: TableId,
    pub name: String,
    pub kind: ColumnKind,
    pub position: u32,
    #[serde(default = "default_width")]
    pub width: u32,
}

fn default_width() -> u32 {
    DEFAULT_COLUMN_WIDTH
}

/// Validate a column name: non-empty after trimming, bounded length.
pub fn validate_column_name(name: &str) -> Result<(), ColumnError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ColumnError::EmptyName);
    }
    if name.chars().count() > MAX_COLUMN_NAME_LEN {
        return Err(ColumnError::NameTooLong);
    }
    Ok(())
}

/// Validate a column width against the allowed pixel range.
pub fn validate_column_width(width: u32) -> Result<(), ColumnError> {
    if !(MIN_COLUMN_WIDTH..=MAX_COLUMN_WIDTH).contains(&width) {
        return Err(ColumnError::WidthOutOfRange { width });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert_eq!(validate_column_name("  "), Err(ColumnError::EmptyName));
        assert_eq!(
            validate_column_name(&"x".repeat(256)),
            Err(ColumnError::NameTooLong)
        );
        assert_eq!(validate_column_name("Amount"), Ok(()));
    }

    #[test]
    fn width_validation() {
        assert_eq!(
            validate_column_width(59),
            Err(ColumnError::WidthOutOfRange { width: 59 })
        );
        assert_eq!(
            validate_column_width(1001),
            Err(ColumnError::WidthOutOfRange { width: 1001 })
        );
        assert_eq!(validate_column_width(60), Ok(()));
        assert_eq!(validate_column_width(1000), Ok(()));
    }
}
