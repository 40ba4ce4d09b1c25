use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RowId, TableId};

/// A row within a table.
///
/// `position` is a dense 0-based rank among the rows of the same table,
/// independent of how the rows are paginated on the wire. At rest, the
/// positions of a table with N rows are exactly `{0, …, N-1}`; transient gaps
/// are permitted mid-mutation but must be closed before the mutation settles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub table_id: TableId,
    pub position: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Row {
    /// Create a row stamped with the current time.
    pub fn new(id: RowId, table_id: TableId, position: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            table_id,
            position,
            created_at: now,
            updated_at: now,
        }
    }
}
