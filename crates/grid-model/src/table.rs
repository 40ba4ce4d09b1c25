use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TableId;

/// Table-level metadata the engine mutates (rename, star/unstar).
///
/// Row and column data live in the entity store / paginated cache; this is
/// only the header record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub id: TableId,
    pub name: String,
    #[serde(default)]
    pub starred: bool,
    pub created_at: DateTime<Utc>,
}

impl TableMeta {
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            starred: false,
            created_at: Utc::now(),
        }
    }
}
