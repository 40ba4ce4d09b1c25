use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CellValue, ColumnId, TableId, ViewId};

/// A literal a filter criterion compares against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatchKind {
    Contains,
    BeginsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    pub kind: TextMatchKind,
    pub pattern: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberComparison {
    GreaterThan(f64),
    GreaterThanOrEqual(f64),
    LessThan(f64),
    LessThanOrEqual(f64),
    Between { min: f64, max: f64 },
    NotEqual(f64),
}

/// A single filter criterion against one column's cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCriterion {
    Equals(FilterValue),
    TextMatch(TextMatch),
    Number(NumberComparison),
    IsEmpty,
    IsNotEmpty,
}

/// A filter over one column. A row passes the view when it passes every
/// filter (logical AND across columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column_id: ColumnId,
    pub criterion: FilterCriterion,
}

/// Sort key within a view. Earlier entries take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub column_id: ColumnId,
    #[serde(default)]
    pub descending: bool,
}

/// The filter/sort/hidden-column configuration a view persists.
///
/// This is exactly what is needed to derive a row subset, order, and visible
/// column set; it stores no row data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden: Vec<ColumnId>,
}

/// A saved view over a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: ViewId,
    pub table_id: TableId,
    pub name: String,
    #[serde(default)]
    pub config: ViewConfig,
    pub created_at: DateTime<Utc>,
}

impl View {
    pub fn new(id: ViewId, table_id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            table_id,
            name: name.into(),
            config: ViewConfig::default(),
            created_at: Utc::now(),
        }
    }
}

impl FilterCriterion {
    /// Evaluate this criterion against a cell value. A missing cell is
    /// treated as a typed null.
    pub fn matches(&self, value: Option<&CellValue>) -> bool {
        let is_empty = value.map_or(true, CellValue::is_null);
        match self {
            FilterCriterion::IsEmpty => is_empty,
            FilterCriterion::IsNotEmpty => !is_empty,
            FilterCriterion::Equals(expected) => match (expected, value) {
                (FilterValue::Text(t), Some(CellValue::Text(Some(s)))) => s.eq_ignore_ascii_case(t),
                (FilterValue::Number(n), Some(CellValue::Number(Some(v)))) => v == n,
                _ => false,
            },
            FilterCriterion::TextMatch(m) => {
                let Some(CellValue::Text(Some(s))) = value else {
                    return false;
                };
                let (haystack, needle) = if m.case_sensitive {
                    (s.clone(), m.pattern.clone())
                } else {
                    (s.to_lowercase(), m.pattern.to_lowercase())
                };
                match m.kind {
                    TextMatchKind::Contains => haystack.contains(&needle),
                    TextMatchKind::BeginsWith => haystack.starts_with(&needle),
                    TextMatchKind::EndsWith => haystack.ends_with(&needle),
                }
            }
            FilterCriterion::Number(cmp) => {
                let Some(CellValue::Number(Some(v))) = value else {
                    return false;
                };
                match *cmp {
                    NumberComparison::GreaterThan(n) => *v > n,
                    NumberComparison::GreaterThanOrEqual(n) => *v >= n,
                    NumberComparison::LessThan(n) => *v < n,
                    NumberComparison::LessThanOrEqual(n) => *v <= n,
                    NumberComparison::Between { min, max } => *v >= min && *v <= max,
                    NumberComparison::NotEqual(n) => *v != n,
                }
            }
        }
    }
}

impl ViewConfig {
    /// Whether a row passes all of this view's filters.
    ///
    /// `cell` resolves a column id to the row's cell value (or `None` when
    /// the cell is not resident).
    pub fn matches_row<'a>(&self, cell: impl Fn(ColumnId) -> Option<&'a CellValue>) -> bool {
        self.filters
            .iter()
            .all(|f| f.criterion.matches(cell(f.column_id)))
    }

    /// Compare two rows under this view's sort keys. Nulls sort last within
    /// each key; ties fall through to the next key.
    pub fn compare_rows<'a>(
        &self,
        left: impl Fn(ColumnId) -> Option<&'a CellValue>,
        right: impl Fn(ColumnId) -> Option<&'a CellValue>,
    ) -> Ordering {
        for sort in &self.sorts {
            let ord = compare_values(left(sort.column_id), right(sort.column_id));
            let ord = if sort.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn is_hidden(&self, column_id: ColumnId) -> bool {
        self.hidden.contains(&column_id)
    }
}

fn compare_values(left: Option<&CellValue>, right: Option<&CellValue>) -> Ordering {
    match (left, right) {
        (Some(CellValue::Text(Some(a))), Some(CellValue::Text(Some(b)))) => {
            a.to_lowercase().cmp(&b.to_lowercase())
        }
        (Some(CellValue::Number(Some(a))), Some(CellValue::Number(Some(b)))) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (l, r) => {
            let l_null = l.map_or(true, CellValue::is_null);
            let r_null = r.map_or(true, CellValue::is_null);
            match (l_null, r_null) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                // Mixed kinds under one sort key; treat as equal rather than
                // inventing a cross-kind order.
                (false, false) => Ordering::Equal,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnKind;

    #[test]
    fn criterion_text_match() {
        let m = FilterCriterion::TextMatch(TextMatch {
            kind: TextMatchKind::Contains,
            pattern: "GRID".into(),
            case_sensitive: false,
        });
        assert!(m.matches(Some(&CellValue::text("a gridbase table"))));
        assert!(!m.matches(Some(&CellValue::text("spreadsheet"))));
        assert!(!m.matches(Some(&CellValue::number(1.0))));
        assert!(!m.matches(None));
    }

    #[test]
    fn criterion_empty_handling() {
        assert!(FilterCriterion::IsEmpty.matches(None));
        assert!(FilterCriterion::IsEmpty.matches(Some(&CellValue::null_for(ColumnKind::Text))));
        assert!(!FilterCriterion::IsEmpty.matches(Some(&CellValue::number(0.0))));
        assert!(FilterCriterion::IsNotEmpty.matches(Some(&CellValue::text(""))));
    }

    #[test]
    fn sort_nulls_last() {
        let a = CellValue::number(1.0);
        let config = ViewConfig {
            sorts: vec![Sort {
                column_id: ColumnId::mint_temporary(),
                descending: false,
            }],
            ..ViewConfig::default()
        };
        let col = config.sorts[0].column_id;
        let left = |id: ColumnId| (id == col).then_some(&a);
        let right = |_: ColumnId| None;
        assert_eq!(config.compare_rows(left, right), Ordering::Less);
    }

    #[test]
    fn config_serde_snapshot_is_stable() {
        let config = ViewConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        assert_eq!(json, "{}");
        let back: ViewConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
