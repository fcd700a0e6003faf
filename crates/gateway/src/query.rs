//! Select queries against the remote store.
//!
//! Only what the locator needs: equality filters combined with AND, and
//! ascending/descending ordering on named columns. The same query value is
//! evaluated in memory (`InMemoryGateway`) or rendered as PostgREST query
//! parameters (`PostgrestGateway`).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use pharmloc_core::{SectionCode, ShelfRow};
use pharmloc_inventory::InventoryRecord;

use crate::error::GatewayError;

/// Table holding one row per inventory record.
pub const INVENTORY_TABLE: &str = "inventory_items";

pub const COL_SECTION: &str = "section";
pub const COL_ROW: &str = "row";
pub const COL_BIN: &str = "bin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Int(i64),
    Text(String),
}

impl FilterValue {
    fn matches(&self, value: &JsonValue) -> bool {
        match (self, value) {
            (FilterValue::Int(n), JsonValue::Number(v)) => v.as_i64() == Some(*n),
            (FilterValue::Text(s), JsonValue::String(v)) => v == s,
            (FilterValue::Text(s), JsonValue::Number(v)) => v.to_string() == *s,
            _ => false,
        }
    }
}

impl core::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FilterValue::Int(n) => write!(f, "{n}"),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&SectionCode> for FilterValue {
    fn from(value: &SectionCode) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<ShelfRow> for FilterValue {
    fn from(value: ShelfRow) -> Self {
        Self::Int(value.get() as i64)
    }
}

/// `column = value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: FilterValue,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// `select * from <table> where <filters, ANDed> order by <order>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
}

impl SelectQuery {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction: Direction::Asc,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            direction: Direction::Desc,
        });
        self
    }

    /// Whole inventory `table`, ordered by `(section, row, bin)` ascending.
    pub fn all_inventory(table: impl Into<String>) -> Self {
        Self::from(table)
            .order_asc(COL_SECTION)
            .order_asc(COL_ROW)
            .order_asc(COL_BIN)
    }

    /// Everything on one shelf: `section = zone AND row = row`.
    pub fn shelf(table: impl Into<String>, zone: &SectionCode, row: ShelfRow) -> Self {
        Self::from(table).eq(COL_SECTION, zone).eq(COL_ROW, row)
    }

    /// Does `row` (as stored, i.e. a JSON object) satisfy every filter?
    pub fn matches_row(&self, row: &JsonValue) -> bool {
        self.filters.iter().all(|f| {
            row.get(&f.column)
                .is_some_and(|value| f.value.matches(value))
        })
    }

    /// Compare two stored rows by this query's ordering. Nulls sort last.
    pub fn compare_rows(&self, a: &JsonValue, b: &JsonValue) -> Ordering {
        for key in &self.order {
            let left = a.get(&key.column).unwrap_or(&JsonValue::Null);
            let right = b.get(&key.column).unwrap_or(&JsonValue::Null);
            let ord = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = compare_values(left, right);
                    match key.direction {
                        Direction::Asc => ord,
                        Direction::Desc => ord.reverse(),
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Evaluate the query over records held in memory. Ordering is stable.
    pub fn evaluate(&self, records: &[InventoryRecord]) -> Result<Vec<InventoryRecord>, GatewayError> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let row = serde_json::to_value(record).map_err(|e| GatewayError::Decode(e.to_string()))?;
            if self.matches_row(&row) {
                rows.push((row, record));
            }
        }
        rows.sort_by(|(a, _), (b, _)| self.compare_rows(a, b));
        Ok(rows.into_iter().map(|(_, r)| r.clone()).collect())
    }

    /// PostgREST query parameters, e.g. `section=eq.H&order=section.asc,row.asc`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(
            self.filters
                .iter()
                .map(|f| (f.column.clone(), format!("eq.{}", f.value))),
        );
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, o.direction.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }
        pairs
    }
}

fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
