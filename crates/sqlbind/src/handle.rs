//! Database handle abstraction.
//!
//! The builder never talks to a driver directly; it renders SQL with `?`
//! placeholders plus an ordered binding list and hands both to a
//! [`DatabaseHandle`]. Implementations translate that pair into whatever the
//! underlying driver expects and report results back as [`Row`]s.

use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

/// Synchronous connection surface the builder executes against.
///
/// Driver errors returned from these methods propagate through the builder
/// unchanged; the builder adds no retry or translation layer on top.
pub trait DatabaseHandle {
    /// Driver identifier used to pick the SQL dialect, e.g. `"mysql"`,
    /// `"pgsql"` or `"sqlite"`.
    fn driver_name(&self) -> &str;

    /// Server version string as reported by the backend.
    fn server_version(&self) -> String;

    /// Run a statement that returns no rows; yields the affected-row count.
    fn execute(&self, sql: &str, bindings: &[Value]) -> Result<u64>;

    /// Run a statement that returns rows.
    fn query(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>>;

    /// Identifier generated by the most recent insert on this handle.
    fn last_insert_id(&self) -> Result<i64>;
}

/// One result row: column names shared across the result set, values owned
/// per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Row {
        Row { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value under `name`, or `None` when the result set has no such column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.values.get(index)
    }

    /// Value at `index` in result-set order.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name_and_index() {
        let columns = Arc::new(vec!["id".to_string(), "name".to_string()]);
        let row = Row::new(columns, vec![Value::Integer(7), Value::Text("ada".into())]);
        assert_eq!(row.get("id"), Some(&Value::Integer(7)));
        assert_eq!(row.get_index(1), Some(&Value::Text("ada".into())));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_index(9), None);
    }
}
