//! UPDATE statement generation.

use super::{QueryBuilder, Statement};
use crate::error::{Error, Result};
use crate::ident::quote_field;
use crate::value::Value;

impl QueryBuilder<'_> {
    /// `UPDATE t SET a = ?, b = ? WHERE ...`. SET bindings come first, then
    /// the WHERE tree's, matching placeholder order left to right.
    pub(super) fn build_update(&self, assignments: &[(String, Value)]) -> Result<Statement> {
        if assignments.is_empty() {
            return Err(Error::invalid_query("UPDATE requires at least one assignment"));
        }
        let sets: Vec<String> = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", quote_field(self.dialect, column)))
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            quote_field(self.dialect, &self.table),
            sets.join(", ")
        );
        self.append_where(&mut sql);
        let mut bindings: Vec<Value> = assignments
            .iter()
            .map(|(_, value)| value.clone())
            .collect();
        bindings.extend_from_slice(self.wheres.bindings());
        Ok(Statement { sql, bindings })
    }
}
