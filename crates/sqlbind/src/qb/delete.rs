//! DELETE statement generation.

use super::{QueryBuilder, Statement};
use crate::error::Result;
use crate::ident::quote_field;

impl QueryBuilder<'_> {
    /// `DELETE FROM t` plus WHERE, ORDER BY and LIMIT. Deletes never take
    /// joins, grouping or OFFSET; an empty WHERE tree deletes every row.
    pub(super) fn build_delete(&self) -> Result<Statement> {
        let mut sql = format!("DELETE FROM {}", quote_field(self.dialect, &self.table));
        self.append_where(&mut sql);
        self.append_order_by(&mut sql);
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(Statement {
            sql,
            bindings: self.wheres.bindings().to_vec(),
        })
    }
}
