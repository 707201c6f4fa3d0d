//! SELECT and EXISTS statement generation.

use super::{QueryBuilder, Statement};
use crate::error::Result;
use crate::ident::quote_field;
use crate::value::Value;

impl QueryBuilder<'_> {
    pub(super) fn build_select(&self) -> Result<Statement> {
        let mut sql = String::from("SELECT ");
        if self.fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.fields.join(", "));
        }
        self.select_tail(&mut sql)?;
        Ok(Statement {
            sql,
            bindings: self.read_bindings(),
        })
    }

    /// The row inside EXISTS never leaves the database, so the inner
    /// projection is a constant.
    pub(super) fn build_exists(&self) -> Result<Statement> {
        let mut inner = String::from("SELECT 1");
        self.select_tail(&mut inner)?;
        Ok(Statement {
            sql: format!("SELECT EXISTS({inner})"),
            bindings: self.read_bindings(),
        })
    }

    /// Everything after the projection, in canonical clause order.
    fn select_tail(&self, sql: &mut String) -> Result<()> {
        sql.push_str(" FROM ");
        sql.push_str(&quote_field(self.dialect, &self.table));
        self.render_joins(sql)?;
        self.append_where(sql);
        self.append_group_by(sql);
        self.append_having(sql);
        self.append_order_by(sql);
        self.append_limit_offset(sql);
        Ok(())
    }

    /// Bindings in placeholder order: join ON trees first (joins render ahead
    /// of WHERE), then WHERE, then HAVING. `on`/`or_on` compare identifiers
    /// and bind nothing, but group callbacks may bind values into an ON tree.
    fn read_bindings(&self) -> Vec<Value> {
        let mut bindings = Vec::new();
        for join in &self.joins {
            bindings.extend_from_slice(join.on.bindings());
        }
        bindings.extend_from_slice(self.wheres.bindings());
        bindings.extend_from_slice(self.havings.bindings());
        bindings
    }
}
