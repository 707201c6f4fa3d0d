//! INSERT and upsert statement generation.
//!
//! Upserts reuse the plain INSERT body and append a dialect-specific conflict
//! clause: `ON DUPLICATE KEY UPDATE` for MySQL (with the `VALUES(col)` or
//! row-alias form depending on server version) and `ON CONFLICT ... DO UPDATE`
//! for Postgres and SQLite. Unrecognized drivers cannot upsert and fail at
//! generation time.

use super::{QueryBuilder, Statement};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::quote_field;
use crate::value::Value;

impl QueryBuilder<'_> {
    pub(super) fn build_insert(
        &self,
        columns: &[String],
        values: &[Value],
        rows: usize,
    ) -> Result<Statement> {
        let sql = self.insert_sql(columns, rows, false)?;
        Ok(Statement {
            sql,
            bindings: values.to_vec(),
        })
    }

    pub(super) fn build_upsert(
        &self,
        columns: &[String],
        values: &[Value],
        rows: usize,
        keys: &[String],
    ) -> Result<Statement> {
        let clause = conflict_clause(self.dialect, self.handle.driver_name(), columns, keys)?;
        let alias_rows = matches!(self.dialect, Dialect::MySql { values_alias: true });
        let mut sql = self.insert_sql(columns, rows, alias_rows)?;
        sql.push_str(&clause);
        Ok(Statement {
            sql,
            bindings: values.to_vec(),
        })
    }

    /// `INSERT INTO t (cols) VALUES (?, ...), ...`, with one placeholder
    /// group per row. `alias_rows` appends the MySQL 8.0.20+ row alias the
    /// conflict clause refers back to.
    fn insert_sql(&self, columns: &[String], rows: usize, alias_rows: bool) -> Result<String> {
        if columns.is_empty() {
            return Err(Error::invalid_query("INSERT requires at least one column"));
        }
        if rows == 0 {
            return Err(Error::invalid_query("INSERT requires at least one row"));
        }
        let quoted: Vec<String> = columns
            .iter()
            .map(|column| quote_field(self.dialect, column))
            .collect();
        let group = format!("({})", vec!["?"; columns.len()].join(", "));
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_field(self.dialect, &self.table),
            quoted.join(", "),
            vec![group; rows].join(", ")
        );
        if alias_rows {
            sql.push_str(" AS new");
        }
        Ok(sql)
    }
}

/// Render the conflict clause updating every non-key column from the
/// incoming row.
fn conflict_clause(
    dialect: Dialect,
    driver: &str,
    columns: &[String],
    keys: &[String],
) -> Result<String> {
    if keys.is_empty() {
        return Err(Error::invalid_query("UPSERT requires at least one key column"));
    }
    let updates: Vec<String> = columns
        .iter()
        .filter(|column| !keys.contains(column))
        .map(|column| quote_field(dialect, column))
        .collect();
    if updates.is_empty() {
        return Err(Error::invalid_query(
            "UPSERT requires at least one non-key column to update",
        ));
    }
    match dialect {
        Dialect::MySql { values_alias } => {
            let assignments: Vec<String> = updates
                .iter()
                .map(|quoted| {
                    if values_alias {
                        format!("{quoted} = new.{quoted}")
                    } else {
                        format!("{quoted} = VALUES({quoted})")
                    }
                })
                .collect();
            Ok(format!(" ON DUPLICATE KEY UPDATE {}", assignments.join(", ")))
        }
        Dialect::Postgres | Dialect::Sqlite => {
            let targets: Vec<String> = keys.iter().map(|key| quote_field(dialect, key)).collect();
            let assignments: Vec<String> = updates
                .iter()
                .map(|quoted| format!("{quoted} = excluded.{quoted}"))
                .collect();
            Ok(format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                targets.join(", "),
                assignments.join(", ")
            ))
        }
        Dialect::Unknown => Err(Error::UnsupportedDialect(driver.to_string())),
    }
}
