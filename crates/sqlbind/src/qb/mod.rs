//! Fluent query builder.
//!
//! A [`QueryBuilder`] accumulates clause state (projection, predicate trees,
//! joins, ordering, paging) through chainable methods, then a terminal call
//! picks the statement kind, renders SQL for the handle's dialect and executes
//! it. Rendering always happens through an immutable [`Statement`] so the SQL
//! text and its bindings travel together.

mod delete;
mod insert;
mod select;
mod update;


use std::time::Instant;

use serde_json::Value as Json;

use crate::clause::Predicate;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::handle::{DatabaseHandle, Row};
use crate::ident::quote_field;
use crate::record::{self, Record};
use crate::value::Value;

/// Join flavor, rendered verbatim into the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// One joined table plus its ON predicate tree.
#[derive(Debug, Clone)]
struct Join {
    table: String,
    alias: Option<String>,
    kind: JoinKind,
    on: Predicate,
}

/// Statement kind the next terminal renders, including the per-kind payload.
///
/// Keeping the payload in the variant means `statement()` can render whatever
/// the builder currently holds without consulting flags elsewhere.
#[derive(Debug, Clone, PartialEq, Default)]
enum Action {
    #[default]
    Select,
    Exists,
    Insert {
        columns: Vec<String>,
        values: Vec<Value>,
        rows: usize,
    },
    Upsert {
        columns: Vec<String>,
        values: Vec<Value>,
        rows: usize,
        keys: Vec<String>,
    },
    Update {
        assignments: Vec<(String, Value)>,
    },
    Delete,
}

/// A rendered statement: SQL with `?` placeholders and the bindings that fill
/// them, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Value>,
}

/// Clause-accumulating builder bound to one table on one handle.
///
/// Terminals reuse whatever clause state has accumulated; `select_single`,
/// `count` and `exists` adjust that state (limit, projection) and nothing
/// restores it afterwards. Call [`reset`](Self::reset) before building a
/// different query on the same instance.
///
/// ```ignore
/// let mut qb = QueryBuilder::new(&handle, "users");
/// qb.where_("status", "=", "active")?
///     .where_group(|g| {
///         g.where_("age", ">=", 18)?;
///         g.or_where("verified", "=", true)?;
///         Ok(())
///     })?
///     .order_by_desc("created_at")
///     .limit(20);
/// let rows = qb.select_many()?;
/// ```
pub struct QueryBuilder<'h> {
    handle: &'h dyn DatabaseHandle,
    dialect: Dialect,
    table: String,
    fields: Vec<String>,
    wheres: Predicate,
    havings: Predicate,
    joins: Vec<Join>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    action: Action,
}

impl std::fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("dialect", &self.dialect)
            .field("action", &self.action)
            .field("wheres", &self.wheres)
            .field("joins", &self.joins)
            .finish_non_exhaustive()
    }
}

impl<'h> QueryBuilder<'h> {
    /// Bind a builder to `table` on `handle`. The dialect is decided here,
    /// once, from the handle's driver name and server version.
    pub fn new(handle: &'h dyn DatabaseHandle, table: impl Into<String>) -> QueryBuilder<'h> {
        let dialect = Dialect::from_driver(handle.driver_name(), &handle.server_version());
        QueryBuilder {
            handle,
            dialect,
            table: table.into(),
            fields: Vec::new(),
            wheres: Predicate::new(dialect),
            havings: Predicate::new(dialect),
            joins: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            action: Action::default(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Replace the SELECT projection. Entries are emitted verbatim, so
    /// expressions like `COUNT(*) AS total` or `age AS userAge` pass through
    /// unchanged; an empty projection renders `*`.
    pub fn fields(&mut self, fields: &[&str]) -> &mut Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    // ==================== WHERE ====================

    /// `field <op> ?` joined with AND. The operator is checked against the
    /// allow-list here, before any SQL exists.
    pub fn where_(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.wheres.where_(field, operator, value)?;
        Ok(self)
    }

    pub fn or_where(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.wheres.or_where(field, operator, value)?;
        Ok(self)
    }

    pub fn where_null(&mut self, field: &str) -> &mut Self {
        self.wheres.where_null(field);
        self
    }

    pub fn or_where_null(&mut self, field: &str) -> &mut Self {
        self.wheres.or_where_null(field);
        self
    }

    pub fn where_not_null(&mut self, field: &str) -> &mut Self {
        self.wheres.where_not_null(field);
        self
    }

    pub fn or_where_not_null(&mut self, field: &str) -> &mut Self {
        self.wheres.or_where_not_null(field);
        self
    }

    pub fn where_between(
        &mut self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.wheres.where_between(field, low, high);
        self
    }

    pub fn where_not_between(
        &mut self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.wheres.where_not_between(field, low, high);
        self
    }

    pub fn where_in<T: Into<Value>>(&mut self, field: &str, values: Vec<T>) -> &mut Self {
        self.wheres.where_in(field, values);
        self
    }

    pub fn where_not_in<T: Into<Value>>(&mut self, field: &str, values: Vec<T>) -> &mut Self {
        self.wheres.where_not_in(field, values);
        self
    }

    /// Append a raw WHERE fragment verbatim. No quoting, no bindings.
    pub fn where_raw(&mut self, expr: &str) -> &mut Self {
        self.wheres.where_raw(expr);
        self
    }

    pub fn or_where_raw(&mut self, expr: &str) -> &mut Self {
        self.wheres.or_where_raw(expr);
        self
    }

    /// Raw fragment plus its bindings; the fragment's `?` count must equal
    /// `values.len()`.
    pub fn where_template(&mut self, expr: &str, values: Vec<Value>) -> &mut Self {
        self.wheres.where_template(expr, values);
        self
    }

    /// Group the clauses built by `build` in parentheses, joined with AND.
    /// A callback that appends nothing emits nothing.
    pub fn where_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.wheres.where_group(build)?;
        Ok(self)
    }

    pub fn or_where_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.wheres.or_where_group(build)?;
        Ok(self)
    }

    // ==================== HAVING ====================

    /// HAVING mirror of [`where_`](Self::where_); same operators, same
    /// binding rules, rendered after GROUP BY.
    pub fn having(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.havings.where_(field, operator, value)?;
        Ok(self)
    }

    pub fn or_having(
        &mut self,
        field: &str,
        operator: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.havings.or_where(field, operator, value)?;
        Ok(self)
    }

    pub fn having_null(&mut self, field: &str) -> &mut Self {
        self.havings.where_null(field);
        self
    }

    pub fn or_having_null(&mut self, field: &str) -> &mut Self {
        self.havings.or_where_null(field);
        self
    }

    pub fn having_not_null(&mut self, field: &str) -> &mut Self {
        self.havings.where_not_null(field);
        self
    }

    pub fn or_having_not_null(&mut self, field: &str) -> &mut Self {
        self.havings.or_where_not_null(field);
        self
    }

    pub fn having_between(
        &mut self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.havings.where_between(field, low, high);
        self
    }

    pub fn having_not_between(
        &mut self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.havings.where_not_between(field, low, high);
        self
    }

    pub fn having_in<T: Into<Value>>(&mut self, field: &str, values: Vec<T>) -> &mut Self {
        self.havings.where_in(field, values);
        self
    }

    pub fn having_not_in<T: Into<Value>>(&mut self, field: &str, values: Vec<T>) -> &mut Self {
        self.havings.where_not_in(field, values);
        self
    }

    /// Raw HAVING fragment, typically an aggregate: `SUM(qty) > 10`.
    pub fn having_raw(&mut self, expr: &str) -> &mut Self {
        self.havings.where_raw(expr);
        self
    }

    pub fn or_having_raw(&mut self, expr: &str) -> &mut Self {
        self.havings.or_where_raw(expr);
        self
    }

    pub fn having_template(&mut self, expr: &str, values: Vec<Value>) -> &mut Self {
        self.havings.where_template(expr, values);
        self
    }

    pub fn having_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.havings.where_group(build)?;
        Ok(self)
    }

    pub fn or_having_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.havings.or_where_group(build)?;
        Ok(self)
    }

    // ==================== joins ====================

    /// Join `table` with the given kind. Subsequent [`on`](Self::on) calls
    /// attach to this join until another join starts.
    pub fn join(&mut self, table: &str, kind: JoinKind) -> &mut Self {
        self.push_join(table, None, kind)
    }

    pub fn join_as(&mut self, table: &str, alias: &str, kind: JoinKind) -> &mut Self {
        self.push_join(table, Some(alias), kind)
    }

    pub fn inner_join(&mut self, table: &str) -> &mut Self {
        self.push_join(table, None, JoinKind::Inner)
    }

    pub fn left_join(&mut self, table: &str) -> &mut Self {
        self.push_join(table, None, JoinKind::Left)
    }

    pub fn left_join_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.push_join(table, Some(alias), JoinKind::Left)
    }

    pub fn right_join(&mut self, table: &str) -> &mut Self {
        self.push_join(table, None, JoinKind::Right)
    }

    pub fn right_join_as(&mut self, table: &str, alias: &str) -> &mut Self {
        self.push_join(table, Some(alias), JoinKind::Right)
    }

    fn push_join(&mut self, table: &str, alias: Option<&str>, kind: JoinKind) -> &mut Self {
        self.joins.push(Join {
            table: table.to_string(),
            alias: alias.map(str::to_string),
            kind,
            on: Predicate::new(self.dialect),
        });
        self
    }

    /// `left <op> right` on the most recent join; both sides are quoted as
    /// identifiers and nothing is bound.
    pub fn on(&mut self, left: &str, operator: &str, right: &str) -> Result<&mut Self> {
        self.current_join()?.on.on(left, operator, right)?;
        Ok(self)
    }

    pub fn or_on(&mut self, left: &str, operator: &str, right: &str) -> Result<&mut Self> {
        self.current_join()?.on.or_on(left, operator, right)?;
        Ok(self)
    }

    pub fn on_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.current_join()?.on.where_group(build)?;
        Ok(self)
    }

    pub fn or_on_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Predicate) -> Result<()>,
    {
        self.current_join()?.on.or_where_group(build)?;
        Ok(self)
    }

    fn current_join(&mut self) -> Result<&mut Join> {
        self.joins.last_mut().ok_or(Error::OnWithoutJoin)
    }

    // ==================== ordering and paging ====================

    pub fn order_by_asc(&mut self, field: &str) -> &mut Self {
        let rendered = format!("{} ASC", quote_field(self.dialect, field));
        self.order_by.push(rendered);
        self
    }

    pub fn order_by_desc(&mut self, field: &str) -> &mut Self {
        let rendered = format!("{} DESC", quote_field(self.dialect, field));
        self.order_by.push(rendered);
        self
    }

    pub fn group_by(&mut self, field: &str) -> &mut Self {
        let quoted = quote_field(self.dialect, field);
        self.group_by.push(quoted);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Clear all accumulated clause state. The table, handle and dialect
    /// survive; everything else returns to its post-`new` value.
    pub fn reset(&mut self) -> &mut Self {
        self.fields.clear();
        self.wheres = Predicate::new(self.dialect);
        self.havings = Predicate::new(self.dialect);
        self.joins.clear();
        self.group_by.clear();
        self.order_by.clear();
        self.limit = None;
        self.offset = None;
        self.action = Action::default();
        self
    }

    // ==================== rendering ====================

    /// Render the statement for the current action without executing it.
    pub fn statement(&self) -> Result<Statement> {
        match &self.action {
            Action::Select => self.build_select(),
            Action::Exists => self.build_exists(),
            Action::Insert {
                columns,
                values,
                rows,
            } => self.build_insert(columns, values, *rows),
            Action::Upsert {
                columns,
                values,
                rows,
                keys,
            } => self.build_upsert(columns, values, *rows, keys),
            Action::Update { assignments } => self.build_update(assignments),
            Action::Delete => self.build_delete(),
        }
    }

    /// SQL text of [`statement`](Self::statement), for logging or inspection.
    pub fn to_sql(&self) -> Result<String> {
        Ok(self.statement()?.sql)
    }

    fn render_joins(&self, sql: &mut String) -> Result<()> {
        for join in &self.joins {
            if join.on.is_empty() {
                return Err(Error::JoinWithoutOn(join.table.clone()));
            }
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(&quote_field(self.dialect, &join.table));
            if let Some(alias) = &join.alias {
                sql.push_str(" AS ");
                sql.push_str(&quote_field(self.dialect, alias));
            }
            sql.push_str(" ON ");
            sql.push_str(&join.on.render());
        }
        Ok(())
    }

    fn append_where(&self, sql: &mut String) {
        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.wheres.render());
        }
    }

    fn append_group_by(&self, sql: &mut String) {
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
    }

    fn append_having(&self, sql: &mut String) {
        if !self.havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&self.havings.render());
        }
    }

    fn append_order_by(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
    }

    fn append_limit_offset(&self, sql: &mut String) {
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    // ==================== terminals ====================

    /// Execute the accumulated query and return every row.
    pub fn select_many(&mut self) -> Result<Vec<Row>> {
        self.action = Action::Select;
        let statement = self.statement()?;
        self.run_query(statement)
    }

    /// `select_many` hydrated into `T`.
    pub fn select_many_as<T: Record>(&mut self) -> Result<Vec<T>> {
        let rows = self.select_many()?;
        record::hydrate_all(&rows)
    }

    /// Execute with `LIMIT 1` and return the first row, if any.
    pub fn select_single(&mut self) -> Result<Option<Row>> {
        self.limit = Some(1);
        let rows = self.select_many()?;
        Ok(rows.into_iter().next())
    }

    /// `select_single` hydrated into `T`.
    pub fn select_single_as<T: Record>(&mut self) -> Result<Option<T>> {
        match self.select_single()? {
            Some(row) => Ok(Some(record::hydrate_one(&row)?)),
            None => Ok(None),
        }
    }

    /// Insert one row per JSON object. An explicit [`fields`](Self::fields)
    /// list fixes the columns; otherwise the first row's keys do. Returns the
    /// affected-row count.
    pub fn insert_many(&mut self, rows: &[Json]) -> Result<u64> {
        let (columns, values) = normalize_rows(&self.fields, rows)?;
        self.action = Action::Insert {
            columns,
            values,
            rows: rows.len(),
        };
        let statement = self.statement()?;
        self.run_execute(statement)
    }

    /// Insert one row and return the identifier the handle generated for it.
    pub fn insert_single(&mut self, row: &Json) -> Result<i64> {
        self.insert_many(std::slice::from_ref(row))?;
        self.handle.last_insert_id()
    }

    /// Insert rows, updating every non-key column on conflict with `keys`.
    /// The conflict clause is the dialect's; unrecognized drivers error here.
    pub fn upsert_many(&mut self, rows: &[Json], keys: &[&str]) -> Result<u64> {
        let (columns, values) = normalize_rows(&self.fields, rows)?;
        self.action = Action::Upsert {
            columns,
            values,
            rows: rows.len(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        };
        let statement = self.statement()?;
        self.run_execute(statement)
    }

    /// Single-row [`upsert_many`](Self::upsert_many).
    pub fn upsert_single(&mut self, row: &Json, keys: &[&str]) -> Result<u64> {
        self.upsert_many(std::slice::from_ref(row), keys)
    }

    /// UPDATE rows matching the WHERE tree. SET values bind before WHERE
    /// bindings, matching their placeholder order.
    pub fn update(&mut self, changes: &Json) -> Result<u64> {
        let object = as_object(changes)?;
        let assignments = object
            .iter()
            .map(|(column, value)| (column.clone(), Value::from_json(value)))
            .collect();
        self.action = Action::Update { assignments };
        let statement = self.statement()?;
        self.run_execute(statement)
    }

    /// DELETE rows matching the WHERE tree. With no WHERE clauses this
    /// deletes the whole table.
    pub fn delete(&mut self) -> Result<u64> {
        self.action = Action::Delete;
        let statement = self.statement()?;
        self.run_execute(statement)
    }

    /// `COUNT(*)` over the accumulated query. Replaces the projection.
    pub fn count(&mut self) -> Result<i64> {
        self.fields = vec!["COUNT(*) AS _count".to_string()];
        self.action = Action::Select;
        let statement = self.statement()?;
        let rows = self.run_query(statement)?;
        let count = rows
            .first()
            .and_then(|row| row.get("_count"))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count)
    }

    /// `SELECT EXISTS(...)` around the accumulated query.
    pub fn exists(&mut self) -> Result<bool> {
        self.action = Action::Exists;
        let statement = self.statement()?;
        let rows = self.run_query(statement)?;
        let exists = rows
            .first()
            .and_then(|row| row.get_index(0))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(exists)
    }

    // ==================== execution ====================

    fn run_query(&self, statement: Statement) -> Result<Vec<Row>> {
        let started = Instant::now();
        let result = self.handle.query(&statement.sql, &statement.bindings);
        match &result {
            Ok(rows) => tracing::debug!(
                target: "sqlbind::sql",
                sql = %statement.sql,
                bindings = statement.bindings.len(),
                rows = rows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "query"
            ),
            Err(error) => tracing::warn!(
                target: "sqlbind::sql",
                sql = %statement.sql,
                %error,
                "query failed"
            ),
        }
        result
    }

    fn run_execute(&self, statement: Statement) -> Result<u64> {
        let started = Instant::now();
        let result = self.handle.execute(&statement.sql, &statement.bindings);
        match &result {
            Ok(affected) => tracing::debug!(
                target: "sqlbind::sql",
                sql = %statement.sql,
                bindings = statement.bindings.len(),
                affected,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "execute"
            ),
            Err(error) => tracing::warn!(
                target: "sqlbind::sql",
                sql = %statement.sql,
                %error,
                "execute failed"
            ),
        }
        result
    }
}

/// Flatten JSON rows into a column list and row-major values. An explicit
/// column list wins; otherwise the first row's keys decide. Rows may omit
/// columns (bound as NULL) and keys outside the column list are ignored.
fn normalize_rows(explicit: &[String], rows: &[Json]) -> Result<(Vec<String>, Vec<Value>)> {
    let Some(first) = rows.first() else {
        return Err(Error::invalid_query("INSERT requires at least one row"));
    };
    let columns: Vec<String> = if explicit.is_empty() {
        as_object(first)?.keys().cloned().collect()
    } else {
        explicit.to_vec()
    };
    if columns.is_empty() {
        return Err(Error::invalid_query("INSERT requires at least one column"));
    }
    let mut values = Vec::with_capacity(columns.len() * rows.len());
    for row in rows {
        let object = as_object(row)?;
        for column in &columns {
            let value = object.get(column).map(Value::from_json).unwrap_or(Value::Null);
            values.push(value);
        }
    }
    Ok((columns, values))
}

fn as_object(value: &Json) -> Result<&serde_json::Map<String, Json>> {
    value
        .as_object()
        .ok_or_else(|| Error::InvalidRow(json_kind(value).to_string()))
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
