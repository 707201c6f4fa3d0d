//! SQLite handle backed by `rusqlite` with the bundled engine.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, params_from_iter};

use crate::error::{Error, Result};
use crate::handle::{DatabaseHandle, Row};
use crate::value::Value;

/// Synchronous SQLite connection usable as a [`DatabaseHandle`].
///
/// The connection is wrapped in `Arc<Mutex<_>>`, so clones share one
/// underlying database handle and statement cache.
#[derive(Clone)]
pub struct SqliteHandle {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHandle {
    /// Open (or create) a database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<SqliteHandle> {
        let conn = Connection::open(path).map_err(Error::driver)?;
        Ok(SqliteHandle {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<SqliteHandle> {
        let conn = Connection::open_in_memory().map_err(Error::driver)?;
        Ok(SqliteHandle {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Connection("sqlite connection mutex poisoned".to_string()))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(flag) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*flag)))
            }
            Value::Integer(number) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*number)),
            Value::Real(number) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*number)),
            Value::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Value::Blob(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes)),
        };
        Ok(output)
    }
}

fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::Integer(number),
        ValueRef::Real(number) => Value::Real(number),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl DatabaseHandle for SqliteHandle {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    fn server_version(&self) -> String {
        rusqlite::version().to_string()
    }

    fn execute(&self, sql: &str, bindings: &[Value]) -> Result<u64> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql).map_err(Error::driver)?;
        let affected = stmt
            .execute(params_from_iter(bindings.iter()))
            .map_err(Error::driver)?;
        Ok(affected as u64)
    }

    fn query(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(sql).map_err(Error::driver)?;
        let columns: Arc<Vec<String>> =
            Arc::new(stmt.column_names().iter().map(|c| c.to_string()).collect());
        let mut rows = stmt
            .query(params_from_iter(bindings.iter()))
            .map_err(Error::driver)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(Error::driver)? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value = row.get_ref(index).map_err(Error::driver)?;
                values.push(read_value(value));
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(out)
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.conn()?.last_insert_rowid())
    }
}
