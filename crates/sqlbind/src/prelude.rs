//! Single-import surface for the common path: build, execute, hydrate.

pub use crate::error::{Error, Result};
pub use crate::handle::{DatabaseHandle, Row};
pub use crate::qb::{JoinKind, QueryBuilder, Statement};
pub use crate::record::{FromValue, Record, RecordColumn, TypeMismatch};
pub use crate::value::Value;

#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteHandle;

#[cfg(feature = "derive")]
pub use sqlbind_derive::Record;
