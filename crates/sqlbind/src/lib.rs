//! Fluent SQL building and execution over synchronous database handles.
//!
//! A [`QueryBuilder`] accumulates predicate trees, joins, ordering and paging
//! through chainable calls, renders them as SQL with `?` placeholders plus an
//! ordered binding list, and executes through a [`DatabaseHandle`]. Values
//! never appear in SQL text; identifiers are quoted for the handle's dialect,
//! which also picks the upsert conflict syntax. Result rows hydrate into
//! plain structs via [`Record`].
//!
//! ```ignore
//! use sqlbind::{QueryBuilder, SqliteHandle};
//!
//! let handle = SqliteHandle::open("app.db")?;
//! let mut qb = QueryBuilder::new(&handle, "users");
//! qb.where_("status", "=", "active")?
//!     .order_by_desc("created_at")
//!     .limit(20);
//! let rows = qb.select_many()?;
//! ```

pub mod clause;
pub mod dialect;
pub mod error;
pub mod handle;
pub mod ident;
pub mod prelude;
pub mod qb;
pub mod record;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod value;

pub use clause::{ALLOWED_OPERATORS, Clause, Connector, Predicate};
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use handle::{DatabaseHandle, Row};
pub use ident::quote_field;
pub use qb::{JoinKind, QueryBuilder, Statement};
pub use record::{FromValue, Record, RecordColumn, TypeMismatch, hydrate_all, hydrate_one};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteHandle;
pub use value::Value;

/// Derives [`Record`] for a named-field struct.
#[cfg(feature = "derive")]
pub use sqlbind_derive::Record;
