//! RAII wrapper for SQLite.
//!
//! This crate sits on top of the native handles in `sqlite-database-raw` and
//! provides:
//!
//! - [`SqliteDatabase`]: a shared connection handle (`Arc<SqliteDatabase>`),
//!   closed when the last owner is dropped
//! - [`Query`]: a fluent SQL builder with positional binding and a
//!   positional column cursor
//! - [`Transaction`]: `BEGIN` on creation, `COMMIT` or `ROLLBACK` on scope exit
//!
//! A [`Transaction`] scope only sees panics when it is dropped, so a scope left
//! early by `?` commits. Prefer [`SqliteDatabase::transaction`], which rolls back
//! when the closure returns `Err`.
//!
//! SQL parsing, execution and storage are entirely SQLite's; this crate only
//! manages handle lifetimes, assembles text and converts values.
//!
//! # Example
//!
//! ```
//! use sqlite_database::SqliteDatabase;
//!
//! # fn main() -> sqlite_database::Result<()> {
//! let db = SqliteDatabase::open_in_memory()?;
//! db.execute("CREATE TABLE t (a INTEGER)")?;
//!
//! // Commits when the closure returns Ok, rolls back on Err
//! db.transaction(|_tx| {
//!    let mut insert = db.create_query();
//!    insert
//!       .add("INSERT INTO t (a) VALUES")
//!       .add_array_rows(1, 2)
//!       .bind(10)?
//!       .bind(20)?
//!       .and_step()?;
//!    Ok::<_, sqlite_database::Error>(())
//! })?;
//!
//! let mut select = db.create_query();
//! select.add("SELECT a FROM t ORDER BY a");
//! let mut values = Vec::new();
//! while select.step()? {
//!    values.push(select.get_i64()?);
//! }
//! assert_eq!(values, vec![10, 20]);
//! # Ok(())
//! # }
//! ```

mod bind;
mod config;
mod database;
mod error;
mod query;
mod transaction;

pub use bind::{BindValue, Null};
pub use config::{MEMORY_PATH, OpenMode, SqliteDatabaseConfig};
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use query::Query;
pub use transaction::Transaction;

// Re-export the native types that appear in the public API
pub use sqlite_database_raw::{ColumnType, RawStatement};
