//! # sqlite-database-raw
//!
//! Owning handles over the SQLite C API, as exposed by `libsqlite3-sys`.
//!
//! ## Core Types
//!
//! - **[`RawConnection`]**: an open `sqlite3` handle, closed on drop
//! - **[`RawStatement`]**: a prepared `sqlite3_stmt`, finalized on drop
//! - **[`OpenFlags`]**: flags for `sqlite3_open_v2`
//! - **[`Error`]**: a failed SQLite call, carrying the extended result code and
//!   the connection's `sqlite3_errmsg` text
//!
//! This crate does no SQL assembly, cursor bookkeeping or transaction
//! handling. Those live in `sqlite-database`.
//!
//! ## Usage
//!
//! ```no_run
//! use sqlite_database_raw::{OpenFlags, RawConnection, StepResult};
//!
//! # fn main() -> sqlite_database_raw::Result<()> {
//! let conn = RawConnection::open(":memory:", OpenFlags::READ_WRITE | OpenFlags::CREATE)?;
//! let mut stmt = conn.prepare("SELECT ?1 + 1")?;
//! stmt.bind_int64(1, 41)?;
//! assert_eq!(stmt.step()?, StepResult::Row);
//! assert_eq!(stmt.column_int64(0), 42);
//! # Ok(())
//! # }
//! ```
mod connection;
mod error;
mod statement;

pub use connection::{OpenFlags, RawConnection};
pub use error::Error;
pub use statement::{ColumnType, RawStatement, StepResult};

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
