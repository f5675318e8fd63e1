//! Error types for sqlite-database-raw

use std::ffi::{CStr, c_int};

use libsqlite3_sys::{SQLITE_NOMEM, sqlite3, sqlite3_errmsg, sqlite3_extended_errcode};
use thiserror::Error;

use crate::connection::DbLock;

/// Errors reported at the native engine boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
   /// SQLite returned a failure code. `message` is the engine's last error
   /// text for the connection at the time of the failure.
   #[error("{message}")]
   Sqlite { code: c_int, message: String },

   /// The database path cannot be handed to SQLite as a C string
   #[error("invalid database path: {0}")]
   InvalidPath(String),
}

impl Error {
   /// Builds an error from the connection's last error state.
   ///
   /// A null handle means SQLite could not allocate a connection at all, so
   /// there is no error text to read.
   ///
   /// # Safety
   ///
   /// `db` must be null or a valid sqlite3 connection.
   pub(crate) unsafe fn from_handle(db: *mut sqlite3) -> Self {
      if db.is_null() {
         return Error::Sqlite {
            code: SQLITE_NOMEM,
            message: "Database isn't open".to_string(),
         };
      }

      // SAFETY: db is non-null and valid per the caller's contract. The message
      // pointer is owned by SQLite and valid until the next API call on db,
      // which the lock keeps other threads from making while it is copied.
      let (code, message) = unsafe {
         let _lock = DbLock::acquire(db);
         let code = sqlite3_extended_errcode(db);
         let text = sqlite3_errmsg(db);
         let message = if text.is_null() {
            String::new()
         } else {
            CStr::from_ptr(text).to_string_lossy().into_owned()
         };
         (code, message)
      };

      Error::Sqlite { code, message }
   }

   /// The SQLite (extended) result code, if this error came from the engine
   pub fn code(&self) -> Option<c_int> {
      match self {
         Error::Sqlite { code, .. } => Some(*code),
         Error::InvalidPath(_) => None,
      }
   }
}
