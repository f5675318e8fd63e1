/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`SqliteDatabase`](crate::SqliteDatabase), [`Query`](crate::Query)
/// and [`Transaction`](crate::Transaction).
///
/// `Native` and `Database` are both database errors; they differ only in where
/// the message comes from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Failure reported by the SQLite engine. The message is the engine's last
   /// error text for the connection.
   #[error(transparent)]
   Native(#[from] sqlite_database_raw::Error),

   /// Contract violation detected by the wrapper itself.
   #[error("{0}")]
   Database(&'static str),

   /// A segment of a delimited integer column is not a valid `i64`.
   #[error("invalid integer in delimited column: {0}")]
   ParseInt(#[from] std::num::ParseIntError),
}

impl Error {
   /// Returns true for errors from the engine or from wrapper-level checks.
   pub fn is_database_error(&self) -> bool {
      matches!(self, Error::Native(_) | Error::Database(_))
   }

   /// The SQLite extended result code, for engine errors.
   pub fn sqlite_code(&self) -> Option<i32> {
      match self {
         Error::Native(e) => e.code(),
         _ => None,
      }
   }

   /// A stable code for matching on the kind of failure without parsing the
   /// message: `SQLITE_<n>` with the extended result code, `INVALID_PATH`,
   /// `DATABASE_ERROR` or `PARSE_INT_ERROR`.
   pub fn error_code(&self) -> String {
      match self {
         Error::Native(e) => match e.code() {
            Some(code) => format!("SQLITE_{}", code),
            None => "INVALID_PATH".to_string(),
         },
         Error::Database(_) => "DATABASE_ERROR".to_string(),
         Error::ParseInt(_) => "PARSE_INT_ERROR".to_string(),
      }
   }
}
