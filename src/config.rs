//! Configuration for opening a SQLite database

use serde::{Deserialize, Serialize};
use sqlite_database_raw::OpenFlags;

/// Path marker SQLite uses for a private, non-persistent database
pub const MEMORY_PATH: &str = ":memory:";

/// How a database is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
   /// Read and write, creating the file if it doesn't exist
   #[default]
   ReadWrite,
   /// Reads only. Writes fail when the statement runs.
   ReadOnly,
   /// Private in-memory database. The path is ignored.
   Memory,
}

/// Configuration for [`SqliteDatabase::open_with_config`](crate::SqliteDatabase::open_with_config)
///
/// # Examples
///
/// ```
/// use sqlite_database::{OpenMode, SqliteDatabaseConfig};
///
/// // Use defaults
/// let config = SqliteDatabaseConfig::default();
/// assert_eq!(config.mode, OpenMode::ReadWrite);
///
/// // Override just one field
/// let config = SqliteDatabaseConfig {
///     mode: OpenMode::ReadOnly,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteDatabaseConfig {
   /// Open mode
   ///
   /// Default: `ReadWrite`
   pub mode: OpenMode,

   /// Interpret the path as a `file:` URI (e.g. `file:data.db?cache=shared`)
   ///
   /// Default: false
   pub uri: bool,
}

impl SqliteDatabaseConfig {
   pub(crate) fn open_flags(&self) -> OpenFlags {
      let flags = match self.mode {
         OpenMode::ReadWrite => OpenFlags::READ_WRITE | OpenFlags::CREATE,
         OpenMode::ReadOnly => OpenFlags::READ_ONLY,
         OpenMode::Memory => OpenFlags::READ_WRITE | OpenFlags::CREATE | OpenFlags::MEMORY,
      };

      if self.uri { flags | OpenFlags::URI } else { flags }
   }
}
