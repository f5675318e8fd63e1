//! SQLite connection handle shared by queries and transactions

use std::path::Path;
use std::sync::Arc;

use sqlite_database_raw::RawConnection;
use tracing::{debug, error};

use crate::config::{MEMORY_PATH, OpenMode, SqliteDatabaseConfig};
use crate::error::{Error, Result};
use crate::query::Query;
use crate::transaction::Transaction;

/// An open SQLite database.
///
/// Always handed out as `Arc<SqliteDatabase>`: every [`Query`] and
/// [`Transaction`] created from it holds its own clone, so the native handle
/// stays open until the last of them (and the caller's reference) is dropped.
///
/// # Example
///
/// ```no_run
/// use sqlite_database::SqliteDatabase;
///
/// # fn example() -> sqlite_database::Result<()> {
/// let db = SqliteDatabase::open("app.db")?;
/// db.execute("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)")?;
///
/// let mut insert = db.create_query();
/// insert.add("INSERT INTO users (name) VALUES").add_array(1);
/// insert.bind("Alice")?.and_step()?;
///
/// let mut select = db.create_query();
/// select.add("SELECT id, name FROM users");
/// while select.step()? {
///     let id = select.get_i64()?;
///     let name = select.get_string()?;
///     println!("{id}: {name}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteDatabase {
   conn: RawConnection,
   path: String,
   mode: OpenMode,
}

impl SqliteDatabase {
   /// Open a database for reading and writing, creating the file if missing.
   pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>> {
      Self::open_with_config(path, None)
   }

   /// Open an existing database for reading only.
   ///
   /// Write statements are rejected by SQLite when they are executed.
   pub fn open_read_only(path: impl AsRef<Path>) -> Result<Arc<Self>> {
      Self::open_with_config(
         path,
         Some(SqliteDatabaseConfig {
            mode: OpenMode::ReadOnly,
            ..Default::default()
         }),
      )
   }

   /// Open a private in-memory database.
   ///
   /// Every call creates a new, empty database that no other connection can see.
   pub fn open_in_memory() -> Result<Arc<Self>> {
      Self::open_with_config(
         MEMORY_PATH,
         Some(SqliteDatabaseConfig {
            mode: OpenMode::Memory,
            ..Default::default()
         }),
      )
   }

   /// Open a database with explicit configuration.
   ///
   /// Pass `None` to use [`SqliteDatabaseConfig::default`] (read-write).
   /// With [`OpenMode::Memory`] the path is ignored.
   pub fn open_with_config(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let config = custom_config.unwrap_or_default();

      let path = match config.mode {
         OpenMode::Memory => MEMORY_PATH.to_string(),
         OpenMode::ReadWrite | OpenMode::ReadOnly => {
            let path = path.as_ref();
            path
               .to_str()
               .ok_or_else(|| sqlite_database_raw::Error::InvalidPath(path.display().to_string()))?
               .to_string()
         }
      };

      let conn = RawConnection::open(&path, config.open_flags())?;
      debug!(path = %path, mode = ?config.mode, "Database opened");

      Ok(Arc::new(Self {
         conn,
         path,
         mode: config.mode,
      }))
   }

   /// Prepare and run a single statement without parameters.
   ///
   /// The statement is stepped once. A statement that happens to produce a
   /// row is still a success; the row is discarded.
   pub fn execute(&self, sql: &str) -> Result<()> {
      let mut stmt = self.conn.prepare(sql)?;
      stmt.step()?;
      Ok(())
   }

   /// Create an empty query bound to this database.
   ///
   /// Nothing is sent to SQLite until the query is bound or stepped.
   pub fn create_query(self: &Arc<Self>) -> Query {
      Query::new(Arc::clone(self))
   }

   /// Issue `BEGIN` and return the scope that will end the transaction.
   pub fn begin_transaction(self: &Arc<Self>) -> Result<Transaction> {
      Transaction::begin(Arc::clone(self))
   }

   /// Run `f` inside a transaction.
   ///
   /// Commits when `f` returns `Ok` and rolls back when it returns `Err`,
   /// unless `f` already ended the transaction itself. If the rollback fails
   /// it is logged and the error from `f` is returned.
   ///
   /// # Examples
   ///
   /// ```no_run
   /// # fn example(db: &std::sync::Arc<sqlite_database::SqliteDatabase>) -> sqlite_database::Result<()> {
   /// db.transaction(|_tx| {
   ///     db.execute("UPDATE accounts SET balance = balance - 10 WHERE id = 1")?;
   ///     db.execute("UPDATE accounts SET balance = balance + 10 WHERE id = 2")?;
   ///     Ok::<_, sqlite_database::Error>(())
   /// })?;
   /// # Ok(())
   /// # }
   /// ```
   pub fn transaction<T, E, F>(self: &Arc<Self>, f: F) -> std::result::Result<T, E>
   where
      F: FnOnce(&mut Transaction) -> std::result::Result<T, E>,
      E: From<Error>,
   {
      let mut tx = self.begin_transaction()?;

      match f(&mut tx) {
         Ok(value) => {
            if tx.is_active() {
               tx.commit()?;
            }
            Ok(value)
         }
         Err(e) => {
            if tx.is_active()
               && let Err(rollback_err) = tx.rollback()
            {
               error!("Transaction rollback error: {}", rollback_err);
            }
            Err(e)
         }
      }
   }

   /// The path handed to SQLite (`:memory:` for in-memory databases)
   pub fn path(&self) -> &str {
      &self.path
   }

   pub fn mode(&self) -> OpenMode {
      self.mode
   }

   /// Returns true when no transaction is open on this connection
   pub fn is_autocommit(&self) -> bool {
      self.conn.is_autocommit()
   }

   /// Rows modified by the most recent INSERT, UPDATE or DELETE
   pub fn changes(&self) -> u64 {
      self.conn.changes()
   }

   /// ROWID of the most recent successful INSERT
   pub fn last_insert_rowid(&self) -> i64 {
      self.conn.last_insert_rowid()
   }

   pub(crate) fn connection(&self) -> &RawConnection {
      &self.conn
   }
}
