//! Scope-bound transactions

use std::sync::Arc;
use std::thread;

use tracing::{error, trace};

use crate::database::SqliteDatabase;
use crate::error::{Error, Result};

/// A transaction that ends when it goes out of scope.
///
/// `BEGIN` is issued on creation. The transaction is closed by exactly one of
/// [`commit`](Self::commit), [`rollback`](Self::rollback) or drop. On drop an
/// active transaction is
///
/// - committed, if the scope is being left normally, or
/// - rolled back, if a panic started after the transaction began is unwinding
///   through the scope, or an explicit commit has failed.
///
/// Errors returned through `?` are not visible to `Drop`: a scope left early by
/// `?` still commits. Use [`SqliteDatabase::transaction`] (or an explicit
/// [`rollback`](Self::rollback)) when the error path must roll back.
#[derive(Debug)]
#[must_use = "if unused, the transaction is immediately committed"]
pub struct Transaction {
   database: Option<Arc<SqliteDatabase>>,
   panicking_at_begin: bool,
   failed: bool,
}

impl Transaction {
   pub(crate) fn begin(database: Arc<SqliteDatabase>) -> Result<Self> {
      database.execute("BEGIN")?;
      trace!(path = database.path(), "Transaction started");

      Ok(Self {
         database: Some(database),
         panicking_at_begin: thread::panicking(),
         failed: false,
      })
   }

   /// Commit the transaction.
   ///
   /// If SQLite rejects the `COMMIT` the transaction stays open and will be
   /// rolled back when the scope ends, unless a later `commit` succeeds.
   pub fn commit(&mut self) -> Result<()> {
      self.finish("COMMIT", "Can't commit on inactive transaction")
   }

   /// Roll the transaction back.
   pub fn rollback(&mut self) -> Result<()> {
      self.finish("ROLLBACK", "Can't rollback on inactive transaction")
   }

   fn finish(&mut self, sql: &str, inactive: &'static str) -> Result<()> {
      let database = self.database.as_ref().ok_or(Error::Database(inactive))?;

      if let Err(e) = database.execute(sql) {
         self.failed = true;
         return Err(e);
      }

      trace!(sql, "Transaction finished");
      self.database = None;
      Ok(())
   }

   /// Returns true until the transaction has been committed or rolled back
   pub fn is_active(&self) -> bool {
      self.database.is_some()
   }

   /// The database this transaction runs on, while it is active
   pub fn database(&self) -> Option<&Arc<SqliteDatabase>> {
      self.database.as_ref()
   }
}

impl Drop for Transaction {
   fn drop(&mut self) {
      let Some(database) = self.database.take() else {
         return;
      };

      let unwinding = thread::panicking() && !self.panicking_at_begin;
      if !unwinding && !self.failed {
         match database.execute("COMMIT") {
            Ok(()) => {
               trace!("Transaction committed on drop");
               return;
            }
            // Drop can't return the error; fall through so the transaction
            // isn't left open.
            Err(e) => error!("Transaction commit error: {}", e),
         }
      }

      // Called during unwinding or after a failed commit. Rollback and never panic
      match database.execute("ROLLBACK") {
         Ok(()) => trace!("Transaction rolled back on drop"),
         Err(e) => error!("Transaction rollback error: {}", e),
      }
   }
}
