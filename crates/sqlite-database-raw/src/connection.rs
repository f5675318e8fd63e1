//! Owning handle over a native `sqlite3` connection.

use std::ffi::{CString, c_char, c_int};
use std::ops::BitOr;
use std::ptr::{self, NonNull};

use libsqlite3_sys::{
   SQLITE_BUSY, SQLITE_MISUSE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_FULLMUTEX,
   SQLITE_OPEN_MEMORY, SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI,
   SQLITE_TOOBIG, sqlite3, sqlite3_changes, sqlite3_close, sqlite3_db_mutex,
   sqlite3_extended_result_codes, sqlite3_get_autocommit, sqlite3_last_insert_rowid,
   sqlite3_mutex, sqlite3_mutex_enter, sqlite3_mutex_leave, sqlite3_open_v2, sqlite3_prepare_v2,
   sqlite3_stmt,
};
use tracing::{debug, error, trace};

use crate::Result;
use crate::error::Error;
use crate::statement::RawStatement;

/// Flags passed to `sqlite3_open_v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags(c_int);

impl OpenFlags {
   pub const READ_ONLY: OpenFlags = OpenFlags(SQLITE_OPEN_READONLY);
   pub const READ_WRITE: OpenFlags = OpenFlags(SQLITE_OPEN_READWRITE);
   pub const CREATE: OpenFlags = OpenFlags(SQLITE_OPEN_CREATE);
   pub const URI: OpenFlags = OpenFlags(SQLITE_OPEN_URI);
   pub const MEMORY: OpenFlags = OpenFlags(SQLITE_OPEN_MEMORY);
   pub const FULL_MUTEX: OpenFlags = OpenFlags(SQLITE_OPEN_FULLMUTEX);

   /// The raw flag bits
   pub fn bits(self) -> c_int {
      self.0
   }

   /// Returns true if every bit in `other` is set in `self`
   pub fn contains(self, other: OpenFlags) -> bool {
      self.0 & other.0 == other.0
   }
}

impl BitOr for OpenFlags {
   type Output = OpenFlags;

   fn bitor(self, rhs: OpenFlags) -> OpenFlags {
      OpenFlags(self.0 | rhs.0)
   }
}

/// Holds a connection's mutex for the lifetime of the guard.
///
/// SQLite releases the mutex between API calls, so a failing call and the
/// `sqlite3_errmsg` read that follows it must both happen under one guard.
/// Otherwise another thread can replace (and free) the message in between.
/// The connection mutex is recursive, so API calls made while holding it are
/// fine.
pub(crate) struct DbLock {
   mutex: *mut sqlite3_mutex,
}

impl DbLock {
   /// # Safety
   ///
   /// `db` must be a valid connection that stays open while the guard lives.
   pub(crate) unsafe fn acquire(db: *mut sqlite3) -> Self {
      // SAFETY: db is valid per the caller's contract. sqlite3_mutex_enter
      // accepts the null mutex of a connection opened without a mutex.
      unsafe {
         let mutex = sqlite3_db_mutex(db);
         sqlite3_mutex_enter(mutex);
         Self { mutex }
      }
   }
}

impl Drop for DbLock {
   fn drop(&mut self) {
      // SAFETY: the mutex was entered by this guard in acquire().
      unsafe {
         sqlite3_mutex_leave(self.mutex);
      }
   }
}

/// An open SQLite connection.
///
/// The handle is closed with `sqlite3_close` when this value is dropped.
/// SQLite refuses to close a connection that still has unfinalized
/// statements (`SQLITE_BUSY`). In that case the failure is logged and the
/// handle is left open, so a [`RawStatement`] that outlives its connection
/// stays usable and the connection leaks. Finalize statements first.
#[derive(Debug)]
pub struct RawConnection {
   db: NonNull<sqlite3>,
}

// SAFETY: Connections are opened with SQLITE_OPEN_FULLMUTEX, which puts the
// handle in serialized mode: SQLite guards every API call on it with the
// connection mutex. Calls whose result is read back through a second call
// (errors) hold that mutex across both through DbLock.
unsafe impl Send for RawConnection {}
unsafe impl Sync for RawConnection {}

impl RawConnection {
   /// Opens a connection to `filename` with the given flags.
   ///
   /// `FULL_MUTEX` is always added to `flags`.
   pub fn open(filename: &str, flags: OpenFlags) -> Result<Self> {
      let c_filename =
         CString::new(filename).map_err(|_| Error::InvalidPath(filename.to_string()))?;
      let flags = flags | OpenFlags::FULL_MUTEX;

      let mut db: *mut sqlite3 = ptr::null_mut();
      // SAFETY: c_filename is a valid nul-terminated string and db is a valid
      // out-pointer. A null VFS name selects the default VFS.
      let rc = unsafe { sqlite3_open_v2(c_filename.as_ptr(), &mut db, flags.bits(), ptr::null()) };

      if rc != SQLITE_OK {
         // SAFETY: db is either null or a handle SQLite allocated for this
         // failed open; it must still be released with sqlite3_close.
         let err = unsafe { Error::from_handle(db) };
         if !db.is_null() {
            unsafe {
               sqlite3_close(db);
            }
         }
         debug!(filename, %err, "Failed to open SQLite database");
         return Err(err);
      }

      let db = NonNull::new(db).ok_or_else(|| unsafe { Error::from_handle(ptr::null_mut()) })?;

      // SAFETY: db is a valid open connection.
      unsafe {
         sqlite3_extended_result_codes(db.as_ptr(), 1);
      }

      debug!(filename, flags = flags.bits(), "Opened SQLite database");
      Ok(Self { db })
   }

   /// Compiles the first statement in `sql`.
   ///
   /// Text without any statement (empty, whitespace or comments only) is
   /// rejected with `SQLITE_MISUSE`, since SQLite has nothing to step.
   pub fn prepare(&self, sql: &str) -> Result<RawStatement> {
      let len = c_int::try_from(sql.len()).map_err(|_| Error::Sqlite {
         code: SQLITE_TOOBIG,
         message: "string or blob too big".to_string(),
      })?;

      trace!(sql, "Preparing statement");

      // SAFETY: self.db is a valid open connection.
      let _lock = unsafe { DbLock::acquire(self.db.as_ptr()) };

      let mut stmt: *mut sqlite3_stmt = ptr::null_mut();
      // SAFETY: self.db is a valid open connection; sql is valid for len bytes
      // and SQLite does not require it to be nul-terminated when len >= 0.
      let rc = unsafe {
         sqlite3_prepare_v2(
            self.db.as_ptr(),
            sql.as_ptr() as *const c_char,
            len,
            &mut stmt,
            ptr::null_mut(),
         )
      };

      if rc != SQLITE_OK {
         return Err(self.last_error());
      }

      match NonNull::new(stmt) {
         // SAFETY: stmt was just produced by sqlite3_prepare_v2 and is owned
         // by nothing else.
         Some(stmt) => Ok(unsafe { RawStatement::from_raw(stmt) }),
         None => Err(Error::Sqlite {
            code: SQLITE_MISUSE,
            message: "query does not contain any SQL statement".to_string(),
         }),
      }
   }

   /// The connection's current error state as an [`Error`].
   ///
   /// When other threads use the same connection this may describe their
   /// latest failure rather than this thread's; the methods of this crate
   /// capture their own errors atomically.
   pub fn last_error(&self) -> Error {
      // SAFETY: self.db is a valid open connection.
      unsafe { Error::from_handle(self.db.as_ptr()) }
   }

   /// Returns true when no transaction is open on this connection
   pub fn is_autocommit(&self) -> bool {
      // SAFETY: self.db is a valid open connection.
      unsafe { sqlite3_get_autocommit(self.db.as_ptr()) != 0 }
   }

   /// Rows modified by the most recent INSERT, UPDATE or DELETE
   pub fn changes(&self) -> u64 {
      // SAFETY: self.db is a valid open connection.
      let changes = unsafe { sqlite3_changes(self.db.as_ptr()) };
      u64::try_from(changes).unwrap_or_default()
   }

   /// ROWID of the most recent successful INSERT on this connection
   pub fn last_insert_rowid(&self) -> i64 {
      // SAFETY: self.db is a valid open connection.
      unsafe { sqlite3_last_insert_rowid(self.db.as_ptr()) }
   }

   /// The underlying `sqlite3` pointer, for callers that need the C API directly
   pub fn as_ptr(&self) -> *mut sqlite3 {
      self.db.as_ptr()
   }
}

impl Drop for RawConnection {
   fn drop(&mut self) {
      // SAFETY: self.db is a valid connection and this is the only close call.
      // On failure SQLite keeps the handle allocated.
      let rc = unsafe { sqlite3_close(self.db.as_ptr()) };
      match rc {
         SQLITE_OK => debug!("Closed SQLite database"),
         SQLITE_BUSY => error!("SQLite database not closed: statements are still open"),
         _ => error!(rc, "sqlite3_close failed"),
      }
   }
}
