//! Owning handle over a native prepared statement.

use std::borrow::Cow;
use std::ffi::{c_char, c_int, c_uchar};
use std::ptr::NonNull;

use libsqlite3_sys::{
   SQLITE_BLOB, SQLITE_DONE, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_OK, SQLITE_ROW,
   SQLITE_STATIC, SQLITE_TEXT, SQLITE_TRANSIENT, SQLITE_UTF8, sqlite3_bind_double,
   sqlite3_bind_int, sqlite3_bind_int64, sqlite3_bind_null, sqlite3_bind_text64,
   sqlite3_clear_bindings, sqlite3_column_bytes, sqlite3_column_count, sqlite3_column_double,
   sqlite3_column_int, sqlite3_column_int64, sqlite3_column_text, sqlite3_column_type,
   sqlite3_db_handle, sqlite3_destructor_type, sqlite3_finalize, sqlite3_reset, sqlite3_step,
   sqlite3_stmt,
};

use crate::Result;
use crate::connection::DbLock;
use crate::error::Error;

/// Storage class of a column value in the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
   Integer,
   Float,
   Text,
   Blob,
   Null,
}

impl ColumnType {
   fn from_raw(raw: c_int) -> Self {
      match raw {
         SQLITE_INTEGER => ColumnType::Integer,
         SQLITE_FLOAT => ColumnType::Float,
         SQLITE_TEXT => ColumnType::Text,
         SQLITE_BLOB => ColumnType::Blob,
         SQLITE_NULL => ColumnType::Null,
         _ => ColumnType::Null,
      }
   }
}

/// Outcome of a successful `sqlite3_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
   /// A result row is available for reading
   Row,
   /// The statement has run to completion
   Done,
}

/// A compiled statement, finalized on drop.
///
/// Bind positions are 1-based and column positions 0-based, as in the C API.
/// Column reads refer to the row produced by the most recent [`step`](Self::step).
#[derive(Debug)]
pub struct RawStatement {
   stmt: NonNull<sqlite3_stmt>,
}

// SAFETY: The owning connection runs in serialized mode (SQLITE_OPEN_FULLMUTEX),
// so the statement may be used from whichever thread currently owns it.
// RawStatement is deliberately not Sync: bind/step/reset take &mut self.
unsafe impl Send for RawStatement {}

impl RawStatement {
   /// # Safety
   ///
   /// `stmt` must be a freshly prepared statement not owned by anything else.
   pub(crate) unsafe fn from_raw(stmt: NonNull<sqlite3_stmt>) -> Self {
      Self { stmt }
   }

   /// Locks the owning connection so a native call and its error read are
   /// not interleaved with calls from other threads.
   fn lock(&self) -> DbLock {
      // SAFETY: self.stmt is valid, and its connection cannot be freed while
      // the statement exists (sqlite3_close fails with SQLITE_BUSY).
      unsafe { DbLock::acquire(sqlite3_db_handle(self.stmt.as_ptr())) }
   }

   fn check(&self, rc: c_int) -> Result<()> {
      if rc == SQLITE_OK {
         Ok(())
      } else {
         Err(self.last_error())
      }
   }

   /// Error state of the connection that owns this statement
   fn last_error(&self) -> Error {
      // SAFETY: self.stmt is valid, and its connection stays allocated until the
      // statement is finalized.
      unsafe { Error::from_handle(sqlite3_db_handle(self.stmt.as_ptr())) }
   }

   pub fn bind_null(&mut self, index: c_int) -> Result<()> {
      let _lock = self.lock();
      // SAFETY: self.stmt is a valid prepared statement.
      let rc = unsafe { sqlite3_bind_null(self.stmt.as_ptr(), index) };
      self.check(rc)
   }

   pub fn bind_int(&mut self, index: c_int, value: i32) -> Result<()> {
      let _lock = self.lock();
      let rc = unsafe { sqlite3_bind_int(self.stmt.as_ptr(), index, value) };
      self.check(rc)
   }

   pub fn bind_int64(&mut self, index: c_int, value: i64) -> Result<()> {
      let _lock = self.lock();
      let rc = unsafe { sqlite3_bind_int64(self.stmt.as_ptr(), index, value) };
      self.check(rc)
   }

   pub fn bind_double(&mut self, index: c_int, value: f64) -> Result<()> {
      let _lock = self.lock();
      let rc = unsafe { sqlite3_bind_double(self.stmt.as_ptr(), index, value) };
      self.check(rc)
   }

   /// Binds text that SQLite copies before returning.
   pub fn bind_text(&mut self, index: c_int, value: &str) -> Result<()> {
      // SAFETY: SQLITE_TRANSIENT makes SQLite take its own copy of the bytes.
      unsafe { self.bind_text_with(index, value, SQLITE_TRANSIENT()) }
   }

   /// Binds text without copying it. The `'static` bound guarantees the bytes
   /// outlive the statement.
   pub fn bind_text_static(&mut self, index: c_int, value: &'static str) -> Result<()> {
      // SAFETY: value lives for the rest of the program, so SQLite may keep the
      // pointer for as long as the binding exists.
      unsafe { self.bind_text_with(index, value, SQLITE_STATIC()) }
   }

   /// # Safety
   ///
   /// With a non-transient destructor, `value` must stay valid for as long as
   /// the binding exists.
   unsafe fn bind_text_with(
      &mut self,
      index: c_int,
      value: &str,
      destructor: sqlite3_destructor_type,
   ) -> Result<()> {
      let _lock = self.lock();
      // SAFETY: value is valid UTF-8 for value.len() bytes; lifetime per caller.
      let rc = unsafe {
         sqlite3_bind_text64(
            self.stmt.as_ptr(),
            index,
            value.as_ptr() as *const c_char,
            value.len() as u64,
            destructor,
            SQLITE_UTF8 as c_uchar,
         )
      };
      self.check(rc)
   }

   /// Advances to the next row or runs the statement to completion.
   pub fn step(&mut self) -> Result<StepResult> {
      let _lock = self.lock();
      // SAFETY: self.stmt is a valid prepared statement.
      match unsafe { sqlite3_step(self.stmt.as_ptr()) } {
         SQLITE_ROW => Ok(StepResult::Row),
         SQLITE_DONE => Ok(StepResult::Done),
         _ => Err(self.last_error()),
      }
   }

   /// Rewinds the statement so it can be stepped again. Bindings are kept.
   pub fn reset(&mut self) {
      // The return code repeats the last step error, which has already been
      // reported to whoever stepped.
      unsafe {
         sqlite3_reset(self.stmt.as_ptr());
      }
   }

   /// Sets every parameter back to NULL.
   pub fn clear_bindings(&mut self) {
      // Always returns SQLITE_OK.
      unsafe {
         sqlite3_clear_bindings(self.stmt.as_ptr());
      }
   }

   /// Number of columns in the result set (0 for statements without one)
   pub fn column_count(&self) -> c_int {
      unsafe { sqlite3_column_count(self.stmt.as_ptr()) }
   }

   pub fn column_type(&self, column: c_int) -> ColumnType {
      ColumnType::from_raw(unsafe { sqlite3_column_type(self.stmt.as_ptr(), column) })
   }

   pub fn column_int(&self, column: c_int) -> i32 {
      unsafe { sqlite3_column_int(self.stmt.as_ptr(), column) }
   }

   pub fn column_int64(&self, column: c_int) -> i64 {
      unsafe { sqlite3_column_int64(self.stmt.as_ptr(), column) }
   }

   pub fn column_double(&self, column: c_int) -> f64 {
      unsafe { sqlite3_column_double(self.stmt.as_ptr(), column) }
   }

   /// Reads the column as text, converting from the stored type if needed.
   ///
   /// Returns `None` for NULL. Invalid UTF-8 (e.g. a BLOB read as text) is
   /// replaced lossily.
   pub fn column_text(&self, column: c_int) -> Option<Cow<'_, str>> {
      // SAFETY: self.stmt is valid. sqlite3_column_bytes must be called after
      // sqlite3_column_text so the length refers to the converted text. The
      // buffer stays valid until the next step/reset/finalize, all of which
      // need &mut self and so cannot overlap the returned borrow.
      unsafe {
         let text = sqlite3_column_text(self.stmt.as_ptr(), column);
         if text.is_null() {
            return None;
         }
         let len = usize::try_from(sqlite3_column_bytes(self.stmt.as_ptr(), column))
            .unwrap_or_default();
         let bytes = std::slice::from_raw_parts(text as *const u8, len);
         Some(String::from_utf8_lossy(bytes))
      }
   }
}

impl Drop for RawStatement {
   fn drop(&mut self) {
      // SAFETY: self.stmt is valid and finalized exactly once, here.
      unsafe {
         sqlite3_finalize(self.stmt.as_ptr());
      }
   }
}
