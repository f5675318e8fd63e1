//! Values that can be bound to a query placeholder

use std::ffi::c_int;

use sqlite_database_raw::RawStatement;

use crate::error::{Error, Result};

/// Explicit SQL NULL for [`Query::bind`](crate::Query::bind)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Null;

/// A value that can be bound to a placeholder.
///
/// SQLite stores integers as signed 64-bit values, so `u32` is widened to
/// `i64` and a `u64` above `i64::MAX` is rejected instead of wrapping.
/// Strings are copied by SQLite; use [`Query::bind_static`](crate::Query::bind_static)
/// to bind a `'static` string without the copy.
pub trait BindValue {
   /// Bind `self` to the 1-based placeholder `index`
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()>;
}

impl BindValue for Null {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      Ok(stmt.bind_null(index)?)
   }
}

impl BindValue for i32 {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      Ok(stmt.bind_int(index, self)?)
   }
}

impl BindValue for u32 {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      i64::from(self).bind_to(stmt, index)
   }
}

impl BindValue for i64 {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      Ok(stmt.bind_int64(index, self)?)
   }
}

impl BindValue for u64 {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      let value = i64::try_from(self).map_err(|_| {
         Error::Database("Can't bind value. Sqlite doesn't support uint64 type")
      })?;
      value.bind_to(stmt, index)
   }
}

impl BindValue for f64 {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      Ok(stmt.bind_double(index, self)?)
   }
}

impl BindValue for &str {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      Ok(stmt.bind_text(index, self)?)
   }
}

impl BindValue for &String {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      self.as_str().bind_to(stmt, index)
   }
}

impl BindValue for String {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      self.as_str().bind_to(stmt, index)
   }
}

/// `None` binds NULL
impl<T: BindValue> BindValue for Option<T> {
   fn bind_to(self, stmt: &mut RawStatement, index: c_int) -> Result<()> {
      match self {
         Some(value) => value.bind_to(stmt, index),
         None => Null.bind_to(stmt, index),
      }
   }
}
