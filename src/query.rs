//! Fluent SQL builder and positional row cursor

use std::borrow::Cow;
use std::ffi::c_int;
use std::fmt::Display;
use std::sync::Arc;

use sqlite_database_raw::{ColumnType, RawStatement, StepResult};

use crate::bind::{BindValue, Null};
use crate::database::SqliteDatabase;
use crate::error::{Error, Result};

const COLUMN_OUT_OF_RANGE: &str = "Column is out of range";

/// A SQL statement assembled fragment by fragment, then bound and stepped.
///
/// The statement is compiled lazily, on the first bind or step, from the text
/// accumulated so far. Placeholders are bound in order (1-based, one per
/// `bind*` call) and columns of the current row are read in order (0-based,
/// one per `get_*`/`skip` call). The column cursor returns to the first column
/// on every [`step`](Self::step).
///
/// # Example
///
/// ```no_run
/// # fn example(db: &std::sync::Arc<sqlite_database::SqliteDatabase>) -> sqlite_database::Result<()> {
/// let mut insert = db.create_query();
/// insert
///    .add("INSERT INTO points (x, y) VALUES")
///    .add_array_rows(2, 2)
///    .bind(1)?
///    .bind(2)?
///    .bind(3)?
///    .bind(4)?
///    .and_step()?;
///
/// let mut select = db.create_query();
/// select.add("SELECT x, y FROM points WHERE x >").add("?");
/// select.bind(0)?;
/// while select.step()? {
///    let (x, y) = (select.get_i64()?, select.get_i64()?);
///    println!("({x}, {y})");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Query {
   // Declared before `database` so the statement is finalized before the
   // connection reference is released.
   stmt: Option<RawStatement>,
   database: Arc<SqliteDatabase>,
   sql: String,
   bind_idx: c_int,
   col_idx: c_int,
   col_count: c_int,
}

impl Query {
   pub(crate) fn new(database: Arc<SqliteDatabase>) -> Self {
      Self {
         stmt: None,
         database,
         sql: String::new(),
         bind_idx: 0,
         col_idx: 0,
         col_count: 0,
      }
   }

   /// Append a SQL fragment.
   ///
   /// A space is inserted first unless the text so far is empty or already ends
   /// in whitespace, and the fragment's leading whitespace is dropped when it
   /// joins existing text. Text already appended is never rewritten, so a
   /// fragment ending in several spaces keeps them. Empty fragments are ignored.
   pub fn add<T: Display>(&mut self, fragment: T) -> &mut Self {
      let fragment = fragment.to_string();
      self.push_fragment(&fragment);
      self
   }

   /// Append a parenthesized list of `columns` placeholders: `(?,?,?)`.
   ///
   /// `columns == 0` appends `()`.
   pub fn add_array(&mut self, columns: usize) -> &mut Self {
      let group = placeholder_group(columns);
      self.push_fragment(&group);
      self
   }

   /// Append `rows` comma-separated placeholder groups: `(?,?),(?,?)`.
   ///
   /// Intended for multi-row `VALUES` lists. `rows == 0` appends nothing.
   pub fn add_array_rows(&mut self, columns: usize, rows: usize) -> &mut Self {
      let group = placeholder_group(columns);
      let groups = vec![group.as_str(); rows].join(",");
      self.push_fragment(&groups);
      self
   }

   fn push_fragment(&mut self, fragment: &str) {
      if fragment.is_empty() {
         return;
      }

      match self.sql.chars().next_back() {
         None => self.sql.push_str(fragment),
         Some(last) => {
            if !last.is_whitespace() {
               self.sql.push(' ');
            }
            self.sql.push_str(fragment.trim_start());
         }
      }
   }

   /// The SQL text accumulated so far
   pub fn sql(&self) -> &str {
      &self.sql
   }

   /// The database this query runs against
   pub fn database(&self) -> &Arc<SqliteDatabase> {
      &self.database
   }

   fn prepared(&mut self) -> Result<&mut RawStatement> {
      let stmt = match self.stmt.take() {
         Some(stmt) => stmt,
         None => {
            let stmt = self.database.connection().prepare(&self.sql)?;
            self.col_count = stmt.column_count();
            stmt
         }
      };
      Ok(self.stmt.insert(stmt))
   }

   /// Advance the bind cursor and bind the next placeholder. The cursor moves
   /// even when SQLite rejects the value, so later binds keep their positions.
   fn bind_next<F>(&mut self, bind: F) -> Result<&mut Self>
   where
      F: FnOnce(&mut RawStatement, c_int) -> Result<()>,
   {
      let index = self.bind_idx + 1;
      let result = bind(self.prepared()?, index);
      self.bind_idx = index;
      result?;
      Ok(self)
   }

   /// Bind the next placeholder.
   ///
   /// Accepts integers (`i32`, `u32`, `i64`, `u64`), `f64`, strings, [`Null`]
   /// and `Option` of any of these. A `u64` above `i64::MAX` is an error.
   pub fn bind<T: BindValue>(&mut self, value: T) -> Result<&mut Self> {
      self.bind_next(|stmt, index| value.bind_to(stmt, index))
   }

   /// Bind NULL to the next placeholder.
   pub fn bind_null(&mut self) -> Result<&mut Self> {
      self.bind(Null)
   }

   /// Bind a `'static` string without copying it into SQLite.
   pub fn bind_static(&mut self, value: &'static str) -> Result<&mut Self> {
      self.bind_next(|stmt, index| Ok(stmt.bind_text_static(index, value)?))
   }

   /// Advance to the next row.
   ///
   /// Returns `true` when a row is available and `false` once the statement
   /// has completed.
   pub fn step(&mut self) -> Result<bool> {
      let result = self.prepared()?.step();
      self.col_idx = 0;
      Ok(result? == StepResult::Row)
   }

   /// [`step`](Self::step) for use inside a builder chain; the row flag is
   /// discarded.
   pub fn and_step(&mut self) -> Result<&mut Self> {
      self.step()?;
      Ok(self)
   }

   /// Drop the compiled statement and the SQL text so the query can be reused
   /// for a different statement.
   pub fn reset(&mut self) -> &mut Self {
      self.stmt = None;
      self.sql.clear();
      self.bind_idx = 0;
      self.col_idx = 0;
      self.col_count = 0;
      self
   }

   /// Rewind the statement and set all parameters back to NULL, keeping the
   /// compiled statement for another run with new values.
   pub fn clear_bindings(&mut self) -> &mut Self {
      if let Some(stmt) = self.stmt.as_mut() {
         stmt.reset();
         stmt.clear_bindings();
      }
      self.bind_idx = 0;
      self.col_idx = 0;
      self
   }

   fn next_column(&mut self) -> Result<(&RawStatement, c_int)> {
      match &self.stmt {
         Some(stmt) if self.col_idx < self.col_count => {
            let column = self.col_idx;
            self.col_idx += 1;
            Ok((stmt, column))
         }
         _ => Err(Error::Database(COLUMN_OUT_OF_RANGE)),
      }
   }

   /// Storage class of the current column, without advancing.
   ///
   /// `None` once every column has been read (or before preparation).
   pub fn column_type(&self) -> Option<ColumnType> {
      match &self.stmt {
         Some(stmt) if self.col_idx < self.col_count => Some(stmt.column_type(self.col_idx)),
         _ => None,
      }
   }

   /// Returns true if the current column is NULL, without advancing.
   ///
   /// Unlike the `get_*` methods this never fails: past the last column it
   /// reports `true`.
   pub fn is_null(&self) -> bool {
      self
         .column_type()
         .is_none_or(|column_type| column_type == ColumnType::Null)
   }

   /// Move past the current column without reading it.
   pub fn skip(&mut self) -> Result<&mut Self> {
      self.next_column()?;
      Ok(self)
   }

   /// Read the current column as text. NULL reads as an empty string.
   pub fn get_string(&mut self) -> Result<String> {
      let (stmt, column) = self.next_column()?;
      Ok(stmt
         .column_text(column)
         .map(Cow::into_owned)
         .unwrap_or_default())
   }

   pub fn get_i32(&mut self) -> Result<i32> {
      let (stmt, column) = self.next_column()?;
      Ok(stmt.column_int(column))
   }

   /// Read the current column as a `u32`; negative or oversized values are
   /// an error.
   pub fn get_u32(&mut self) -> Result<u32> {
      let value = self.get_i64()?;
      u32::try_from(value).map_err(|_| Error::Database("uint32 value is out of range"))
   }

   pub fn get_i64(&mut self) -> Result<i64> {
      let (stmt, column) = self.next_column()?;
      Ok(stmt.column_int64(column))
   }

   /// Read the current column as a `u64`; negative values are an error.
   pub fn get_u64(&mut self) -> Result<u64> {
      let value = self.get_i64()?;
      u64::try_from(value).map_err(|_| Error::Database("uint64 value is out of range"))
   }

   pub fn get_f64(&mut self) -> Result<f64> {
      let (stmt, column) = self.next_column()?;
      Ok(stmt.column_double(column))
   }

   /// Read the current column as a `delimiter`-separated list of integers,
   /// e.g. `"1,2,3"`.
   ///
   /// Segments are trimmed and empty segments are skipped, so `"1,2,,3"`
   /// yields `[1, 2, 3]`. A segment that isn't an integer is an
   /// [`Error::ParseInt`].
   pub fn get_i64_array(&mut self, delimiter: char) -> Result<Vec<i64>> {
      let text = self.get_string()?;
      parse_i64_list(&text, delimiter)
   }
}

fn placeholder_group(columns: usize) -> String {
   format!("({})", vec!["?"; columns].join(","))
}

fn parse_i64_list(text: &str, delimiter: char) -> Result<Vec<i64>> {
   text
      .split(delimiter)
      .map(str::trim)
      .filter(|segment| !segment.is_empty())
      .map(|segment| segment.parse::<i64>().map_err(Error::from))
      .collect()
}
