use std::sync::Arc;

use sqlite_database::{ColumnType, Error, Null, SqliteDatabase};

fn setup_test_db() -> Arc<SqliteDatabase> {
   let db = SqliteDatabase::open_in_memory().expect("Failed to open in-memory database");
   db.execute(
      "CREATE TABLE items (
         id INTEGER PRIMARY KEY,
         name TEXT,
         qty INTEGER,
         price REAL,
         tags TEXT
      )",
   )
   .unwrap();
   db
}

fn assert_column_out_of_range(err: Error) {
   match err {
      Error::Database(message) => assert_eq!(message, "Column is out of range"),
      other => panic!("expected column range error, got {other:?}"),
   }
}

// ============================================================================
// Binding
// ============================================================================

#[test]
fn test_bind_each_type() {
   let db = setup_test_db();

   let mut q = db.create_query();
   q.add("SELECT").add("?, ?, ?, ?, ?, ?, ?, ?, ?");
   q.bind(-7i32)
      .unwrap()
      .bind(7u32)
      .unwrap()
      .bind(-(1i64 << 40))
      .unwrap()
      .bind(1u64 << 40)
      .unwrap()
      .bind(1.5f64)
      .unwrap()
      .bind("copied")
      .unwrap()
      .bind(String::from("owned"))
      .unwrap()
      .bind_static("static")
      .unwrap()
      .bind_null()
      .unwrap();

   assert!(q.step().unwrap());
   assert_eq!(q.get_i32().unwrap(), -7);
   assert_eq!(q.get_u32().unwrap(), 7);
   assert_eq!(q.get_i64().unwrap(), -(1i64 << 40));
   assert_eq!(q.get_u64().unwrap(), 1u64 << 40);
   assert_eq!(q.get_f64().unwrap(), 1.5);
   assert_eq!(q.get_string().unwrap(), "copied");
   assert_eq!(q.get_string().unwrap(), "owned");
   assert_eq!(q.get_string().unwrap(), "static");
   assert!(q.is_null());
   assert_eq!(q.get_string().unwrap(), "");
}

#[test]
fn test_bind_u32_max_is_widened() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT ?").bind(u32::MAX).unwrap();

   assert!(q.step().unwrap());
   assert_eq!(q.column_type(), Some(ColumnType::Integer));
   assert_eq!(q.get_i64().unwrap(), i64::from(u32::MAX));
}

#[test]
fn test_bind_u64_above_i64_max_is_rejected() {
   let db = setup_test_db();

   for value in [i64::MAX as u64 + 1, u64::MAX] {
      let mut q = db.create_query();
      q.add("SELECT ?");
      let err = q.bind(value).unwrap_err();
      assert!(err.is_database_error());
      assert_eq!(
         err.to_string(),
         "Can't bind value. Sqlite doesn't support uint64 type"
      );
   }
}

#[test]
fn test_bind_u64_at_i64_max_round_trips() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT ?, ?").bind(i64::MAX as u64).unwrap().bind(0u64).unwrap();

   assert!(q.step().unwrap());
   assert_eq!(q.get_i64().unwrap(), i64::MAX);
   assert_eq!(q.get_i64().unwrap(), 0);
}

#[test]
fn test_bind_option_and_null() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT ?, ?, ?");
   q.bind(Some(3i64)).unwrap();
   q.bind(None::<&str>).unwrap();
   q.bind(Null).unwrap();

   assert!(q.step().unwrap());
   assert!(!q.is_null());
   assert_eq!(q.get_i64().unwrap(), 3);
   assert!(q.is_null());
   q.skip().unwrap();
   assert!(q.is_null());
   assert_eq!(q.column_type(), Some(ColumnType::Null));
}

#[test]
fn test_bind_past_last_placeholder_fails() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT ?").bind(1).unwrap();

   let err = q.bind(2).unwrap_err();
   assert!(matches!(err, Error::Native(_)));
   assert!(err.to_string().contains("out of range"), "got: {err}");
}

#[test]
fn test_bind_prepares_lazily_and_reports_prepare_errors() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT * FROM nowhere WHERE id =").add("?");

   let err = q.bind(1).unwrap_err();
   assert!(err.to_string().contains("no such table: nowhere"), "got: {err}");

   let err = q.step().unwrap_err();
   assert!(err.to_string().contains("no such table: nowhere"));
}

// ============================================================================
// Stepping and reading
// ============================================================================

#[test]
fn test_step_iterates_rows() {
   let db = setup_test_db();
   db.execute("INSERT INTO items (id, name, qty) VALUES (1, 'a', 10), (2, 'b', 20)")
      .unwrap();

   let mut q = db.create_query();
   q.add("SELECT id, name, qty FROM items ORDER BY id");

   let mut rows = Vec::new();
   while q.step().unwrap() {
      let id = q.get_i64().unwrap();
      let name = q.get_string().unwrap();
      let qty = q.get_u32().unwrap();
      rows.push((id, name, qty));
   }

   assert_eq!(rows, vec![(1, "a".to_string(), 10), (2, "b".to_string(), 20)]);
}

#[test]
fn test_step_resets_column_cursor() {
   let db = setup_test_db();
   db.execute("INSERT INTO items (id, name) VALUES (1, 'a'), (2, 'b')")
      .unwrap();

   let mut q = db.create_query();
   q.add("SELECT id, name FROM items ORDER BY id");

   assert!(q.step().unwrap());
   q.skip().unwrap();
   assert_eq!(q.get_string().unwrap(), "a");

   // Second row: reading starts at column 0 again
   assert!(q.step().unwrap());
   assert_eq!(q.get_i64().unwrap(), 2);
}

#[test]
fn test_reading_past_last_column_fails() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT 1, 'two'");
   assert!(q.step().unwrap());

   q.skip().unwrap();
   q.skip().unwrap();

   assert_column_out_of_range(q.skip().unwrap_err());
   assert_column_out_of_range(q.get_string().unwrap_err());
   assert_column_out_of_range(q.get_i32().unwrap_err());
   assert_column_out_of_range(q.get_u32().unwrap_err());
   assert_column_out_of_range(q.get_i64().unwrap_err());
   assert_column_out_of_range(q.get_u64().unwrap_err());
   assert_column_out_of_range(q.get_f64().unwrap_err());
   assert_column_out_of_range(q.get_i64_array(',').unwrap_err());

   // is_null peeks without a range check and reports exhausted columns as NULL
   assert!(q.is_null());
   assert_eq!(q.column_type(), None);
}

#[test]
fn test_reading_before_preparation_fails() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT 1");

   assert_column_out_of_range(q.get_i64().unwrap_err());
   assert!(q.is_null());
}

#[test]
fn test_statement_without_result_columns() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("INSERT INTO items (id) VALUES (?)").bind(1).unwrap();

   assert!(!q.step().unwrap());
   assert_column_out_of_range(q.skip().unwrap_err());
}

#[test]
fn test_step_error_is_reported() {
   let db = setup_test_db();
   db.execute("INSERT INTO items (id) VALUES (1)").unwrap();

   let mut q = db.create_query();
   q.add("INSERT INTO items (id) VALUES (1)");
   let err = q.step().unwrap_err();
   assert!(err.to_string().contains("UNIQUE constraint failed"), "got: {err}");
}

#[test]
fn test_narrowing_reads_check_range() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT -1, 4294967296, 4294967295, -1, 9223372036854775807");
   assert!(q.step().unwrap());

   let err = q.get_u32().unwrap_err();
   assert_eq!(err.to_string(), "uint32 value is out of range");

   let err = q.get_u32().unwrap_err();
   assert_eq!(err.to_string(), "uint32 value is out of range");

   assert_eq!(q.get_u32().unwrap(), u32::MAX);

   let err = q.get_u64().unwrap_err();
   assert_eq!(err.to_string(), "uint64 value is out of range");

   assert_eq!(q.get_u64().unwrap(), i64::MAX as u64);
}

#[test]
fn test_get_i32_truncates_like_sqlite() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT 2147483647, 2.9");
   assert!(q.step().unwrap());

   assert_eq!(q.get_i32().unwrap(), i32::MAX);
   assert_eq!(q.get_i32().unwrap(), 2);
}

#[test]
fn test_get_string_converts_numbers() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT 12, NULL");
   assert!(q.step().unwrap());

   assert_eq!(q.column_type(), Some(ColumnType::Integer));
   assert_eq!(q.get_string().unwrap(), "12");
   assert_eq!(q.get_string().unwrap(), "");
}

#[test]
fn test_get_i64_array() {
   let db = setup_test_db();
   db.execute("INSERT INTO items (id, tags) VALUES (1, '1,2,,3'), (2, '7;-8'), (3, NULL), (4, '1,x')")
      .unwrap();

   let mut q = db.create_query();
   q.add("SELECT tags FROM items ORDER BY id");

   assert!(q.step().unwrap());
   assert_eq!(q.get_i64_array(',').unwrap(), vec![1, 2, 3]);

   assert!(q.step().unwrap());
   assert_eq!(q.get_i64_array(';').unwrap(), vec![7, -8]);

   assert!(q.step().unwrap());
   assert!(q.get_i64_array(',').unwrap().is_empty());

   assert!(q.step().unwrap());
   let err = q.get_i64_array(',').unwrap_err();
   assert!(matches!(err, Error::ParseInt(_)));
   assert_eq!(err.error_code(), "PARSE_INT_ERROR");
}

// ============================================================================
// Reuse
// ============================================================================

#[test]
fn test_clear_bindings_reuses_statement() {
   let db = setup_test_db();

   let mut insert = db.create_query();
   insert.add("INSERT INTO items (id, name) VALUES").add_array(2);
   for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
      insert.bind(id).unwrap().bind(name).unwrap();
      assert!(!insert.step().unwrap());
      insert.clear_bindings();
   }

   // Text is kept
   assert_eq!(insert.sql(), "INSERT INTO items (id, name) VALUES (?,?)");

   let mut q = db.create_query();
   q.add("SELECT group_concat(name, '') FROM (SELECT name FROM items ORDER BY id)");
   assert!(q.step().unwrap());
   assert_eq!(q.get_string().unwrap(), "abc");
}

#[test]
fn test_clear_bindings_rewinds_select() {
   let db = setup_test_db();
   let mut q = db.create_query();
   q.add("SELECT ?");

   q.bind(1).unwrap();
   assert!(q.step().unwrap());
   assert_eq!(q.get_i64().unwrap(), 1);

   q.clear_bindings();
   q.bind(2).unwrap();
   assert!(q.step().unwrap());
   assert_eq!(q.get_i64().unwrap(), 2);
}

#[test]
fn test_reset_allows_new_sql() {
   let db = setup_test_db();
   let mut q = db.create_query();

   q.add("SELECT 1, 2");
   assert!(q.step().unwrap());
   assert_eq!(q.get_i64().unwrap(), 1);

   q.reset();
   assert_eq!(q.sql(), "");

   q.add("SELECT 'x'");
   assert!(q.step().unwrap());
   assert_eq!(q.get_string().unwrap(), "x");
   assert_column_out_of_range(q.skip().unwrap_err());
}

#[test]
fn test_and_step_chains_inline() {
   let db = setup_test_db();

   db.create_query()
      .add("INSERT INTO items (id, qty) VALUES")
      .add_array_rows(2, 3)
      .bind(1)
      .unwrap()
      .bind(5)
      .unwrap()
      .bind(2)
      .unwrap()
      .bind(6)
      .unwrap()
      .bind(3)
      .unwrap()
      .bind(7)
      .unwrap()
      .and_step()
      .unwrap();

   let mut q = db.create_query();
   q.add("SELECT SUM(qty) FROM items");
   assert!(q.step().unwrap());
   assert_eq!(q.get_i64().unwrap(), 18);
}
