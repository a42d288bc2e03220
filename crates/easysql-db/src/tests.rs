//! Unit tests for the store adapter over an in-memory database.

use std::io::Write;
use std::sync::{Arc, Mutex};

use easysql_types::{ColumnDef, ForeignKey, Row, Value};

use crate::error::StoreError;
use crate::identifier::IdentifierPolicy;
use crate::store::{InsertOutcome, Store};

/// Creates an in-memory store with an `employees` table.
fn test_store() -> Store {
    let store = Store::in_memory().expect("should open in-memory store");
    store
        .create_table("employees", &employee_columns(), &[])
        .expect("should create employees");
    store
}

fn employee_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", "INTEGER").constraints("PRIMARY KEY"),
        ColumnDef::new("email", "TEXT"),
        ColumnDef::new("name", "TEXT"),
    ]
}

fn employee(id: i64, email: &str, name: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("email", email)
        .with("name", name)
}

/// Log sink shared between a test and its subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log buffer lock").clone();
        String::from_utf8(bytes).expect("logs should be utf-8")
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a WARN-level subscriber and returns what it logged.
fn warnings_during<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, logs.contents())
}

fn count(store: &Store, table: &str) -> usize {
    store
        .select(table, "*", None, &[])
        .expect("select should succeed")
        .len()
}

// ── create_table / drop_table / list_tables ─────────────────────────

#[test]
fn create_table_twice_keeps_data() {
    let store = test_store();
    store
        .insert("employees", &employee(1, "a@x.com", "A"), &[])
        .expect("insert should succeed");

    store
        .create_table("employees", &employee_columns(), &[])
        .expect("second create should succeed");

    assert_eq!(count(&store, "employees"), 1);
}

#[test]
fn create_table_ignores_shape_of_existing_table() {
    let store = test_store();
    store
        .create_table("employees", &[ColumnDef::new("other", "BLOB")], &[])
        .expect("incompatible shape is not checked");

    let rows = store
        .select("employees", "*", None, &[])
        .expect("select should succeed");
    assert!(rows.is_empty());
}

#[test]
fn malformed_ddl_is_schema_error() {
    let store = test_store();
    let err = store
        .create_table("broken", &[ColumnDef::new("id", "INTEGER").constraints("PRIMARY")], &[])
        .expect_err("dangling PRIMARY should fail");
    assert!(matches!(err, StoreError::Schema { ref object, .. } if object == "broken"));
}

#[test]
fn create_table_with_foreign_key_is_enforced() {
    let store = test_store();
    store
        .create_table(
            "departments",
            &[ColumnDef::new("id", "INTEGER").constraints("PRIMARY KEY")],
            &[],
        )
        .expect("should create departments");
    store
        .create_table(
            "assignments",
            &[
                ColumnDef::new("employee_id", "INTEGER"),
                ColumnDef::new("department_id", "INTEGER"),
            ],
            &[ForeignKey::new("department_id", "departments", "id")],
        )
        .expect("should create assignments");

    let orphan = Row::new().with("employee_id", 1).with("department_id", 99);
    let err = store
        .insert("assignments", &orphan, &[])
        .expect_err("foreign key violation should fail");
    assert!(matches!(err, StoreError::Query { .. }));
}

#[test]
fn list_tables_reports_created_tables() {
    let store = test_store();
    store
        .create_table("audit", &[ColumnDef::new("id", "INTEGER")], &[])
        .expect("should create audit");

    let tables = store.list_tables().expect("list should succeed");
    assert_eq!(tables, vec!["audit".to_string(), "employees".to_string()]);
}

#[test]
fn list_tables_hides_sqlite_internals() {
    let store = Store::in_memory().expect("should open");
    store
        .create_table(
            "seq",
            &[ColumnDef::new("id", "INTEGER").constraints("PRIMARY KEY AUTOINCREMENT")],
            &[],
        )
        .expect("should create");
    store
        .insert("seq", &Row::new(), &[])
        .expect("default insert should succeed");

    let tables = store.list_tables().expect("list should succeed");
    assert_eq!(tables, vec!["seq".to_string()]);
}

#[test]
fn list_tables_keeps_user_tables_that_start_with_sqlite() {
    let store = Store::in_memory().expect("should open");
    for name in ["sqlitelogs", "SQLiteCache"] {
        store
            .create_table(name, &[ColumnDef::new("id", "INTEGER")], &[])
            .expect("should create");
    }

    let tables = store.list_tables().expect("list should succeed");
    assert_eq!(
        tables,
        vec!["SQLiteCache".to_string(), "sqlitelogs".to_string()]
    );
}

#[test]
fn drop_table_removes_from_listing_and_is_idempotent() {
    let store = test_store();
    store.drop_table("employees").expect("first drop should succeed");
    store.drop_table("employees").expect("second drop should succeed");

    let tables = store.list_tables().expect("list should succeed");
    assert!(!tables.contains(&"employees".to_string()));
}

// ── insert / is_duplicate ───────────────────────────────────────────

#[test]
fn employees_scenario() {
    let store = test_store();

    let first = store
        .insert("employees", &employee(1, "a@x.com", "A"), &["email"])
        .expect("first insert should succeed");
    assert_eq!(first, InsertOutcome::Inserted);

    let second = store
        .insert("employees", &employee(2, "a@x.com", "B"), &["email"])
        .expect("second insert should not fail");
    assert_eq!(second, InsertOutcome::Skipped);

    let rows = store
        .select("employees", "*", None, &[])
        .expect("select should succeed");
    assert_eq!(rows, vec![employee(1, "a@x.com", "A")]);
}

#[test]
fn duplicate_requires_all_present_unique_columns_to_match() {
    let store = test_store();
    store
        .insert("employees", &employee(1, "a@x.com", "A"), &[])
        .expect("seed insert");

    let same_email_other_name = employee(2, "a@x.com", "B");
    let outcome = store
        .insert("employees", &same_email_other_name, &["email", "name"])
        .expect("insert should succeed");
    assert_eq!(outcome, InsertOutcome::Inserted);
    assert_eq!(count(&store, "employees"), 2);
}

#[test]
fn empty_unique_columns_always_insert() {
    let store = test_store();
    let row = Row::new().with("email", "a@x.com").with("name", "A");
    for _ in 0..3 {
        let outcome = store.insert("employees", &row, &[]).expect("insert");
        assert_eq!(outcome, InsertOutcome::Inserted);
    }
    assert_eq!(count(&store, "employees"), 3);
}

#[test]
fn unique_columns_absent_from_row_are_ignored() {
    let store = test_store();
    let row = Row::new().with("name", "A");
    store.insert("employees", &row, &["email"]).expect("insert");
    let outcome = store.insert("employees", &row, &["email"]).expect("insert");

    assert_eq!(outcome, InsertOutcome::Inserted);
    assert_eq!(count(&store, "employees"), 2);
    assert!(!store
        .is_duplicate("employees", &row, &["email"])
        .expect("check should succeed"));
}

#[test]
fn is_duplicate_detects_existing_values() {
    let store = test_store();
    store
        .insert("employees", &employee(1, "a@x.com", "A"), &[])
        .expect("seed insert");

    let probe = Row::new().with("email", "a@x.com");
    assert!(store
        .is_duplicate("employees", &probe, &["email"])
        .expect("check should succeed"));
    assert!(!store
        .is_duplicate("employees", &probe, &[])
        .expect("check should succeed"));

    let other = Row::new().with("email", "b@x.com");
    assert!(!store
        .is_duplicate("employees", &other, &["email"])
        .expect("check should succeed"));
}

#[test]
fn is_duplicate_on_missing_table_is_query_error() {
    let store = test_store();
    let probe = Row::new().with("email", "a@x.com");
    let err = store
        .is_duplicate("nope", &probe, &["email"])
        .expect_err("missing table should fail");
    assert!(matches!(err, StoreError::Query { ref table, .. } if table == "nope"));
}

#[test]
fn constraint_violation_on_insert_is_query_error() {
    let store = test_store();
    store
        .insert("employees", &employee(1, "a@x.com", "A"), &[])
        .expect("seed insert");
    let err = store
        .insert("employees", &employee(1, "b@x.com", "B"), &[])
        .expect_err("primary key clash should fail");
    assert!(matches!(err, StoreError::Query { .. }));
}

#[test]
fn insert_ignoring_conflicts_uses_backend_constraint() {
    let store = Store::in_memory().expect("should open");
    store
        .create_table(
            "users",
            &[
                ColumnDef::new("id", "INTEGER").constraints("PRIMARY KEY"),
                ColumnDef::new("email", "TEXT").constraints("NOT NULL UNIQUE"),
            ],
            &[],
        )
        .expect("should create users");

    let first = Row::new().with("email", "a@x.com");
    assert_eq!(
        store.insert_ignoring_conflicts("users", &first).expect("insert"),
        InsertOutcome::Inserted
    );
    assert_eq!(
        store.insert_ignoring_conflicts("users", &first).expect("insert"),
        InsertOutcome::Skipped
    );
    assert_eq!(count(&store, "users"), 1);
}

#[test]
fn values_round_trip_through_insert_and_select() {
    let store = Store::in_memory().expect("should open");
    store
        .create_table(
            "samples",
            &[
                ColumnDef::new("i", "INTEGER"),
                ColumnDef::new("r", "REAL"),
                ColumnDef::new("t", "TEXT"),
                ColumnDef::new("b", "BLOB"),
                ColumnDef::new("n", "TEXT"),
            ],
            &[],
        )
        .expect("should create samples");

    let row = Row::new()
        .with("i", 42)
        .with("r", 1.25)
        .with("t", "it's; DROP TABLE samples; --")
        .with("b", vec![0u8, 159, 146, 150])
        .with("n", Value::Null);
    store.insert("samples", &row, &[]).expect("insert");

    let rows = store.select("samples", "*", None, &[]).expect("select");
    assert_eq!(rows, vec![row]);
}

// ── update / delete ─────────────────────────────────────────────────

#[test]
fn update_touches_only_targeted_columns_and_rows() {
    let store = test_store();
    store.insert("employees", &employee(1, "a@x.com", "A"), &[]).expect("seed");
    store.insert("employees", &employee(2, "b@x.com", "B"), &[]).expect("seed");

    let affected = store
        .update(
            "employees",
            &Row::new().with("name", "Alice"),
            "id = ?",
            &[Value::Integer(1)],
        )
        .expect("update should succeed");
    assert_eq!(affected, 1);

    let rows = store
        .select("employees", "*", Some("1 = 1 ORDER BY id"), &[])
        .expect("select");
    assert_eq!(
        rows,
        vec![employee(1, "a@x.com", "Alice"), employee(2, "b@x.com", "B")]
    );
}

#[test]
fn update_with_multiple_set_columns_and_params() {
    let store = test_store();
    store.insert("employees", &employee(1, "a@x.com", "A"), &[]).expect("seed");
    store.insert("employees", &employee(2, "b@x.com", "B"), &[]).expect("seed");

    let affected = store
        .update(
            "employees",
            &Row::new().with("email", "z@x.com").with("name", "Z"),
            "id = ? OR name = ?",
            &[Value::Integer(1), Value::from("B")],
        )
        .expect("update should succeed");
    assert_eq!(affected, 2);

    let rows = store
        .select("employees", ["email"], Some("email = ?"), &["z@x.com".into()])
        .expect("select");
    assert_eq!(rows.len(), 2);
}

#[test]
fn update_condition_with_numbered_placeholder_collides_with_set_slot() {
    let store = test_store();
    store.insert("employees", &employee(1, "a@x.com", "A"), &[]).expect("seed");

    let err = store
        .update(
            "employees",
            &Row::new().with("name", "Alice"),
            "id = ?1",
            &[Value::Integer(1)],
        )
        .expect_err("?1 refers to the SET value, leaving a param unbound");
    assert!(matches!(err, StoreError::Query { .. }));

    let rows = store
        .select("employees", ["name"], None, &[])
        .expect("select");
    assert_eq!(rows[0].get("name"), Some(&Value::from("A")));
}

#[test]
fn update_with_empty_row_is_rejected() {
    let store = test_store();
    let err = store
        .update("employees", &Row::new(), "id = ?", &[Value::Integer(1)])
        .expect_err("empty update should fail");
    assert!(matches!(err, StoreError::Query { .. }));
}

#[test]
fn delete_removes_only_matching_rows() {
    let store = test_store();
    store.insert("employees", &employee(1, "a@x.com", "A"), &[]).expect("seed");
    store.insert("employees", &employee(2, "b@x.com", "B"), &[]).expect("seed");

    let affected = store
        .delete("employees", "email = ?", &["a@x.com".into()])
        .expect("delete should succeed");
    assert_eq!(affected, 1);

    let gone = store
        .select("employees", "*", Some("email = ?"), &["a@x.com".into()])
        .expect("select");
    assert!(gone.is_empty());
    assert_eq!(
        store.select("employees", "*", None, &[]).expect("select"),
        vec![employee(2, "b@x.com", "B")]
    );
}

// ── select ──────────────────────────────────────────────────────────

#[test]
fn select_projects_requested_columns_in_order() {
    let store = test_store();
    store.insert("employees", &employee(1, "a@x.com", "A"), &[]).expect("seed");

    let rows = store
        .select("employees", vec!["name", "id"], None, &[])
        .expect("select");
    let cols: Vec<&str> = rows[0].columns().collect();
    assert_eq!(cols, vec!["name", "id"]);

    let rows = store
        .select("employees", "email,name", None, &[])
        .expect("select");
    assert_eq!(rows[0].len(), 2);
}

#[test]
fn select_with_no_match_is_empty_not_error() {
    let store = test_store();
    let rows = store
        .select("employees", "*", Some("id = ?"), &[Value::Integer(404)])
        .expect("select should succeed");
    assert!(rows.is_empty());
}

#[test]
fn select_failure_is_query_error() {
    let store = test_store();
    let err = store
        .select("employees", "*", Some("no_such_column = ?"), &[Value::Integer(1)])
        .expect_err("bad column should fail");
    assert!(matches!(err, StoreError::Query { .. }));
}

#[test]
fn condition_params_are_bound_not_interpolated() {
    let store = test_store();
    store.insert("employees", &employee(1, "a@x.com", "A"), &[]).expect("seed");

    let rows = store
        .select("employees", "*", Some("name = ?"), &["A' OR '1'='1".into()])
        .expect("select");
    assert!(rows.is_empty());
    assert_eq!(count(&store, "employees"), 1);
}

// ── identifier policy ───────────────────────────────────────────────

#[test]
fn validated_policy_rejects_bad_names_before_touching_backend() {
    let store = test_store().with_identifier_policy(IdentifierPolicy::Validated);

    let err = store
        .drop_table("employees; DROP TABLE audit")
        .expect_err("should reject");
    assert!(matches!(err, StoreError::InvalidIdentifier(_)));

    let bad_column = Row::new().with("name) VALUES ('x'); --", "A");
    let err = store
        .insert("employees", &bad_column, &[])
        .expect_err("should reject");
    assert!(matches!(err, StoreError::InvalidIdentifier(_)));

    let err = store
        .select("employees", "id, name FROM employees --", None, &[])
        .expect_err("should reject");
    assert!(matches!(err, StoreError::InvalidIdentifier(_)));

    assert_eq!(count(&store, "employees"), 0);
}

#[test]
fn validated_policy_accepts_plain_names() {
    let store = test_store().with_identifier_policy(IdentifierPolicy::Validated);
    let outcome = store
        .insert("employees", &employee(1, "a@x.com", "A"), &["email"])
        .expect("insert should succeed");
    assert_eq!(outcome, InsertOutcome::Inserted);
    assert_eq!(
        store
            .select("employees", ["id", "name"], None, &[])
            .expect("select")
            .len(),
        1
    );
}

#[test]
fn rejected_identifier_is_logged_once_at_warn() {
    let store = test_store().with_identifier_policy(IdentifierPolicy::Validated);

    let (result, logs) = warnings_during(|| store.drop_table("employees; --"));
    assert!(matches!(result, Err(StoreError::InvalidIdentifier(_))));
    assert_eq!(logs.matches("store operation failed").count(), 1, "{logs}");
    assert!(logs.contains("invalid identifier"), "{logs}");
}

#[test]
fn query_failure_is_logged_once_at_warn() {
    let store = test_store();

    let (result, logs) = warnings_during(|| store.select("missing", "*", None, &[]));
    assert!(matches!(result, Err(StoreError::Query { .. })));
    assert_eq!(logs.matches("store operation failed").count(), 1, "{logs}");
}
