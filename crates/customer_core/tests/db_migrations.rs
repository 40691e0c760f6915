use customer_core::db::migrations::{current_version, latest_version};
use customer_core::db::{open_db, open_db_in_memory, open_store, DbError};
use customer_core::{CoreConfig, DaoError, SqliteCustomerDao};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "customer");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO customer (name, email, age) VALUES ('Ada', 'ada@x.com', 30);",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_version(&conn_second).unwrap(), latest_version());
    let rows: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM customer;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_enforces_unique_email_and_not_null_age() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO customer (name, email, age) VALUES ('Ada', 'ada@x.com', 30);",
        [],
    )
    .unwrap();

    let duplicate = conn
        .execute(
            "INSERT INTO customer (name, email, age) VALUES ('Eve', 'ada@x.com', 22);",
            [],
        )
        .unwrap_err();
    assert_eq!(
        DbError::from(duplicate).constraint_kind(),
        Some(customer_core::ConstraintKind::Unique)
    );

    let missing_age = conn
        .execute(
            "INSERT INTO customer (name, email, age) VALUES ('Bob', 'bob@x.com', NULL);",
            [],
        )
        .unwrap_err();
    assert_eq!(
        DbError::from(missing_age).constraint_kind(),
        Some(customer_core::ConstraintKind::NotNull)
    );
}

#[test]
fn open_store_uses_configured_path_or_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("configured.db");
    let config = CoreConfig {
        db_path: Some(path.clone()),
        ..CoreConfig::default()
    };

    drop(open_store(&config).unwrap());
    assert!(path.exists());

    let in_memory = open_store(&CoreConfig::default()).unwrap();
    assert_eq!(current_version(&in_memory).unwrap(), latest_version());
}

#[test]
fn dao_rejects_connection_without_migrations() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteCustomerDao::try_new(&conn).err().expect("unmigrated connection");
    assert!(matches!(
        err,
        DaoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
