use kitchen_core::db::migrations::latest_version;
use kitchen_core::db::{open_db, open_db_in_memory, DbError};
use kitchen_core::{OrderStore, RepoError, SqliteOrderStore};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "orders");
    assert_table_exists(&conn, "order_events");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kitchen.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "orders");
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
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteOrderStore::try_new(conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn initialize_is_idempotent() {
    let store = SqliteOrderStore::open_in_memory().unwrap();
    store.initialize().unwrap();
    store.initialize().unwrap();
    assert!(store.get_active_orders().unwrap().is_empty());
}

#[test]
fn events_table_is_append_only() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO order_events (event_id, order_number, event_type, to_status, occurred_at, actor_id)
         VALUES ('e1', 'ORDER-0001', 'ORDER_CREATED', 'RECEIVED_UNCONFIRMED', 1, 'system');",
        [],
    )
    .unwrap();

    assert!(conn
        .execute("UPDATE order_events SET actor_id = 'someone';", [])
        .is_err());
    assert!(conn.execute("DELETE FROM order_events;", []).is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
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
