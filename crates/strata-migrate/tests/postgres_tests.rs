//! Integration tests against a live PostgreSQL server.
//!
//! Ignored by default. Point `STRATA_TEST_DATABASE_URL` at a disposable
//! database and run with `--ignored`. Every test works in its own schema,
//! dropped afterwards.

use postgres::{Client, NoTls};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use strata_db::{PostgresSession, Session};
use strata_migrate::{MigrateError, Migrator, MigratorOptions};

const URL_VAR: &str = "STRATA_TEST_DATABASE_URL";

fn database_url() -> String {
    std::env::var(URL_VAR).unwrap_or_else(|_| panic!("{URL_VAR} must be set"))
}

fn connect() -> PostgresSession {
    let client = Client::connect(&database_url(), NoTls).unwrap();
    PostgresSession::from_client(client)
}

/// A uniquely named schema dropped when the test ends
struct TestSchema {
    name: String,
}

impl TestSchema {
    fn create() -> Self {
        let name = format!("strata_test_{}", uuid::Uuid::new_v4().simple());
        connect()
            .execute_batch(&format!("create schema {name}"))
            .unwrap();
        Self { name }
    }

    fn migrator(&self) -> Migrator {
        Migrator::new(MigratorOptions {
            disable_tx: false,
            version_table: format!("{}.schema_version", self.name),
        })
    }
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        let _ = connect().execute_batch(&format!("drop schema if exists {} cascade", self.name));
    }
}

#[test]
#[ignore = "requires STRATA_TEST_DATABASE_URL"]
fn test_migrate_up_and_down() {
    let schema = TestSchema::create();
    let s = &schema.name;
    let mut session = connect();
    let mut m = schema.migrator();
    m.append_migration(
        "create_t1",
        &format!("create table {s}.t1(id serial primary key);"),
        &format!("drop table {s}.t1;"),
    );
    m.append_migration(
        "create_t2",
        &format!("create table {s}.t2(id int references {s}.t1);"),
        &format!("drop table {s}.t2;"),
    );

    m.migrate(&mut session).unwrap();
    assert_eq!(m.current_version(&mut session).unwrap(), 2);
    assert!(session.table_exists(&format!("{s}.t2")).unwrap());

    m.migrate_to(&mut session, 0).unwrap();
    assert_eq!(m.current_version(&mut session).unwrap(), 0);
    assert!(!session.table_exists(&format!("{s}.t1")).unwrap());
}

#[test]
#[ignore = "requires STRATA_TEST_DATABASE_URL"]
fn test_error_position_maps_to_line() {
    let schema = TestSchema::create();
    let s = &schema.name;
    let mut session = connect();
    let mut m = schema.migrator();
    m.append_migration(
        "broken",
        &format!("create table {s}.t1(id int);\nselect missing_column\n  from {s}.t1;"),
        "",
    );

    let err = m.migrate(&mut session).unwrap_err();
    let info = err.sql_info().unwrap();
    assert_eq!(info.code.as_deref(), Some("42703"));

    let line = err.sql_diagnostic().unwrap();
    assert_eq!(line.line_num, 2);
    assert_eq!(line.text, "select missing_column");
    assert_eq!(line.column_num, 8);

    // The failed step rolled back, including the table it created.
    assert_eq!(m.current_version(&mut session).unwrap(), 0);
    assert!(!session.table_exists(&format!("{s}.t1")).unwrap());
}

#[test]
#[ignore = "requires STRATA_TEST_DATABASE_URL"]
fn test_disable_tx_allows_concurrent_index() {
    let schema = TestSchema::create();
    let s = &schema.name;
    let mut session = connect();
    let mut m = schema.migrator();
    m.append_migration("create_t1", &format!("create table {s}.t1(id int);"), "");
    m.append_migration(
        "index_t1",
        &format!(
            "---- strata: disable-tx ----\ncreate index concurrently t1_id_idx on {s}.t1(id);"
        ),
        &format!("---- strata: disable-tx ----\ndrop index concurrently {s}.t1_id_idx;"),
    );

    m.migrate(&mut session).unwrap();
    assert_eq!(m.current_version(&mut session).unwrap(), 2);
    assert_eq!(
        session
            .query_i64(
                "select count(*) from pg_indexes where schemaname = $1 and indexname = 't1_id_idx'",
                &[strata_db::Param::Text(s.clone())],
            )
            .unwrap(),
        Some(1)
    );

    m.migrate_to(&mut session, 1).unwrap();
    assert_eq!(m.current_version(&mut session).unwrap(), 1);
}

#[test]
#[ignore = "requires STRATA_TEST_DATABASE_URL"]
fn test_concurrent_migrators_serialize_on_lock() {
    let schema = TestSchema::create();
    let version_table = format!("{}.schema_version", schema.name);
    let table = format!("{}.t1", schema.name);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let version_table = version_table.clone();
            let table = table.clone();
            thread::spawn(move || {
                let mut session = connect();
                let mut m = Migrator::new(MigratorOptions {
                    disable_tx: false,
                    version_table,
                });
                m.append_migration(
                    "slow_create",
                    &format!("select pg_sleep(0.3);\ncreate table {table}(id int);"),
                    "",
                );
                barrier.wait();
                m.migrate(&mut session).unwrap();
                m.current_version(&mut session).unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }

    let mut session = connect();
    assert_eq!(
        session
            .query_i64(&format!("select count(*) from {version_table}"), &[])
            .unwrap(),
        Some(1)
    );
}

#[test]
#[ignore = "requires STRATA_TEST_DATABASE_URL"]
fn test_cancel_running_statement() {
    let schema = TestSchema::create();
    let mut session = connect();
    let token = session.cancel_token();
    let mut m = schema.migrator();
    m.append_migration("sleepy", "select pg_sleep(30);", "");

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        token.cancel_query(NoTls).unwrap();
    });

    let err = m.migrate(&mut session).unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, MigrateError::MigrationExecution { .. }));
    assert_eq!(err.sql_info().unwrap().code.as_deref(), Some("57014"));
    assert_eq!(m.current_version(&mut session).unwrap(), 0);
}
