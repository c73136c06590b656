use super::*;

#[test]
fn test_in_memory() {
    let session = DuckDbSession::new(":memory:").unwrap();
    assert_eq!(session.backend_name(), "duckdb");
}

#[test]
fn test_execute_with_params() {
    let mut session = DuckDbSession::in_memory().unwrap();
    session
        .execute_batch("create table t(version integer not null); insert into t values (0);")
        .unwrap();

    let affected = session
        .execute("update t set version = $1", &[Param::Int(3)])
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(
        session.query_i64("select version from t", &[]).unwrap(),
        Some(3)
    );
}

#[test]
fn test_query_no_rows() {
    let mut session = DuckDbSession::in_memory().unwrap();
    session.execute_batch("create table t(id integer)").unwrap();
    assert_eq!(session.query_i64("select id from t", &[]).unwrap(), None);
}

#[test]
fn test_table_exists() {
    let mut session = DuckDbSession::in_memory().unwrap();
    assert!(!session.table_exists("widgets").unwrap());

    session
        .execute_batch("create schema ops; create table ops.widgets(id integer); create view v as select 1")
        .unwrap();

    assert!(session.table_exists("ops.widgets").unwrap());
    assert!(!session.table_exists("widgets").unwrap());
    assert!(!session.table_exists("v").unwrap());
}

#[test]
fn test_transaction_rollback() {
    let mut session = DuckDbSession::in_memory().unwrap();
    session.execute_batch("create table t(id integer)").unwrap();

    session.begin().unwrap();
    session.execute_batch("insert into t values (1)").unwrap();
    session.rollback().unwrap();

    assert_eq!(
        session.query_i64("select count(*) from t", &[]).unwrap(),
        Some(0)
    );
}

#[test]
fn test_sql_error_is_structured() {
    let mut session = DuckDbSession::in_memory().unwrap();
    let err = session.execute_batch("select * from missing_table").unwrap_err();
    assert!(err.sql_info().is_some(), "got {err:?}");
}

#[test]
fn test_file_database_persists() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("strata.duckdb");
    {
        let mut session = DuckDbSession::from_path(&path).unwrap();
        session.execute_batch("create table t(id integer)").unwrap();
    }
    let mut session = DuckDbSession::from_path(&path).unwrap();
    assert!(session.table_exists("t").unwrap());
}

#[test]
fn test_prepend_search_path_and_reset() {
    let mut session = DuckDbSession::in_memory().unwrap();
    session
        .execute_batch("create table base(id integer); create schema pkg")
        .unwrap();

    session.prepend_search_path("pkg").unwrap();
    session.execute_batch("create table made_here(id integer)").unwrap();
    // Tables in main are still visible.
    session.execute_batch("select * from base").unwrap();
    assert!(session.table_exists("pkg.made_here").unwrap());

    session.reset_session().unwrap();
    session.execute_batch("create table after_reset(id integer)").unwrap();
    assert!(session.table_exists("main.after_reset").unwrap());
}
