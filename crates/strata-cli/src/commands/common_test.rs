use super::*;
use strata_db::{DbError, SqlErrorInfo};

#[test]
fn test_format_error_with_detail_hint_and_caret() {
    let err = MigrateError::MigrationExecution {
        name: "002_widgets.sql".to_string(),
        statement: "create table a(id int);\ninsert into a values ('x');".to_string(),
        source: DbError::Sql(SqlErrorInfo {
            message: "invalid input syntax for type integer: \"x\"".to_string(),
            code: Some("22P02".to_string()),
            detail: Some("the value is not a number".to_string()),
            hint: Some("quote numbers less".to_string()),
            position: Some(47),
        }),
    };

    assert_eq!(
        format_migrate_error(&err),
        "[M007] 002_widgets.sql: [D002] ERROR: invalid input syntax for type integer: \"x\" (SQLSTATE 22P02)\n\
         DETAIL: the value is not a number\n\
         HINT: quote numbers less\n\
         LINE 2: insert into a values ('x');\n\
         \x20                             ^"
    );
}

#[test]
fn test_format_error_without_sql_info() {
    assert_eq!(
        format_migrate_error(&MigrateError::Cancelled),
        MigrateError::Cancelled.to_string()
    );
}

#[test]
fn test_exit_code_is_silent() {
    let err: anyhow::Error = ExitCode(INTERRUPTED).into();
    assert_eq!(err.to_string(), "");
    assert_eq!(err.downcast_ref::<ExitCode>().map(|c| c.0), Some(130));
}

#[tokio::test]
async fn test_run_blocking_returns_result() {
    let value = run_blocking(|| Ok(21 * 2)).await.unwrap();
    assert_eq!(value, 42);

    let err = run_blocking(|| -> Result<()> { anyhow::bail!("boom") })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "boom");
}

#[tokio::test]
async fn test_wait_without_interrupt_returns_work_result() {
    let cancel = AtomicBool::new(false);
    let slot = CancelSlot::default();
    let value = wait_with_interrupts(async { Ok(7) }, &cancel, &slot)
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert!(!cancel.load(Ordering::SeqCst));
}
