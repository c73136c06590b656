use super::*;
use strata_core::Config;

fn ctx() -> RuntimeContext {
    let mut config = Config::default();
    config.database.host = Some("localhost".to_string());
    config.database.database = Some("app".to_string());
    RuntimeContext {
        config,
        config_path: None,
        verbose: false,
    }
}

#[test]
fn test_format_status_pending() {
    let status = MigrationStatus {
        current_version: 1,
        last_version: 3,
    };
    assert_eq!(
        format_status(&status, &ctx()),
        "status:   2 migration(s) pending\nversion:  1 of 3\nhost:     localhost\ndatabase: app"
    );
}

#[test]
fn test_format_status_up_to_date() {
    let status = MigrationStatus {
        current_version: 3,
        last_version: 3,
    };
    assert!(format_status(&status, &ctx()).starts_with("status:   up to date\n"));
}
