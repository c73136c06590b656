use super::*;
use std::fs;
use strata_migrate::MigrationStep;
use tempfile::TempDir;

#[test]
fn test_package_schema_is_directory_name() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("api");
    fs::create_dir(&dir).unwrap();

    assert_eq!(package_schema(&dir).unwrap(), "api");
    assert_eq!(package_schema(&dir.join(".")).unwrap(), "api");
    assert!(package_schema(&temp.path().join("missing")).is_err());
}

#[test]
fn test_load_package_from_disk() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("api");
    fs::create_dir_all(dir.join("functions")).unwrap();
    fs::write(dir.join("manifest.conf"), "# order matters\nfunctions/add.sql\n").unwrap();
    fs::write(
        dir.join("functions/add.sql"),
        "create function add(a int, b int) returns int as 'select a + b' language sql;\n",
    )
    .unwrap();

    let package = load_package(&dir).unwrap();
    assert_eq!(package.schema(), "api");
    assert_eq!(package.manifest(), ["functions/add.sql"]);

    let mut renderer = JinjaEnvironment::new();
    let sql = package
        .eval_all(&mut renderer, &strata_jinja::Data::new())
        .unwrap();
    assert!(sql.starts_with("-- functions/add.sql\n\ncreate function add"));
}

#[test]
fn test_load_package_without_manifest() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("api");
    fs::create_dir(&dir).unwrap();
    assert!(load_package(&dir).is_err());
}

fn write_api_package(root: &Path) -> PathBuf {
    let dir = root.join("api");
    fs::create_dir_all(dir.join("views")).unwrap();
    fs::write(dir.join("manifest.conf"), "schema.sql\nviews/users.sql\n").unwrap();
    fs::write(dir.join("schema.sql"), "create schema api;\n").unwrap();
    fs::write(
        dir.join("views/users.sql"),
        "create view api.users as select * from {{ app }}_users;\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_snapshot_copies_package_and_adds_migration() {
    let temp = TempDir::new().unwrap();
    let package = write_api_package(temp.path());
    let migrations = temp.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    fs::write(migrations.join("001_create_users.sql"), "create table acme_users(id int);").unwrap();

    let path = snapshot_package(&package, &migrations).unwrap();
    assert_eq!(path, migrations.join("002_install_api.sql"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{{ install_snapshot(\"002\") }}\n"
    );
    assert_eq!(
        fs::read_to_string(migrations.join("snapshots/002/views/users.sql")).unwrap(),
        "create view api.users as select * from {{ app }}_users;\n"
    );

    let data: strata_jinja::Data =
        serde_json::from_value(serde_json::json!({"app": "acme"})).unwrap();
    let mut renderer = JinjaEnvironment::new();
    let steps =
        strata_migrate::load_migrations(&DirSource::new(&migrations), &mut renderer, &data)
            .unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(
        steps[1].sql(strata_migrate::Direction::Up),
        Some("-- schema.sql\n\ncreate schema api;\n-- views/users.sql\n\ncreate view api.users as select * from acme_users;")
    );
}

#[test]
fn test_snapshot_refuses_existing_snapshot_dir() {
    let temp = TempDir::new().unwrap();
    let package = write_api_package(temp.path());
    let migrations = temp.path().join("migrations");
    fs::create_dir_all(migrations.join("snapshots/001")).unwrap();

    let err = snapshot_package(&package, &migrations).unwrap_err();
    assert!(err.to_string().contains("already exists"), "got {err:#}");
    assert!(!migrations.join("001_install_api.sql").exists());
}

#[test]
fn test_snapshot_requires_valid_package() {
    let temp = TempDir::new().unwrap();
    let package = temp.path().join("api");
    fs::create_dir(&package).unwrap();
    let migrations = temp.path().join("migrations");
    fs::create_dir(&migrations).unwrap();

    assert!(snapshot_package(&package, &migrations).is_err());
    assert!(!migrations.join(SNAPSHOTS_DIR).exists());
}
