use super::*;
use tempfile::TempDir;

fn touch(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), format!("-- {name}\n")).unwrap();
    }
}

#[test]
fn test_split_name() {
    assert_eq!(split_name("003_add_email.sql"), Some((3, "_add_email.sql")));
    assert_eq!(split_name("12_x.sql"), Some((12, "_x.sql")));
    assert_eq!(split_name("notes.sql"), None);
    assert_eq!(split_name("003_add_email.sql.bak"), None);
}

#[test]
fn test_merged_migrations_move_after_recorded_ones() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    touch(dir, &["001_users.sql", "002_posts.sql", "003_comments.sql"]);

    assert_eq!(renumber_start(dir).unwrap(), 3);
    assert!(dir.join(RENUMBER_FILE).exists());

    // The other branch also added 002 and 003
    touch(dir, &["002_tags.sql", "003_tag_posts.sql", "README.md"]);
    fs::create_dir(dir.join("shared")).unwrap();

    let renames = renumber_finish(dir).unwrap();
    assert_eq!(
        renames,
        vec![
            ("002_tags.sql".to_string(), "004_tags.sql".to_string()),
            ("003_tag_posts.sql".to_string(), "005_tag_posts.sql".to_string()),
        ]
    );

    assert_eq!(
        list_migration_files(dir).unwrap(),
        vec![
            "001_users.sql",
            "002_posts.sql",
            "003_comments.sql",
            "004_tags.sql",
            "005_tag_posts.sql",
        ]
    );
    assert_eq!(
        fs::read_to_string(dir.join("004_tags.sql")).unwrap(),
        "-- 002_tags.sql\n"
    );
    assert!(!dir.join(RENUMBER_FILE).exists());
}

#[test]
fn test_finish_with_nothing_new() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), &["001_users.sql"]);
    renumber_start(temp.path()).unwrap();

    assert!(renumber_finish(temp.path()).unwrap().is_empty());
    assert!(temp.path().join("001_users.sql").exists());
}

#[test]
fn test_finish_in_empty_recording_starts_at_one() {
    let temp = TempDir::new().unwrap();
    renumber_start(temp.path()).unwrap();
    touch(temp.path(), &["007_imported.sql"]);

    let renames = renumber_finish(temp.path()).unwrap();
    assert_eq!(
        renames,
        vec![("007_imported.sql".to_string(), "001_imported.sql".to_string())]
    );
}

#[test]
fn test_finish_without_start_is_an_error() {
    let temp = TempDir::new().unwrap();
    touch(temp.path(), &["001_users.sql"]);

    let err = renumber_finish(temp.path()).unwrap_err();
    assert!(
        format!("{err:#}").contains("renumber start"),
        "got {err:#}"
    );
}
