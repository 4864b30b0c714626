use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

use drive_notion_sync::load_config::{load_config, load_static_config};

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

/// A static config plus both tokens in the environment gives complete settings.
#[test]
#[serial]
fn test_load_config_success_injects_env_secrets() {
    let file = config_file(
        r#"
drive:
  folder_id: folder-123
notion:
  database_id: db-456
"#,
    );
    env::set_var("GOOGLE_ACCESS_TOKEN", "google-token");
    env::set_var("NOTION_TOKEN", "notion-token");

    let settings = load_config(file.path()).expect("Config should load");

    assert_eq!(settings.config.drive.folder_id, "folder-123");
    assert!(settings.config.drive.recursive, "recursion defaults to on");
    assert_eq!(settings.config.notion.database_id, "db-456");
    assert_eq!(settings.config.notion.properties.title, "Name");
    assert_eq!(settings.config.notion.properties.file_id, "File ID");
    assert_eq!(settings.config.notion.properties.last_modified, "Last Modified");
    assert_eq!(settings.secrets.google_access_token, "google-token");
    assert_eq!(settings.secrets.notion_token, "notion-token");
}

#[test]
#[serial]
fn test_property_names_can_be_overridden() {
    let file = config_file(
        r#"
drive:
  folder_id: f
  recursive: false
notion:
  database_id: d
  properties:
    file_id: Source
"#,
    );

    let config = load_static_config(file.path()).expect("Config should load");
    assert!(!config.drive.recursive);
    assert_eq!(config.notion.properties.file_id, "Source");
    assert_eq!(config.notion.properties.title, "Name");
}

#[test]
#[serial]
fn test_load_config_errors_on_missing_env() {
    let file = config_file("drive:\n  folder_id: f\nnotion:\n  database_id: d\n");
    env::remove_var("GOOGLE_ACCESS_TOKEN");
    env::remove_var("NOTION_TOKEN");

    let msg = load_config(file.path()).unwrap_err().to_string();
    assert!(
        msg.contains("GOOGLE_ACCESS_TOKEN") || msg.contains("NOTION_TOKEN"),
        "Must error for missing env var, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let file = config_file("not-yaml: [:::");
    env::set_var("GOOGLE_ACCESS_TOKEN", "present");
    env::set_var("NOTION_TOKEN", "present");

    let msg = load_config(file.path()).unwrap_err().to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_empty_folder_id_is_rejected() {
    let file = config_file("drive:\n  folder_id: \"  \"\nnotion:\n  database_id: d\n");
    let msg = load_static_config(file.path()).unwrap_err().to_string();
    assert!(msg.contains("folder_id"), "got: {msg}");
}
