use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::NamedTempFile;

fn markdown_file(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Creating temp markdown file failed");
    write(file.path(), contents).expect("Writing temp markdown failed");
    file
}

#[test]
fn convert_prints_blocks_as_json() {
    let input = markdown_file("# Title\n\n- **one**\n- two\n");
    let mut cmd = Command::cargo_bin("drive-notion-sync").expect("Binary exists");

    cmd.arg("convert").arg(input.path()).arg("--compact");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"type\":\"heading_1\""))
        .stdout(predicate::str::contains("\"bulleted_list_item\""))
        .stdout(predicate::str::contains("\"bold\":true"))
        .stderr(predicate::str::contains("3 blocks, 1 append batches"));
}

#[test]
fn convert_fails_for_missing_file() {
    let mut cmd = Command::cargo_bin("drive-notion-sync").expect("Binary exists");
    cmd.arg("convert").arg("/definitely/not/here.md");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn sync_fails_without_tokens() {
    let config = NamedTempFile::new().unwrap();
    write(
        config.path(),
        "drive:\n  folder_id: f\nnotion:\n  database_id: d\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("drive-notion-sync").expect("Binary exists");
    cmd.arg("sync")
        .arg("--config")
        .arg(config.path())
        .env_remove("GOOGLE_ACCESS_TOKEN")
        .env_remove("NOTION_TOKEN");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("environment variable"));
}
