use std::sync::{Arc, Mutex};

use drive_notion_sync::contract::{
    DriveFile, MockDocumentStore, MockSourceDrive, NewPage, PageRecord, ServiceError,
    DOCUMENT_MIME_TYPE, FOLDER_MIME_TYPE, MARKDOWN_MIME_TYPE,
};
use drive_notion_sync::synchronise::{discover, synchronise, SyncError, SyncOutcome, SynchroniseConfig};
use mockall::Sequence;

fn entry(id: &str, name: &str, mime_type: &str, modified: &str) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        modified_time: modified.to_string(),
    }
}

fn config() -> SynchroniseConfig {
    SynchroniseConfig {
        folder_id: "root".to_string(),
        recursive: true,
    }
}

#[tokio::test]
async fn test_discover_walks_subfolders_depth_first() {
    let mut drive = MockSourceDrive::new();
    drive
        .expect_list_folder()
        .withf(|folder| folder == "root")
        .returning(|_| {
            Ok(vec![
                entry("a", "a.md", MARKDOWN_MIME_TYPE, "t"),
                entry("sub", "Sub", FOLDER_MIME_TYPE, "t"),
                entry("img", "pic.png", "image/png", "t"),
                entry("d", "Doc", DOCUMENT_MIME_TYPE, "t"),
            ])
        });
    drive
        .expect_list_folder()
        .withf(|folder| folder == "sub")
        .returning(|_| Ok(vec![entry("b", "b.markdown", "text/plain", "t")]));

    let files = discover(&drive, "root", true).await.expect("discovery succeeds");
    let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "d"]);
}

#[tokio::test]
async fn test_discover_without_recursion_ignores_subfolders() {
    let mut drive = MockSourceDrive::new();
    drive.expect_list_folder().times(1).returning(|_| {
        Ok(vec![
            entry("sub", "Sub", FOLDER_MIME_TYPE, "t"),
            entry("a", "a.md", MARKDOWN_MIME_TYPE, "t"),
        ])
    });

    let files = discover(&drive, "root", false).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, "a");
}

#[tokio::test]
async fn test_listing_failure_aborts_the_run() {
    let mut drive = MockSourceDrive::new();
    drive
        .expect_list_folder()
        .returning(|_| Err(ServiceError::RateLimited { service: "drive" }));
    let store = MockDocumentStore::new();

    let result = synchronise(&config(), &drive, &store).await;
    assert!(matches!(result, Err(SyncError::Discovery { .. })));
}

#[tokio::test]
async fn test_new_file_is_created_then_filled_then_marked() {
    let mut drive = MockSourceDrive::new();
    drive
        .expect_list_folder()
        .returning(|_| Ok(vec![entry("f1", "notes.md", MARKDOWN_MIME_TYPE, "2024-01-02")]));
    drive
        .expect_export_markdown()
        .times(1)
        .returning(|_| Ok("# Notes\n\nHello **world**.\n".to_string()));

    let mut store = MockDocumentStore::new();
    let mut seq = Sequence::new();
    store
        .expect_find_page()
        .withf(|id| id == "f1")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(None));
    store
        .expect_create_page()
        .withf(|page: &NewPage| {
            page.title == "notes" && page.file_id == "f1" && page.last_modified.is_empty()
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(PageRecord {
                page_id: "p1".to_string(),
                last_modified: String::new(),
            })
        });
    store
        .expect_append_children()
        .withf(|parent, children| parent == "p1" && children.len() == 2)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    store
        .expect_update_last_modified()
        .withf(|page, marker| page == "p1" && marker == "2024-01-02")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    store.expect_list_child_blocks().never();

    let report = synchronise(&config(), &drive, &store).await.unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(
        report.files[0].outcome,
        SyncOutcome::Created {
            page_id: "p1".to_string(),
            blocks: 2
        }
    );
}

#[tokio::test]
async fn test_unchanged_file_is_skipped_without_export() {
    let mut drive = MockSourceDrive::new();
    drive
        .expect_list_folder()
        .returning(|_| Ok(vec![entry("f1", "notes.md", MARKDOWN_MIME_TYPE, "same")]));
    drive.expect_export_markdown().never();

    let mut store = MockDocumentStore::new();
    store.expect_find_page().returning(|_| {
        Ok(Some(PageRecord {
            page_id: "p1".to_string(),
            last_modified: "same".to_string(),
        }))
    });
    store.expect_append_children().never();
    store.expect_update_last_modified().never();

    let report = synchronise(&config(), &drive, &store).await.unwrap();
    assert_eq!(report.skipped(), 1);
    assert_eq!(
        report.files[0].outcome,
        SyncOutcome::Skipped {
            page_id: "p1".to_string()
        }
    );
}

#[tokio::test]
async fn test_changed_file_replaces_content() {
    let mut drive = MockSourceDrive::new();
    drive
        .expect_list_folder()
        .returning(|_| Ok(vec![entry("f1", "Doc", DOCUMENT_MIME_TYPE, "new")]));
    drive
        .expect_export_markdown()
        .returning(|_| Ok("- one\n- two\n- three\n".to_string()));

    let mut store = MockDocumentStore::new();
    let order = Arc::new(Mutex::new(Vec::<String>::new()));
    store.expect_find_page().returning(|_| {
        Ok(Some(PageRecord {
            page_id: "p1".to_string(),
            last_modified: "old".to_string(),
        }))
    });
    let log = Arc::clone(&order);
    store.expect_list_child_blocks().returning(move |_| {
        log.lock().unwrap().push("list".into());
        Ok(vec!["c1".to_string()])
    });
    let log = Arc::clone(&order);
    store.expect_delete_block().returning(move |id| {
        log.lock().unwrap().push(format!("delete {id}"));
        Ok(())
    });
    let log = Arc::clone(&order);
    store.expect_append_children().returning(move |_, children| {
        log.lock().unwrap().push(format!("append {}", children.len()));
        Ok(())
    });
    let log = Arc::clone(&order);
    store
        .expect_update_last_modified()
        .returning(move |_, marker| {
            log.lock().unwrap().push(format!("mark {marker}"));
            Ok(())
        });
    store.expect_create_page().never();

    let report = synchronise(&config(), &drive, &store).await.unwrap();
    assert_eq!(
        report.files[0].outcome,
        SyncOutcome::Updated {
            page_id: "p1".to_string(),
            blocks: 3
        }
    );
    assert_eq!(
        *order.lock().unwrap(),
        vec!["list", "delete c1", "append 3", "mark new"]
    );
}

#[tokio::test]
async fn test_failed_file_is_reported_and_run_continues() {
    let mut drive = MockSourceDrive::new();
    drive.expect_list_folder().returning(|_| {
        Ok(vec![
            entry("big", "Huge Doc", DOCUMENT_MIME_TYPE, "t1"),
            entry("ok", "ok.md", MARKDOWN_MIME_TYPE, "t2"),
        ])
    });
    drive
        .expect_export_markdown()
        .withf(|file: &DriveFile| file.id == "big")
        .returning(|f| {
            Err(ServiceError::ExportTooLarge {
                file_id: f.id.clone(),
            })
        });
    drive
        .expect_export_markdown()
        .withf(|file: &DriveFile| file.id == "ok")
        .returning(|_| Ok("text\n".to_string()));

    let mut store = MockDocumentStore::new();
    store.expect_find_page().returning(|_| Ok(None));
    store.expect_create_page().times(1).returning(|page| {
        Ok(PageRecord {
            page_id: format!("page-{}", page.file_id),
            last_modified: String::new(),
        })
    });
    store.expect_append_children().returning(|_, _| Ok(()));
    store.expect_update_last_modified().returning(|_, _| Ok(()));

    let report = synchronise(&config(), &drive, &store).await.unwrap();
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.created(), 1);
    match &report.files[0].outcome {
        SyncOutcome::Failed { reason } => assert!(reason.contains("size limit"), "{reason}"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}
