//! High-level pipeline: orchestrates discover → convert → emit for one drive folder.
//!
//! For each convertible file found under the configured folder, the synchroniser looks
//! up the page keyed by the file id and decides:
//! - **skip** when the stored modification marker equals the file's modified time
//! - **update** when the page exists with any other marker: replace its content
//! - **create** when no page exists: create it, append content, write the marker
//!
//! The marker is always the last write for a page, so an interrupted run leaves the
//! page stale and the next run redoes it.
//!
//! # Error Handling
//! Failing to list a folder aborts the run with [`SyncError`]. A failure on a single
//! file is logged, recorded in the report as [`SyncOutcome::Failed`], and the run moves
//! on to the next file.

use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use crate::batch::{self, BatchError};
use crate::contract::{DocumentStore, DriveFile, NewPage, ServiceError, SourceDrive};
use crate::convert::markdown_to_blocks;

/// What to synchronise.
#[derive(Debug, Clone)]
pub struct SynchroniseConfig {
    pub folder_id: String,
    pub recursive: bool,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("listing folder {folder_id} failed: {source}")]
    Discovery {
        folder_id: String,
        #[source]
        source: ServiceError,
    },
}

/// Per-file failure, kept in the report.
#[derive(Debug, Error)]
enum FileError {
    #[error("lookup failed: {0}")]
    Lookup(#[source] ServiceError),
    #[error("export failed: {0}")]
    Export(#[source] ServiceError),
    #[error("page creation failed: {0}")]
    Create(#[source] ServiceError),
    #[error(transparent)]
    Emit(#[from] BatchError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created { page_id: String, blocks: usize },
    Updated { page_id: String, blocks: usize },
    Skipped { page_id: String },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_id: String,
    pub name: String,
    pub outcome: SyncOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct SynchroniseReport {
    pub files: Vec<FileReport>,
}

impl SynchroniseReport {
    pub fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Created { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed { .. }))
    }
}

pub async fn synchronise<D, S>(
    config: &SynchroniseConfig,
    drive: &D,
    store: &S,
) -> Result<SynchroniseReport, SyncError>
where
    D: SourceDrive + ?Sized,
    S: DocumentStore + ?Sized,
{
    info!(folder_id = %config.folder_id, recursive = config.recursive, "[SYNC] Starting synchronisation");

    let files = discover(drive, &config.folder_id, config.recursive).await?;
    info!(files = files.len(), "[SYNC] Discovered convertible files");

    let mut report = SynchroniseReport::default();
    for file in files {
        let span = info_span!("file", file_id = %file.id, name = %file.name);
        let outcome = match sync_file(&file, drive, store).instrument(span).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(file_id = %file.id, name = %file.name, error = %e, "[SYNC][ERROR] File failed");
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        report.files.push(FileReport {
            file_id: file.id,
            name: file.name,
            outcome,
        });
    }

    info!(
        created = report.created(),
        updated = report.updated(),
        skipped = report.skipped(),
        failed = report.failed(),
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}

/// Lists convertible files under `root_folder`, depth-first in listing order.
pub async fn discover<D>(
    drive: &D,
    root_folder: &str,
    recursive: bool,
) -> Result<Vec<DriveFile>, SyncError>
where
    D: SourceDrive + ?Sized,
{
    let mut found = Vec::new();
    // Each entry is a folder's remaining listing, reversed so `pop` yields listing order.
    let mut pending: Vec<Vec<DriveFile>> = vec![list(drive, root_folder).await?];

    while let Some(listing) = pending.last_mut() {
        let Some(entry) = listing.pop() else {
            pending.pop();
            continue;
        };
        if entry.is_folder() {
            if recursive {
                let children = list(drive, &entry.id).await?;
                pending.push(children);
            }
        } else if entry.is_convertible() {
            found.push(entry);
        } else {
            info!(file_id = %entry.id, name = %entry.name, mime_type = %entry.mime_type, "Skipping non-markdown file");
        }
    }
    Ok(found)
}

async fn list<D>(drive: &D, folder_id: &str) -> Result<Vec<DriveFile>, SyncError>
where
    D: SourceDrive + ?Sized,
{
    let mut entries = drive.list_folder(folder_id).await.map_err(|source| {
        error!(folder_id, error = %source, "[SYNC][ERROR] Listing folder failed");
        SyncError::Discovery {
            folder_id: folder_id.to_string(),
            source,
        }
    })?;
    entries.reverse();
    Ok(entries)
}

async fn sync_file<D, S>(file: &DriveFile, drive: &D, store: &S) -> Result<SyncOutcome, FileError>
where
    D: SourceDrive + ?Sized,
    S: DocumentStore + ?Sized,
{
    let existing = store.find_page(&file.id).await.map_err(FileError::Lookup)?;

    if let Some(page) = &existing {
        if page.last_modified == file.modified_time {
            info!(page_id = %page.page_id, "[SYNC] Unchanged, skipping");
            return Ok(SyncOutcome::Skipped {
                page_id: page.page_id.clone(),
            });
        }
    }

    let markdown = drive.export_markdown(file).await.map_err(|e| {
        if matches!(e, ServiceError::ExportTooLarge { .. }) {
            warn!(file_id = %file.id, "[SYNC] Export too large, skipping file");
        }
        FileError::Export(e)
    })?;
    let blocks = markdown_to_blocks(&markdown);

    match existing {
        Some(page) => {
            info!(page_id = %page.page_id, blocks = blocks.len(), "[SYNC] Replacing page content");
            batch::replace_page_content(store, &page.page_id, &blocks, &file.modified_time)
                .await?;
            Ok(SyncOutcome::Updated {
                page_id: page.page_id,
                blocks: blocks.len(),
            })
        }
        None => {
            let page = store
                .create_page(NewPage {
                    title: file.title().to_string(),
                    file_id: file.id.clone(),
                    last_modified: String::new(),
                })
                .await
                .map_err(FileError::Create)?;
            info!(page_id = %page.page_id, blocks = blocks.len(), "[SYNC] Created page, appending content");
            batch::append_in_batches(store, &page.page_id, &blocks).await?;
            batch::write_marker(store, &page.page_id, &file.modified_time).await?;
            Ok(SyncOutcome::Created {
                page_id: page.page_id,
                blocks: blocks.len(),
            })
        }
    }
}
