//! # contract: boundary collaborators
//!
//! Traits for the two remote services the synchroniser talks to, plus the plain data
//! they exchange:
//! - [`SourceDrive`]: lists folders and exports documents as markdown text
//! - [`DocumentStore`]: the block-oriented document database pages are written into
//!
//! Both are implemented over HTTP ([`crate::drive::DriveClient`],
//! [`crate::notion::NotionClient`]) and mocked with `mockall` in tests.
//!
//! Every method reports failure through [`ServiceError`]. Nothing here retries.

use async_trait::async_trait;
use thiserror::Error;

use crate::block::Block;

/// Drive mime type of folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
/// Drive mime type of native documents, exported as markdown.
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";
pub const MARKDOWN_MIME_TYPE: &str = "text/markdown";

/// Errors reported by boundary services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{service} rate limit exceeded")]
    RateLimited { service: &'static str },
    #[error("export of file {file_id} exceeds the size limit")]
    ExportTooLarge { file_id: String },
    #[error("{service} returned status {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// A file or folder listed from the drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Opaque timestamp, compared for equality only.
    pub modified_time: String,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn is_google_doc(&self) -> bool {
        self.mime_type == DOCUMENT_MIME_TYPE
    }

    /// Whether this file can be converted: native documents and markdown files.
    pub fn is_convertible(&self) -> bool {
        if self.is_google_doc() || self.mime_type == MARKDOWN_MIME_TYPE {
            return true;
        }
        let name = self.name.to_ascii_lowercase();
        name.ends_with(".md") || name.ends_with(".markdown")
    }

    /// Page title: the file name without a markdown extension.
    pub fn title(&self) -> &str {
        let lower = self.name.to_ascii_lowercase();
        for ext in [".markdown", ".md"] {
            if lower.ends_with(ext) {
                return &self.name[..self.name.len() - ext.len()];
            }
        }
        &self.name
    }
}

/// Source of documents to convert.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait SourceDrive: Send + Sync {
    /// List the direct, non-trashed children of a folder, across all result pages.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>, ServiceError>;

    /// Fetch a file's content as markdown text.
    async fn export_markdown(&self, file: &DriveFile) -> Result<String, ServiceError>;
}

/// An existing page in the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub page_id: String,
    /// Stored modification marker; empty when never written.
    pub last_modified: String,
}

/// Data needed to create a page for a drive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub title: String,
    pub file_id: String,
    pub last_modified: String,
}

/// The block-oriented document database.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find the page keyed by `file_id`, if any.
    async fn find_page(&self, file_id: &str) -> Result<Option<PageRecord>, ServiceError>;

    /// Create an empty page.
    async fn create_page(&self, page: NewPage) -> Result<PageRecord, ServiceError>;

    /// Ids of every top-level child block of a page, across all result pages.
    async fn list_child_blocks(&self, page_id: &str) -> Result<Vec<String>, ServiceError>;

    async fn delete_block(&self, block_id: &str) -> Result<(), ServiceError>;

    /// Append up to [`crate::batch::MAX_BLOCKS_PER_REQUEST`] blocks to a page.
    async fn append_children(
        &self,
        parent_id: &str,
        children: &[Block],
    ) -> Result<(), ServiceError>;

    async fn update_last_modified(
        &self,
        page_id: &str,
        last_modified: &str,
    ) -> Result<(), ServiceError>;
}
