//! HTTP implementation of [`SourceDrive`] against the Drive v3 REST API.
//!
//! Authentication is a bearer access token supplied by the caller (see
//! [`crate::load_config`]); acquiring it is outside this crate.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{DriveFile, ServiceError, SourceDrive, MARKDOWN_MIME_TYPE};

pub const DEFAULT_DRIVE_API: &str = "https://www.googleapis.com";
const SERVICE: &str = "drive";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,modifiedTime)";
const PAGE_SIZE: &str = "1000";

pub struct DriveClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl DriveClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            access_token: access_token.into(),
            base_url: DEFAULT_DRIVE_API.to_string(),
        }
    }

    /// Point the client at another API root (e.g. a local stub server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<FileResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    name: String,
    mime_type: String,
    #[serde(default)]
    modified_time: String,
}

impl From<FileResource> for DriveFile {
    fn from(f: FileResource) -> Self {
        DriveFile {
            id: f.id,
            name: f.name,
            mime_type: f.mime_type,
            modified_time: f.modified_time,
        }
    }
}

#[async_trait]
impl SourceDrive for DriveClient {
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>, ServiceError> {
        let url = format!("{}/drive/v3/files", self.base_url);
        let query = format!("'{}' in parents and trashed = false", folder_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .query(&params)
                .send()
                .await?;
            let page: FileList = check(response, None)
                .await?
                .json()
                .await
                .map_err(|e| ServiceError::Decode(format!("file list: {e}")))?;

            debug!(
                folder_id,
                page_files = page.files.len(),
                more = page.next_page_token.is_some(),
                "Listed drive folder page"
            );
            files.extend(page.files.into_iter().map(DriveFile::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(folder_id, files = files.len(), "Listed drive folder");
        Ok(files)
    }

    async fn export_markdown(&self, file: &DriveFile) -> Result<String, ServiceError> {
        let request = if file.is_google_doc() {
            self.http
                .get(format!("{}/drive/v3/files/{}/export", self.base_url, file.id))
                .query(&[("mimeType", MARKDOWN_MIME_TYPE)])
        } else {
            self.http
                .get(format!("{}/drive/v3/files/{}", self.base_url, file.id))
                .query(&[("alt", "media"), ("supportsAllDrives", "true")])
        };

        let response = request.bearer_auth(&self.access_token).send().await?;
        let text = check(response, Some(&file.id)).await?.text().await?;
        info!(file_id = %file.id, name = %file.name, bytes = text.len(), "Exported file as markdown");
        Ok(text)
    }
}

/// Maps a non-success response to a [`ServiceError`].
///
/// With `export_of` set, a refusal because the file is too large to export is reported
/// as [`ServiceError::ExportTooLarge`].
async fn check(response: Response, export_of: Option<&str>) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        error!(service = SERVICE, "Rate limited");
        return Err(ServiceError::RateLimited { service: SERVICE });
    }

    let body = response.text().await.unwrap_or_default();
    if let Some(file_id) = export_of {
        if body.contains("exportSizeLimitExceeded") {
            error!(file_id, "Export exceeds the size limit");
            return Err(ServiceError::ExportTooLarge {
                file_id: file_id.to_string(),
            });
        }
    }

    let message = error_message(&body);
    error!(service = SERVICE, status = status.as_u16(), message = %message, "API error");
    Err(ServiceError::Api {
        service: SERVICE,
        status: status.as_u16(),
        message,
    })
}

/// `error.message` from a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_message() {
        let body = r#"{"error":{"code":404,"message":"File not found: abc."}}"#;
        assert_eq!(error_message(body), "File not found: abc.");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[test]
    fn file_list_decodes_camel_case() {
        let json = r#"{
            "nextPageToken": "next",
            "files": [{"id": "1", "name": "a.md", "mimeType": "text/markdown", "modifiedTime": "2024-01-01T00:00:00.000Z"}]
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("next"));
        let file = DriveFile::from(list.files.into_iter().next().unwrap());
        assert_eq!(file.modified_time, "2024-01-01T00:00:00.000Z");
        assert!(file.is_convertible());
    }
}
