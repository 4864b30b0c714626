//! HTTP implementation of [`DocumentStore`] against the Notion REST API.
//!
//! Pages live in one database. Each page records the drive file it came from in a
//! rich-text property (the lookup key) and the file's modification time in another.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::block::Block;
use crate::config::PropertyNames;
use crate::contract::{DocumentStore, NewPage, PageRecord, ServiceError};

pub const DEFAULT_NOTION_API: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";
const SERVICE: &str = "notion";
const LIST_PAGE_SIZE: u32 = 100;

pub struct NotionClient {
    http: Client,
    token: String,
    database_id: String,
    properties: PropertyNames,
    base_url: String,
}

impl NotionClient {
    pub fn new(
        token: impl Into<String>,
        database_id: impl Into<String>,
        properties: PropertyNames,
    ) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            database_id: database_id.into(),
            properties,
            base_url: DEFAULT_NOTION_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/v1/{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    fn page_record(&self, page: &Value) -> Result<PageRecord, ServiceError> {
        let page_id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::Decode("page without id".to_string()))?;
        let last_modified = page
            .get("properties")
            .and_then(|p| p.get(&self.properties.last_modified))
            .map(rich_text_plain)
            .unwrap_or_default();
        Ok(PageRecord {
            page_id: page_id.to_string(),
            last_modified,
        })
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChildrenResponse {
    #[serde(default)]
    results: Vec<BlockRef>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BlockRef {
    id: String,
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn find_page(&self, file_id: &str) -> Result<Option<PageRecord>, ServiceError> {
        let body = json!({
            "filter": {
                "property": self.properties.file_id,
                "rich_text": { "equals": file_id },
            },
            "page_size": 1,
        });
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("databases/{}/query", self.database_id),
            )
            .json(&body)
            .send()
            .await?;
        let found: QueryResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Decode(format!("database query: {e}")))?;

        let record = found
            .results
            .first()
            .map(|page| self.page_record(page))
            .transpose()?;
        debug!(file_id, found = record.is_some(), "Queried page by file id");
        Ok(record)
    }

    async fn create_page(&self, page: NewPage) -> Result<PageRecord, ServiceError> {
        let props = &self.properties;
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": {
                props.title.as_str(): { "title": text_property(&page.title) },
                props.file_id.as_str(): { "rich_text": text_property(&page.file_id) },
                props.last_modified.as_str(): { "rich_text": text_property(&page.last_modified) },
            },
        });
        let response = self
            .request(reqwest::Method::POST, "pages")
            .json(&body)
            .send()
            .await?;
        let created: Value = check(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::Decode(format!("created page: {e}")))?;
        let record = self.page_record(&created)?;
        info!(page_id = %record.page_id, title = %page.title, "Created page");
        Ok(record)
    }

    async fn list_child_blocks(&self, page_id: &str) -> Result<Vec<String>, ServiceError> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut request = self
                .request(reqwest::Method::GET, &format!("blocks/{page_id}/children"))
                .query(&[("page_size", LIST_PAGE_SIZE)]);
            if let Some(c) = cursor.as_deref() {
                request = request.query(&[("start_cursor", c)]);
            }
            let page: ChildrenResponse = check(request.send().await?)
                .await?
                .json()
                .await
                .map_err(|e| ServiceError::Decode(format!("block children: {e}")))?;
            ids.extend(page.results.into_iter().map(|b| b.id));
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        debug!(page_id, children = ids.len(), "Listed child blocks");
        Ok(ids)
    }

    async fn delete_block(&self, block_id: &str) -> Result<(), ServiceError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("blocks/{block_id}"))
            .send()
            .await?;
        check(response).await?;
        debug!(block_id, "Deleted block");
        Ok(())
    }

    async fn append_children(
        &self,
        parent_id: &str,
        children: &[Block],
    ) -> Result<(), ServiceError> {
        let response = self
            .request(reqwest::Method::PATCH, &format!("blocks/{parent_id}/children"))
            .json(&json!({ "children": children }))
            .send()
            .await?;
        check(response).await?;
        debug!(parent_id, blocks = children.len(), "Appended children");
        Ok(())
    }

    async fn update_last_modified(
        &self,
        page_id: &str,
        last_modified: &str,
    ) -> Result<(), ServiceError> {
        let body = json!({
            "properties": {
                self.properties.last_modified.as_str(): { "rich_text": text_property(last_modified) },
            },
        });
        let response = self
            .request(reqwest::Method::PATCH, &format!("pages/{page_id}"))
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        info!(page_id, last_modified, "Updated modification marker");
        Ok(())
    }
}

/// Rich-text property value holding `content`; empty content gives an empty array.
fn text_property(content: &str) -> Value {
    if content.is_empty() {
        json!([])
    } else {
        json!([{ "type": "text", "text": { "content": content } }])
    }
}

/// Concatenated `plain_text` of a title or rich-text property value.
fn rich_text_plain(property: &Value) -> String {
    ["rich_text", "title"]
        .iter()
        .find_map(|key| property.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("plain_text")
                        .or_else(|| item.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default()
}

async fn check(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        error!(service = SERVICE, "Rate limited");
        return Err(ServiceError::RateLimited { service: SERVICE });
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    error!(service = SERVICE, status = status.as_u16(), message = %message, "API error");
    Err(ServiceError::Api {
        service: SERVICE,
        status: status.as_u16(),
        message,
    })
}
