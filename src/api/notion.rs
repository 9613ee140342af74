// Notion REST API client
// Only the two database endpoints the tournament lookup needs

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

const RETRIEVE_TIMEOUT: Duration = Duration::from_secs(30);
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("Notion request timed out")]
    Timeout,
    #[error("Notion API error ({status}): {body}")]
    Status { status: StatusCode, body: String },
    #[error("Notion request failed: {0}")]
    Request(reqwest::Error),
    #[error("Unexpected Notion response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for NotionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotionError::Timeout
        } else {
            NotionError::Request(e)
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Notion client bound to one integration token
pub struct NotionClient {
    client: Client,
    token: String,
}

impl NotionClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(request: RequestBuilder) -> Result<String, NotionError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NotionError::Status {
                status,
                body: body.chars().take(500).collect(),
            });
        }
        Ok(body)
    }

    /// Database schema (`GET /databases/{id}`)
    pub async fn retrieve_database(&self, database_id: &str) -> Result<Value, NotionError> {
        let request = self
            .authorized(
                self.client
                    .get(format!("{}/databases/{}", NOTION_API_BASE, database_id)),
            )
            .timeout(RETRIEVE_TIMEOUT);

        let body = Self::send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// All pages matching `payload`, following pagination
    pub async fn query_database(
        &self,
        database_id: &str,
        payload: &Value,
    ) -> Result<Vec<Value>, NotionError> {
        let url = format!("{}/databases/{}/query", NOTION_API_BASE, database_id);
        let mut results = Vec::new();
        let mut start_cursor: Option<String> = None;

        loop {
            let body = with_cursor(payload, start_cursor.as_deref());
            let request = self
                .authorized(self.client.post(&url))
                .json(&body)
                .timeout(QUERY_TIMEOUT);

            let page: QueryResponse = serde_json::from_str(&Self::send(request).await?)?;
            debug!("Notion: got {} result(s), has_more={}", page.results.len(), page.has_more);
            results.extend(page.results);

            match page.next_cursor {
                Some(cursor) if page.has_more => start_cursor = Some(cursor),
                _ => break,
            }
        }

        Ok(results)
    }
}

/// Copy of the query body with `start_cursor` set when paginating
fn with_cursor(payload: &Value, cursor: Option<&str>) -> Value {
    let mut body = payload.clone();
    if let (Some(cursor), Some(obj)) = (cursor, body.as_object_mut()) {
        obj.insert("start_cursor".to_string(), Value::String(cursor.to_string()));
    }
    body
}
