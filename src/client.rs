//! Remote document client.
//!
//! Three primitive calls against the upstream API, each a single HTTP request
//! carrying the bearer credential, a JSON content type, and the
//! `Notion-Version` protocol header:
//!
//! | Call | Request |
//! |------|---------|
//! | [`DocumentApi::search`] | `POST {base}/search` |
//! | [`DocumentApi::list_children`] | `GET {base}/blocks/{id}/children` |
//! | [`DocumentApi::get_block`] | `GET {base}/blocks/{id}` |
//!
//! There is no retry, backoff, or pagination: a continuation cursor in a list
//! envelope is logged and otherwise ignored.
//!
//! Block ids are checked before any request is made (ASCII letters, digits and
//! `-` only) and are always appended as a single escaped path segment, so an id
//! can never address anything outside `{base}/blocks/`.
//!
//! The [`DocumentApi`] trait is the seam the rest of the crate depends on, so
//! the aggregator and the HTTP layer can run against an in-memory
//! implementation in tests.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::{CatalogConfig, NotionConfig};
use crate::error::{Error, Result};
use crate::models::{Block, BlockList, Document, SearchResponse};

const NOTION_VERSION_HEADER: &str = "Notion-Version";

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub filter: SearchFilter,
    pub sort: SearchSort,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchFilter {
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSort {
    pub direction: String,
    pub timestamp: String,
}

impl SearchRequest {
    /// Every page, oldest edit first.
    pub fn pages() -> Self {
        Self {
            query: None,
            filter: SearchFilter {
                property: "object".to_string(),
                value: "page".to_string(),
            },
            sort: SearchSort {
                direction: "ascending".to_string(),
                timestamp: "last_edited_time".to_string(),
            },
        }
    }

    /// The canonical test-case search, plus the optional configured query.
    pub fn for_catalog(catalog: &CatalogConfig) -> Self {
        Self {
            query: catalog.query.clone().filter(|q| !q.trim().is_empty()),
            ..Self::pages()
        }
    }
}

/// Read access to the upstream document API.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Run a search and return the first page of documents, in upstream order.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>>;

    /// List the direct children of a block or page, in upstream order.
    async fn list_children(&self, block_id: &str) -> Result<Vec<Block>>;

    /// Fetch a single block.
    async fn get_block(&self, block_id: &str) -> Result<Block>;
}

/// [`DocumentApi`] backed by the Notion REST API.
///
/// Holds only immutable configuration and a pooled `reqwest` client, so one
/// instance is shared by every inbound request.
pub struct NotionClient {
    http: Client,
    base_url: Url,
    api_key: String,
    version: String,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("notion-testcases/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = Url::parse(config.api_url.trim())
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(config.api_url.clone()));
        }

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            version: config.version.clone(),
        })
    }

    /// Append `segments` to the base path, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(NOTION_VERSION_HEADER, &self.version)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        decode(response).await
    }
}

/// Reject anything that is not a plain block id before it reaches a URL.
fn check_block_id(block_id: &str) -> Result<()> {
    let valid = !block_id.is_empty()
        && block_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidId(block_id.to_string()))
    }
}

/// Turn a response into `T`, mapping non-2xx statuses to [`Error::Remote`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Remote {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl DocumentApi for NotionClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Document>> {
        debug!(query = ?request.query, "searching documents");
        let resp: SearchResponse = self
            .send(self.request(Method::POST, self.endpoint(&["search"])?).json(request))
            .await?;

        if resp.has_more {
            debug!(
                returned = resp.results.len(),
                "search truncated upstream; continuation cursor not followed"
            );
        }
        Ok(resp.results)
    }

    async fn list_children(&self, block_id: &str) -> Result<Vec<Block>> {
        check_block_id(block_id)?;
        let url = self.endpoint(&["blocks", block_id, "children"])?;
        let resp: BlockList = self.send(self.request(Method::GET, url)).await?;

        if resp.has_more {
            debug!(
                block_id,
                returned = resp.results.len(),
                "children truncated upstream; continuation cursor not followed"
            );
        }
        Ok(resp.results)
    }

    async fn get_block(&self, block_id: &str) -> Result<Block> {
        check_block_id(block_id)?;
        let url = self.endpoint(&["blocks", block_id])?;
        self.send(self.request(Method::GET, url)).await
    }
}
