use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of records the catalog serves per page. Shared by navigation and
/// quota fulfillment; `pagination.limit` in the API response equals this.
pub const PAGE_SIZE: usize = 12;

pub const DEFAULT_API_URL: &str = "https://api.artic.edu/api/v1/artworks";

// One catalog entry. Identity is the id alone; the descriptive fields are
// display-only and may all be absent.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Artwork {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub place_of_origin: Option<String>,
    #[serde(default)]
    pub artist_display: Option<String>,
    #[serde(default)]
    pub inscriptions: Option<String>,
    #[serde(default)]
    pub date_start: Option<i32>,
    #[serde(default)]
    pub date_end: Option<i32>,
}

impl PartialEq for Artwork {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Artwork {}

/// One fetched batch of records plus the dataset total at fetch time.
#[derive(Clone, Debug)]
pub struct Page {
    pub number: u32,
    pub records: Vec<Artwork>,
    pub total: u64,
}

impl Page {
    /// A page shorter than `PAGE_SIZE` signals the final page.
    pub fn is_short(&self) -> bool {
        self.records.len() < PAGE_SIZE
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog response for page {page}: {reason}")]
    MalformedResponse { page: u32, reason: String },

    #[error("catalog request for page {page} failed: {source}")]
    Request {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build catalog client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Seam between the paging consumers and the network. Implemented by
/// `CatalogClient` for the real endpoint and by scripted fakes in tests.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<Page, CatalogError>;
}

#[derive(Clone, Debug)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self, CatalogError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("artcart/0.3"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CatalogError::ClientBuild { source: e })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

}

#[async_trait]
impl PageSource for CatalogClient {
    async fn fetch_page(&self, page: u32) -> Result<Page, CatalogError> {
        let url = format!("{}?page={}", self.base_url, page);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| CatalogError::Request { page, source: e })?;
        let body = resp
            .text()
            .await
            .map_err(|e| CatalogError::Request { page, source: e })?;
        parse_page_body(page, &body)
    }
}

fn malformed(page: u32, reason: impl Into<String>) -> CatalogError {
    CatalogError::MalformedResponse {
        page,
        reason: reason.into(),
    }
}

/// Decode one response body. Kept separate from the transport so the
/// malformed-payload cases are testable without a server.
pub fn parse_page_body(page: u32, body: &str) -> Result<Page, CatalogError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| malformed(page, format!("not JSON: {e}")))?;

    let data = match value.get("data") {
        Some(data) => data,
        None => return Err(malformed(page, "missing data field")),
    };
    if !data.is_array() {
        return Err(malformed(page, "data field is not an array"));
    }
    let records: Vec<Artwork> = serde_json::from_value(data.clone())
        .map_err(|e| malformed(page, format!("undecodable record: {e}")))?;

    let total = match value
        .pointer("/pagination/total")
        .and_then(serde_json::Value::as_u64)
    {
        Some(total) => total,
        None => return Err(malformed(page, "missing pagination.total")),
    };

    Ok(Page {
        number: page,
        records,
        total,
    })
}
