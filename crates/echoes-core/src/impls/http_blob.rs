//! HttpBlobStore - REST object storage (Vercel Blob compatible API)
//!
//! # Endpoints
//! - `PUT  {base}/{key}`: upload, public access, exact pathname
//! - `GET  {base}?limit=..&cursor=..`: paginated listing
//! - `POST {base}/delete` with `{"urls": [...]}`: delete by URL
//!
//! Every request carries `Authorization: Bearer {token}`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::BlobRef;
use crate::ports::{BlobError, BlobStore};

pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
const API_VERSION: &str = "7";
const LIST_PAGE_SIZE: &str = "1000";
const USER_AGENT: &str = concat!("echoes/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
    pathname: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    blobs: Vec<ListedBlob>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ListedBlob {
    url: String,
    pathname: String,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    urls: [&'a str; 1],
}

pub struct HttpBlobStore {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpBlobStore {
    pub fn new(token: impl Into<String>) -> Result<Self, BlobError> {
        Self::with_base_url(DEFAULT_BLOB_API_URL, token)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, BlobError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(BlobError::MissingToken);
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| BlobError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
    }
}

/// Turn a non-2xx response into `BlobError::Status`.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, BlobError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BlobError::Status {
        status: status.as_u16(),
        body,
    })
}

fn transport(err: reqwest::Error) -> BlobError {
    BlobError::Transport(err.to_string())
}

fn decode(err: reqwest::Error) -> BlobError {
    BlobError::Decode(err.to_string())
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<BlobRef, BlobError> {
        let request = self
            .authorized(self.http.put(format!("{}/{key}", self.base_url)))
            .header("x-access", "public")
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .header("x-allow-overwrite", "1")
            .body(bytes);
        let response = check(request.send().await.map_err(transport)?).await?;
        let put: PutResponse = response.json().await.map_err(decode)?;
        tracing::debug!(key = %put.pathname, url = %put.url, "blob stored");
        Ok(BlobRef {
            key: put.pathname,
            url: put.url,
        })
    }

    async fn list(&self) -> Result<Vec<BlobRef>, BlobError> {
        let mut blobs = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut request = self
                .authorized(self.http.get(&self.base_url))
                .query(&[("limit", LIST_PAGE_SIZE)]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor.as_str())]);
            }
            let response = check(request.send().await.map_err(transport)?).await?;
            let page: ListResponse = response.json().await.map_err(decode)?;
            blobs.extend(page.blobs.into_iter().map(|b| BlobRef {
                key: b.pathname,
                url: b.url,
            }));
            match page.cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(blobs)
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let request = self
            .authorized(self.http.post(format!("{}/delete", self.base_url)))
            .json(&DeleteRequest { urls: [url] });
        let response = request.send().await.map_err(transport)?;
        // Already gone counts as deleted.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }
}
