use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::config::ResolvedVercel;
use super::error::StorageError;
use super::traits::{BlobBackend, TextBlobBackend};

const API_VERSION: &str = "7";
const BACKEND: &str = "vercel";

/// Vercel Blob backend with public-read access.
///
/// Values are written as text. A blob's public URL is discovered by listing
/// the store with the key as prefix and matching the exact pathname.
pub struct VercelBlobBackend {
    client: Client,
    token: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    blobs: Vec<ListedBlob>,
}

#[derive(Debug, Deserialize)]
struct ListedBlob {
    url: String,
    pathname: String,
}

impl VercelBlobBackend {
    pub fn new(config: &ResolvedVercel) -> Result<Self, StorageError> {
        let client = Client::builder()
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            token: config.token.clone(),
            api_url: config.api_url.clone(),
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
    }

    /// Public URL of the blob stored at exactly `key`, if any.
    async fn find_url(&self, key: &str) -> Result<Option<String>, StorageError> {
        let response = self
            .authorized(self.client.get(&self.api_url))
            .query(&[("prefix", key), ("limit", "1000")])
            .send()
            .await
            .map_err(|e| StorageError::backend(BACKEND, e))?;

        let response = check_status(response, "list").await?;
        let listing: ListResponse = response
            .json()
            .await
            .map_err(|e| StorageError::backend(BACKEND, e))?;

        Ok(listing
            .blobs
            .into_iter()
            .find(|blob| blob.pathname == key)
            .map(|blob| blob.url))
    }
}

async fn check_status(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, StorageError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::backend(
        BACKEND,
        format!("{operation} failed with HTTP {status}: {body}"),
    ))
}

#[async_trait]
impl BlobBackend for VercelBlobBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let Some(url) = self.find_url(key).await? else {
            debug!(key, "Blob already absent");
            return Ok(());
        };

        let response = self
            .authorized(self.client.post(format!("{}/delete", self.api_url)))
            .json(&serde_json::json!({ "urls": [url] }))
            .send()
            .await
            .map_err(|e| StorageError::backend(BACKEND, e))?;
        check_status(response, "delete").await?;
        Ok(())
    }
}

#[async_trait]
impl TextBlobBackend for VercelBlobBackend {
    async fn put_text(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let response = self
            .authorized(self.client.put(format!("{}/", self.api_url)))
            .query(&[("pathname", key)])
            .header("x-add-random-suffix", "0")
            .header("x-allow-overwrite", "1")
            .header("x-content-type", "text/plain")
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| StorageError::backend(BACKEND, e))?;
        check_status(response, "put").await?;
        Ok(())
    }

    async fn get_text(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(url) = self.find_url(key).await? else {
            return Ok(None);
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::backend(BACKEND, e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, "get").await?;
        let text = response
            .text()
            .await
            .map_err(|e| StorageError::backend(BACKEND, e))?;
        Ok(Some(text))
    }
}
