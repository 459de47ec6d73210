//! Google Drive API client for reading folder trees.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use crate::auth::AccessTokenSource;
use crate::config::ProviderConfig;
use crate::error::{CatalogError, Result};
use crate::models::{ApiErrorResponse, FileListResponse, FileMetadata};

/// Fields requested for every file resource.
const FILE_FIELDS: &str = "id, name, mimeType, webViewLink";

/// Largest page the files.list endpoint accepts.
const LIST_PAGE_SIZE: &str = "1000";

/// Read-only, one-level-at-a-time view of an external folder tree.
#[async_trait]
pub trait TreeSource: Send + Sync {
    /// Metadata for a single file or folder.
    async fn get_node(&self, id: &str) -> Result<FileMetadata>;

    /// Direct children of a folder, in provider order.
    ///
    /// Implementations may stop reading once more than `limit` entries have
    /// been collected; the caller treats such a folder as too large.
    async fn get_children(&self, folder_id: &str, limit: usize) -> Result<Vec<FileMetadata>>;
}

/// Client for the Drive v3 files API.
pub struct DriveTreeClient {
    api_base: String,
    tokens: Arc<dyn AccessTokenSource>,
    http: Client,
}

impl DriveTreeClient {
    /// Create a new DriveTreeClient.
    ///
    /// # Arguments
    /// * `config` - Provider settings (API base URL and per-call timeout)
    /// * `tokens` - Source of bearer tokens for each request
    pub fn new(config: &ProviderConfig, tokens: Arc<dyn AccessTokenSource>) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            api_base: config.api_base.clone(),
            tokens,
            http,
        })
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(CatalogError::from_status(
                api_error.error.code,
                api_error.error.message,
            ));
        }
        Err(CatalogError::from_status(status.as_u16(), error_body))
    }
}

#[async_trait]
impl TreeSource for DriveTreeClient {
    async fn get_node(&self, id: &str) -> Result<FileMetadata> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, id))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true"), ("fields", FILE_FIELDS)])
            .send()
            .await?;

        let metadata: FileMetadata = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| CatalogError::ProviderUnavailable(err.to_string()))?;
        Ok(metadata)
    }

    async fn get_children(&self, folder_id: &str, limit: usize) -> Result<Vec<FileMetadata>> {
        let token = self.tokens.access_token().await?;
        let query = format!(
            "'{}' in parents and trashed = false",
            folder_id.replace('\'', "\\'")
        );
        let fields = format!("nextPageToken, files({})", FILE_FIELDS);
        let mut all_files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/files", self.api_base))
                .bearer_auth(&token)
                .query(&[
                    ("q", query.as_str()),
                    ("includeItemsFromAllDrives", "true"),
                    ("supportsAllDrives", "true"),
                    ("pageSize", LIST_PAGE_SIZE),
                    ("fields", fields.as_str()),
                ]);

            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = Self::check(request.send().await?).await?;
            let list_response: FileListResponse = response
                .json()
                .await
                .map_err(|err| CatalogError::ProviderUnavailable(err.to_string()))?;
            all_files.extend(list_response.files);
            if all_files.len() > limit {
                debug!(folder_id, fetched = all_files.len(), limit, "stopped paging");
                break;
            }

            match list_response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(all_files)
    }
}
