//! Runtime configuration for the drive client and the catalog.
//!
//! Both objects are built once at start-up and passed down explicitly; nothing
//! below this module reads the process environment.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{CatalogError, Result};
use crate::models::ServiceAccountCredentials;

/// Google OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Base URL for Google Drive API v3.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const EMAIL_VARS: [&str; 2] = ["GOOGLE_CLIENT_EMAIL", "GOOGLE_SERVICE_ACCOUNT_EMAIL"];
const KEY_VARS: [&str; 2] = ["GOOGLE_PRIVATE_KEY", "GOOGLE_SERVICE_ACCOUNT_PRIVATE_KEY"];

/// Connection settings for the external drive provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
    pub api_base: String,
    /// Upper bound for any single provider HTTP call.
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn new(client_email: String, private_key: String) -> Self {
        Self {
            client_email,
            private_key: unescape_key(&private_key),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }

    /// Build from a service account JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let credentials: ServiceAccountCredentials = serde_json::from_str(&content)?;
        let mut config = Self::new(credentials.client_email, credentials.private_key);
        if let Some(token_uri) = credentials.token_uri {
            config.token_uri = token_uri;
        }
        Ok(config)
    }

    /// Build from the service account environment variables.
    pub fn from_env() -> Result<Self> {
        let email = first_env(&EMAIL_VARS)
            .ok_or_else(|| CatalogError::MissingEnvVar(EMAIL_VARS.join(" or ")))?;
        let key = first_env(&KEY_VARS)
            .ok_or_else(|| CatalogError::MissingEnvVar(KEY_VARS.join(" or ")))?;
        Ok(Self::new(email, key))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Guard rails for tree expansion and listing.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub max_depth: usize,
    pub max_children: usize,
    pub max_nodes: usize,
    /// Upper bound for expanding one mount during a listing.
    pub mount_timeout: Duration,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_children: 1000,
            max_nodes: 5000,
            mount_timeout: Duration::from_secs(30),
            default_page_size: 12,
            max_page_size: 100,
        }
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Keys pasted into env files often carry literal `\n` sequences.
fn unescape_key(key: &str) -> String {
    key.replace("\\n", "\n")
}
