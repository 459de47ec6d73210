//! Error types for the drive_catalog crate.

use thiserror::Error;

/// Errors raised while mirroring drive folders into the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}. Share the folder with the service account email and retry.")]
    PermissionDenied(String),

    #[error("Drive provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Drive request timed out: {0}")]
    Timeout(String),

    #[error("Folder tree too large: {0}")]
    TreeTooLarge(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout(err.to_string())
        } else {
            CatalogError::ProviderUnavailable(err.to_string())
        }
    }
}

impl CatalogError {
    /// Map a non-success Drive API status onto the error taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => CatalogError::NotFound(message),
            401 | 403 => CatalogError::PermissionDenied(message),
            _ => CatalogError::ProviderUnavailable(format!("status {}: {}", status, message)),
        }
    }

    /// Whether a listing may swallow this error and treat the mount as empty.
    pub fn is_isolatable(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound(_)
                | CatalogError::PermissionDenied(_)
                | CatalogError::ProviderUnavailable(_)
                | CatalogError::Timeout(_)
                | CatalogError::TreeTooLarge(_)
                | CatalogError::AuthenticationError(_)
                | CatalogError::TokenRefreshError(_)
                | CatalogError::JwtError(_)
        )
    }
}

/// Result type alias for CatalogError.
pub type Result<T> = std::result::Result<T, CatalogError>;
