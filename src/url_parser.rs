//! URL parser for extracting Google Drive folder IDs from sharing links.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CatalogError, Result};

static FOLDER_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?drive\.google\.com/drive/(?:u/\d+/)?folders/([a-zA-Z0-9_-]+)",
    )
        .expect("Invalid folder URL regex")
});

static OPEN_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?drive\.google\.com/open\?id=([a-zA-Z0-9_-]+)")
        .expect("Invalid open URL regex")
});

/// Valid Google Drive ID pattern (alphanumeric, underscore, hyphen).
static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Whether `id` has the shape of a Drive id.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && ID_REGEX.is_match(id)
}

/// Extract a Google Drive folder ID from a sharing link or validate a raw ID.
///
/// Supports the following formats:
/// - `https://drive.google.com/drive/folders/<ID>`
/// - `https://drive.google.com/drive/u/0/folders/<ID>`
/// - `https://drive.google.com/open?id=<ID>`
/// - Raw ID string
///
/// The scheme may be left off and the host may carry a `www.` prefix.
///
/// # Examples
///
/// ```
/// use drive_catalog::url_parser::extract_folder_id;
///
/// let id = extract_folder_id("https://drive.google.com/drive/folders/1abc123?usp=sharing").unwrap();
/// assert_eq!(id, "1abc123");
///
/// let id = extract_folder_id("1abc123").unwrap();
/// assert_eq!(id, "1abc123");
/// ```
pub fn extract_folder_id(url_or_id: &str) -> Result<String> {
    let trimmed = url_or_id.trim();

    for pattern in [&*FOLDER_URL_REGEX, &*OPEN_URL_REGEX] {
        if let Some(id) = pattern.captures(trimmed).and_then(|c| c.get(1)) {
            return Ok(id.as_str().to_string());
        }
    }

    if is_valid_id(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(CatalogError::InvalidInput(format!(
        "not a Google Drive folder link: {}",
        url_or_id
    )))
}
