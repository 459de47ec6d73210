//! Media classification of drive files and resource links.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a resource is presented to students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Document,
    Audio,
    Video,
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaKind::Document => "document",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        };
        f.write_str(label)
    }
}

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/rtf",
    "application/epub+zip",
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.presentation",
    "application/vnd.google-apps.spreadsheet",
];

const DOCUMENT_MIME_PREFIXES: &[&str] = &[
    "text/",
    "application/vnd.openxmlformats-officedocument.",
    "application/vnd.ms-",
    "application/vnd.oasis.opendocument.",
];

/// Classify a mime type. Folders and unknown types are `Other`.
pub fn classify_mime(mime_type: &str) -> MediaKind {
    let mime = mime_type.trim().to_ascii_lowercase();
    let essence = mime.split(';').next().unwrap_or_default().trim();

    if essence.starts_with("audio/") {
        MediaKind::Audio
    } else if essence.starts_with("video/") {
        MediaKind::Video
    } else if DOCUMENT_MIME_TYPES.contains(&essence)
        || DOCUMENT_MIME_PREFIXES
            .iter()
            .any(|prefix| essence.starts_with(prefix))
    {
        MediaKind::Document
    } else {
        MediaKind::Other
    }
}

/// Classify a link by host (YouTube) or by the extension of its path.
pub fn classify_link(link: &str) -> MediaKind {
    let lower = link.trim().to_ascii_lowercase();
    if lower.contains("youtube.com/") || lower.contains("youtu.be/") {
        return MediaKind::Video;
    }

    let path = lower
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    match mime_guess::from_path(path).first() {
        Some(mime) => classify_mime(mime.essence_str()),
        None => MediaKind::Other,
    }
}
