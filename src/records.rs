//! Persisted catalog records and the response items built from them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{classify_link, classify_mime, MediaKind};
use crate::error::CatalogError;
use crate::reconcile::parse_synthetic_id;

/// Class visibility tag: `1` through `10`, or `GENERAL`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassTag(String);

impl ClassTag {
    pub const GENERAL: &'static str = "GENERAL";

    pub fn general() -> Self {
        ClassTag(Self::GENERAL.to_string())
    }

    pub fn is_general(&self) -> bool {
        self.0 == Self::GENERAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ClassTag {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(Self::GENERAL) {
            return Ok(Self::general());
        }
        match trimmed.parse::<u8>() {
            Ok(n @ 1..=10) => Ok(ClassTag(n.to_string())),
            _ => Err(CatalogError::InvalidInput(format!("invalid class: {}", s))),
        }
    }
}

impl TryFrom<String> for ClassTag {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClassTag> for String {
    fn from(tag: ClassTag) -> Self {
        tag.0
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource type as stored and returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "AUDIO")]
    Audio,
    #[serde(rename = "VIDEO")]
    Video,
    #[serde(rename = "E-Book")]
    EBook,
    #[serde(rename = "Audiobook")]
    Audiobook,
    #[serde(rename = "E-Library")]
    ELibrary,
    #[serde(rename = "GDRIVE_FOLDER")]
    DriveFolder,
    #[serde(rename = "Other Resources")]
    Other,
    /// Response-only type of an unmodified drive file.
    #[serde(rename = "EXTERNAL_FILE")]
    ExternalFile,
}

impl ResourceType {
    const ALL: [ResourceType; 9] = [
        ResourceType::Pdf,
        ResourceType::Audio,
        ResourceType::Video,
        ResourceType::EBook,
        ResourceType::Audiobook,
        ResourceType::ELibrary,
        ResourceType::DriveFolder,
        ResourceType::Other,
        ResourceType::ExternalFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Pdf => "PDF",
            ResourceType::Audio => "AUDIO",
            ResourceType::Video => "VIDEO",
            ResourceType::EBook => "E-Book",
            ResourceType::Audiobook => "Audiobook",
            ResourceType::ELibrary => "E-Library",
            ResourceType::DriveFolder => "GDRIVE_FOLDER",
            ResourceType::Other => "Other Resources",
            ResourceType::ExternalFile => "EXTERNAL_FILE",
        }
    }

    /// Media kind implied by the type alone, if any.
    pub fn media_hint(&self) -> Option<MediaKind> {
        match self {
            ResourceType::Pdf | ResourceType::EBook => Some(MediaKind::Document),
            ResourceType::Audio | ResourceType::Audiobook => Some(MediaKind::Audio),
            ResourceType::Video => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl FromStr for ResourceType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CatalogError::InvalidInput(format!("invalid resource type: {}", s)))
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A natively stored resource. Records of type `GDRIVE_FOLDER` are mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub link: String,
    pub class: ClassTag,
    pub category: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_folder_id: Option<String>,
    /// Local catalog folder the record is filed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// External root id when this record mounts a drive folder.
    pub fn mount_root(&self) -> Option<&str> {
        match self.resource_type {
            ResourceType::DriveFolder => self.drive_folder_id.as_deref(),
            _ => None,
        }
    }

    pub fn media(&self) -> MediaKind {
        self.resource_type
            .media_hint()
            .unwrap_or_else(|| classify_link(&self.link))
    }
}

/// A local catalog folder. `path` lists the ancestor ids from the top level down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub class: ClassTag,
    #[serde(default)]
    pub parent_folder: Option<String>,
    #[serde(default)]
    pub path: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Admin request to add a local folder, optionally below another one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
    pub class: ClassTag,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Replacement fields carried by an override. All are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideFields {
    pub title: String,
    pub link: String,
    pub class: ClassTag,
    pub category: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

impl OverrideFields {
    pub fn validated(mut self) -> Result<Self, CatalogError> {
        self.title = required("title", &self.title)?;
        self.link = required("link", &self.link)?;
        self.category = required("category", &self.category)?;
        if self.resource_type == ResourceType::DriveFolder {
            return Err(CatalogError::InvalidInput(
                "a drive file cannot be overridden as a folder mount".to_string(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShadowAction {
    Override(OverrideFields),
    Hide,
}

/// A local override or hide directive layered over one drive file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowRecord {
    pub id: String,
    pub external_item_id: String,
    pub action: ShadowAction,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ShadowRecord {
    pub fn is_hidden(&self) -> bool {
        matches!(self.action, ShadowAction::Hide)
    }
}

/// A drive file as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalItem {
    pub id: String,
    pub external_id: String,
    pub mount_id: String,
    pub title: String,
    pub link: String,
    pub class: ClassTag,
    pub category: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub mime_type: String,
    pub media: MediaKind,
    pub overridden: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ExternalItem {
    pub(crate) fn media_for(mime_type: &str, resource_type: ResourceType, link: &str) -> MediaKind {
        resource_type.media_hint().unwrap_or_else(|| match classify_mime(mime_type) {
            MediaKind::Other => classify_link(link),
            kind => kind,
        })
    }
}

/// One entry of a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisibleResourceItem {
    External(ExternalItem),
    Native(ResourceRecord),
}

impl VisibleResourceItem {
    pub fn id(&self) -> &str {
        match self {
            VisibleResourceItem::External(item) => &item.id,
            VisibleResourceItem::Native(record) => &record.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            VisibleResourceItem::External(item) => &item.title,
            VisibleResourceItem::Native(record) => &record.title,
        }
    }
}

/// Admin request to mirror a drive folder into the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMountRequest {
    pub title: String,
    pub folder_link: String,
    pub class: ClassTag,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Local folder to file the mount under.
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// Admin directive against a synthetic external id.
#[derive(Debug, Clone, PartialEq)]
pub enum ShadowRequest {
    Override {
        external_id: String,
        fields: OverrideFields,
    },
    Hide {
        external_id: String,
    },
}

impl ShadowRequest {
    /// Override addressed by a synthetic listing id such as `ext-<id>`.
    pub fn override_item(synthetic_id: &str, fields: OverrideFields) -> Result<Self, CatalogError> {
        Ok(ShadowRequest::Override {
            external_id: parse_synthetic_id(synthetic_id)?.to_string(),
            fields: fields.validated()?,
        })
    }

    /// Hide addressed by a synthetic listing id such as `ext-<id>`.
    pub fn hide_item(synthetic_id: &str) -> Result<Self, CatalogError> {
        Ok(ShadowRequest::Hide {
            external_id: parse_synthetic_id(synthetic_id)?.to_string(),
        })
    }

    pub fn external_id(&self) -> &str {
        match self {
            ShadowRequest::Override { external_id, .. } | ShadowRequest::Hide { external_id } => {
                external_id
            }
        }
    }
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tag_parse() {
        assert_eq!("3".parse::<ClassTag>().unwrap().as_str(), "3");
        assert_eq!(" 10 ".parse::<ClassTag>().unwrap().as_str(), "10");
        assert!("general".parse::<ClassTag>().unwrap().is_general());
        assert!("0".parse::<ClassTag>().is_err());
        assert!("11".parse::<ClassTag>().is_err());
        assert!("seven".parse::<ClassTag>().is_err());
    }

    #[test]
    fn test_class_tag_serde() {
        let tag: ClassTag = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"7\"");
        assert!(serde_json::from_str::<ClassTag>("\"12\"").is_err());
    }

    #[test]
    fn test_resource_type_strings() {
        assert_eq!("e-book".parse::<ResourceType>().unwrap(), ResourceType::EBook);
        assert_eq!(
            "Other Resources".parse::<ResourceType>().unwrap(),
            ResourceType::Other
        );
        assert_eq!(
            serde_json::to_string(&ResourceType::DriveFolder).unwrap(),
            "\"GDRIVE_FOLDER\""
        );
        assert!("SLIDES".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_mount_root_only_for_drive_folders() {
        let mut record = ResourceRecord {
            id: "r1".into(),
            title: "Unit".into(),
            description: None,
            link: "https://drive.google.com/drive/folders/abc".into(),
            class: ClassTag::general(),
            category: "notes".into(),
            resource_type: ResourceType::DriveFolder,
            drive_folder_id: Some("abc".into()),
            folder_id: None,
            hidden: false,
            created_by: "admin".into(),
            created_at: Utc::now(),
        };
        assert_eq!(record.mount_root(), Some("abc"));
        record.resource_type = ResourceType::Pdf;
        assert_eq!(record.mount_root(), None);
        assert_eq!(record.media(), MediaKind::Document);
    }

    #[test]
    fn test_override_fields_validation() {
        let fields: OverrideFields = serde_json::from_value(serde_json::json!({
            "title": "  New title ",
            "link": "https://example.com/a.pdf",
            "class": "4",
            "category": "notes",
            "type": "PDF"
        }))
        .unwrap();
        let fields = fields.validated().unwrap();
        assert_eq!(fields.title, "New title");

        let missing = serde_json::from_value::<OverrideFields>(serde_json::json!({
            "title": "x",
            "class": "4",
            "category": "notes",
            "type": "PDF"
        }));
        assert!(missing.is_err());

        let blank = OverrideFields {
            title: " ".into(),
            ..fields.clone()
        };
        assert!(blank.validated().is_err());

        let folder = OverrideFields {
            resource_type: ResourceType::DriveFolder,
            ..fields
        };
        assert!(folder.validated().is_err());
    }

    #[test]
    fn test_shadow_request_from_synthetic_id() {
        let hide = ShadowRequest::hide_item("ext-abc").unwrap();
        assert_eq!(hide.external_id(), "abc");
        assert!(ShadowRequest::hide_item("abc").is_err());
        assert!(ShadowRequest::hide_item("65f0c2a1").is_err());
    }

    #[test]
    fn test_shadow_action_serde() {
        let json = serde_json::to_value(&ShadowAction::Hide).unwrap();
        assert_eq!(json["kind"], "hide");
    }
}
