//! Layering of local shadow records over flattened drive files.
//!
//! A drive file is never modified. What students see is decided here:
//! a hide record removes the file, an override replaces its presentation
//! fields, and anything else passes through under a synthetic id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{CatalogError, Result};
use crate::flatten::FlatItem;
use crate::records::{
    ExternalItem, OverrideFields, ResourceRecord, ResourceType, ShadowAction, ShadowRecord,
    VisibleResourceItem,
};
use crate::url_parser::is_valid_id;

/// Prefix that marks a listing id as derived from a drive file.
pub const SYNTHETIC_PREFIX: &str = "ext-";

pub fn synthetic_id(external_id: &str) -> String {
    format!("{}{}", SYNTHETIC_PREFIX, external_id)
}

/// Recover the drive file id from a synthetic listing id.
pub fn parse_synthetic_id(id: &str) -> Result<&str> {
    id.trim()
        .strip_prefix(SYNTHETIC_PREFIX)
        .filter(|external_id| is_valid_id(external_id))
        .ok_or_else(|| CatalogError::InvalidInput(format!("not a drive item id: {}", id)))
}

/// Effective directive for one drive file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadowDecision<'a> {
    Hidden,
    Override(&'a OverrideFields),
}

#[derive(Debug, Clone, Copy)]
struct Resolved<'a> {
    decision: ShadowDecision<'a>,
    created_at: DateTime<Utc>,
}

/// Shadow records keyed by external item id.
///
/// Hide records are sticky: once any hide exists for a file it stays hidden
/// regardless of later overrides. Among overrides the newest `created_at`
/// wins, and equal timestamps resolve to the record that comes later in the
/// input.
#[derive(Debug, Default)]
pub struct ShadowIndex<'a> {
    entries: HashMap<&'a str, Resolved<'a>>,
}

impl<'a> ShadowIndex<'a> {
    pub fn build(records: &'a [ShadowRecord]) -> Self {
        let mut entries: HashMap<&'a str, Resolved<'a>> = HashMap::with_capacity(records.len());

        for record in records {
            let candidate = Resolved {
                decision: match &record.action {
                    ShadowAction::Hide => ShadowDecision::Hidden,
                    ShadowAction::Override(fields) => ShadowDecision::Override(fields),
                },
                created_at: record.created_at,
            };

            entries
                .entry(record.external_item_id.as_str())
                .and_modify(|current| {
                    let replace = match (current.decision, candidate.decision) {
                        (ShadowDecision::Hidden, _) => false,
                        (_, ShadowDecision::Hidden) => true,
                        _ => candidate.created_at >= current.created_at,
                    };
                    if replace {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }

        Self { entries }
    }

    pub fn decision(&self, external_id: &str) -> Option<ShadowDecision<'a>> {
        self.entries.get(external_id).map(|r| r.decision)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Produce the visible items of one mount, preserving flatten order.
    pub fn reconcile(&self, items: &[FlatItem], mount: &ResourceRecord) -> Vec<VisibleResourceItem> {
        items
            .iter()
            .filter_map(|item| match self.decision(&item.id) {
                Some(ShadowDecision::Hidden) => None,
                Some(ShadowDecision::Override(fields)) => Some(overridden(item, fields, mount)),
                None => Some(passthrough(item, mount)),
            })
            .map(VisibleResourceItem::External)
            .collect()
    }
}

/// Convenience wrapper for a single mount.
pub fn reconcile(
    items: &[FlatItem],
    shadows: &[ShadowRecord],
    mount: &ResourceRecord,
) -> Vec<VisibleResourceItem> {
    ShadowIndex::build(shadows).reconcile(items, mount)
}

fn default_link(item: &FlatItem) -> String {
    item.web_link
        .clone()
        .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", item.id))
}

fn passthrough(item: &FlatItem, mount: &ResourceRecord) -> ExternalItem {
    let link = default_link(item);
    ExternalItem {
        id: synthetic_id(&item.id),
        external_id: item.id.clone(),
        mount_id: mount.id.clone(),
        title: item.name.clone(),
        media: ExternalItem::media_for(&item.mime_type, ResourceType::ExternalFile, &link),
        link,
        class: mount.class.clone(),
        category: mount.category.clone(),
        resource_type: ResourceType::ExternalFile,
        mime_type: item.mime_type.clone(),
        overridden: false,
        created_by: mount.created_by.clone(),
        created_at: mount.created_at,
    }
}

fn overridden(item: &FlatItem, fields: &OverrideFields, mount: &ResourceRecord) -> ExternalItem {
    ExternalItem {
        id: synthetic_id(&item.id),
        external_id: item.id.clone(),
        mount_id: mount.id.clone(),
        title: fields.title.clone(),
        link: fields.link.clone(),
        class: fields.class.clone(),
        category: fields.category.clone(),
        resource_type: fields.resource_type,
        mime_type: item.mime_type.clone(),
        media: ExternalItem::media_for(&item.mime_type, fields.resource_type, &fields.link),
        overridden: true,
        created_by: mount.created_by.clone(),
        created_at: mount.created_at,
    }
}
