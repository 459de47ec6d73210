//! Projection of a materialized tree into its matching leaves.

use serde::{Deserialize, Serialize};

use crate::classify::{classify_mime, MediaKind};
use crate::tree::ExternalTreeNode;

/// A file leaf lifted out of a drive tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatItem {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub web_link: Option<String>,
}

/// Which media kinds survive flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenTarget {
    kinds: Vec<MediaKind>,
}

impl FlattenTarget {
    pub fn new(kinds: impl IntoIterator<Item = MediaKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn documents() -> Self {
        Self::new([MediaKind::Document])
    }

    pub fn matches(&self, mime_type: &str) -> bool {
        self.kinds.contains(&classify_mime(mime_type))
    }
}

impl Default for FlattenTarget {
    fn default() -> Self {
        Self::documents()
    }
}

/// Pre-order walk collecting files whose mime type matches `target`.
pub fn flatten(tree: &ExternalTreeNode, target: &FlattenTarget) -> Vec<FlatItem> {
    let mut items = Vec::new();
    collect(tree, target, &mut items);
    items
}

fn collect(node: &ExternalTreeNode, target: &FlattenTarget, items: &mut Vec<FlatItem>) {
    if node.is_folder() {
        for child in &node.children {
            collect(child, target, items);
        }
    } else if target.matches(&node.mime_type) {
        items.push(FlatItem {
            id: node.id.clone(),
            name: node.name.clone(),
            mime_type: node.mime_type.clone(),
            web_link: node.web_link.clone(),
        });
    }
}
