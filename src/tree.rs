//! Recursive materialization of an external folder tree.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::TreeSource;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::models::{FileMetadata, FOLDER_MIME_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

/// In-memory mirror of one drive node and, for folders, its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTreeNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_link: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExternalTreeNode>,
}

impl ExternalTreeNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

impl From<FileMetadata> for ExternalTreeNode {
    fn from(file: FileMetadata) -> Self {
        let kind = if file.is_folder() {
            NodeKind::Folder
        } else {
            NodeKind::File
        };
        let mime_type = file.mime_type_or_default().to_string();
        Self {
            id: file.id,
            name: file.name,
            kind,
            mime_type,
            web_link: file.web_view_link.filter(|link| !link.is_empty()),
            children: Vec::new(),
        }
    }
}

/// Bounds applied while walking a tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub max_children: usize,
    pub max_nodes: usize,
}

impl From<&CatalogConfig> for TreeLimits {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_children: config.max_children,
            max_nodes: config.max_nodes,
        }
    }
}

/// Walks a drive folder from its root, one level per provider call.
///
/// Cycle protection is path scoped: each branch carries its own copy of the
/// ancestor set, so a folder shared under two branches is expanded under both
/// while a folder that contains one of its own ancestors stops there.
pub struct TreeMaterializer {
    source: Arc<dyn TreeSource>,
    limits: TreeLimits,
}

impl TreeMaterializer {
    pub fn new(source: Arc<dyn TreeSource>, limits: TreeLimits) -> Self {
        Self { source, limits }
    }

    /// Materialize the tree under `root_id`.
    ///
    /// Returns `Ok(None)` when the root does not exist. Other provider errors
    /// and guard-rail violations are returned as errors.
    pub async fn materialize(&self, root_id: &str) -> Result<Option<ExternalTreeNode>> {
        let mut metadata = match self.source.get_node(root_id).await {
            Ok(metadata) => metadata,
            Err(CatalogError::NotFound(message)) => {
                debug!(root_id, %message, "drive root not found");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        if metadata.id.is_empty() || metadata.name.is_empty() {
            return Ok(None);
        }

        if metadata.mime_type.is_none() {
            metadata.mime_type = Some(FOLDER_MIME_TYPE.to_string());
        }

        let mut root = ExternalTreeNode::from(metadata);

        let budget = AtomicUsize::new(1);
        if root.is_folder() {
            root.children = self.expand(&root.id, HashSet::new(), 1, &budget).await?;
        }

        debug!(root_id, nodes = root.node_count(), "materialized drive tree");
        Ok(Some(root))
    }

    fn expand<'a>(
        &'a self,
        folder_id: &'a str,
        mut ancestors: HashSet<String>,
        depth: usize,
        budget: &'a AtomicUsize,
    ) -> BoxFuture<'a, Result<Vec<ExternalTreeNode>>> {
        async move {
            if !ancestors.insert(folder_id.to_string()) {
                debug!(folder_id, "cycle detected, not descending");
                return Ok(Vec::new());
            }
            if depth > self.limits.max_depth {
                return Err(CatalogError::TreeTooLarge(format!(
                    "folder {} is nested deeper than {} levels",
                    folder_id, self.limits.max_depth
                )));
            }

            let files = self
                .source
                .get_children(folder_id, self.limits.max_children)
                .await?;
            if files.len() > self.limits.max_children {
                return Err(CatalogError::TreeTooLarge(format!(
                    "folder {} has {} entries (limit {})",
                    folder_id,
                    files.len(),
                    self.limits.max_children
                )));
            }

            let mut children = Vec::with_capacity(files.len());
            for file in files {
                if file.id.is_empty() || file.name.is_empty() {
                    continue;
                }
                let seen = budget.fetch_add(1, Ordering::Relaxed) + 1;
                if seen > self.limits.max_nodes {
                    return Err(CatalogError::TreeTooLarge(format!(
                        "more than {} nodes reachable",
                        self.limits.max_nodes
                    )));
                }

                let mut node = ExternalTreeNode::from(file);
                if node.is_folder() {
                    node.children = self
                        .expand(&node.id, ancestors.clone(), depth + 1, budget)
                        .await?;
                }
                children.push(node);
            }
            Ok(children)
        }
        .boxed()
    }
}
