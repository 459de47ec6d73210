//! Shared in-process drive for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use drive_catalog::models::{FileMetadata, FOLDER_MIME_TYPE};
use drive_catalog::{CatalogError, TreeSource};

/// Drive double with optional per-call latency and folders that refuse access.
#[derive(Default)]
pub struct MemoryDrive {
    nodes: HashMap<String, FileMetadata>,
    children: HashMap<String, Vec<String>>,
    locked: Vec<String>,
    delay: Option<Duration>,
}

impl MemoryDrive {
    pub fn folder(mut self, id: &str, children: &[&str]) -> Self {
        self.nodes.insert(
            id.to_string(),
            FileMetadata {
                id: id.to_string(),
                name: format!("Folder {}", id),
                mime_type: Some(FOLDER_MIME_TYPE.to_string()),
                web_view_link: None,
            },
        );
        self.children
            .insert(id.to_string(), children.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn file(mut self, id: &str, mime_type: &str) -> Self {
        self.nodes.insert(
            id.to_string(),
            FileMetadata {
                id: id.to_string(),
                name: format!("{}.pdf", id),
                mime_type: Some(mime_type.to_string()),
                web_view_link: None,
            },
        );
        self
    }

    pub fn locked(mut self, id: &str) -> Self {
        self.locked.push(id.to_string());
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TreeSource for MemoryDrive {
    async fn get_node(&self, id: &str) -> drive_catalog::Result<FileMetadata> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    async fn get_children(
        &self,
        folder_id: &str,
        _limit: usize,
    ) -> drive_catalog::Result<Vec<FileMetadata>> {
        if self.locked.iter().any(|id| id == folder_id) {
            return Err(CatalogError::PermissionDenied(folder_id.to_string()));
        }
        let ids = self.children.get(folder_id).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| self.nodes.get(id).cloned()).collect())
    }
}
