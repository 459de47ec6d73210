//! Primary resource store: native resource records and shadow records.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::records::{ClassTag, FolderRecord, ResourceRecord, ResourceType, ShadowRecord};

/// Filters applied to native records before mount expansion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub class: Option<ClassTag>,
    /// Classes the viewer may see; `None` means unrestricted.
    pub visible_classes: Option<Vec<ClassTag>>,
    pub category: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub search: Option<String>,
    pub folder_id: Option<String>,
}

impl ResourceFilter {
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        if record.hidden {
            return false;
        }
        if let Some(allowed) = &self.visible_classes {
            if !allowed.contains(&record.class) {
                return false;
            }
        }
        if let Some(folder_id) = &self.folder_id {
            if record.folder_id.as_ref() != Some(folder_id) {
                return false;
            }
        }
        if let Some(class) = &self.class {
            if &record.class != class {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !record.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(resource_type) = self.resource_type {
            if record.resource_type != resource_type {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_title = record.title.to_lowercase().contains(&needle);
            let in_description = record
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

/// Selects the direct children of one folder level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderFilter {
    /// `None` selects top-level folders.
    pub parent: Option<String>,
    pub visible_classes: Option<Vec<ClassTag>>,
}

impl FolderFilter {
    pub fn matches(&self, folder: &FolderRecord) -> bool {
        if folder.parent_folder != self.parent {
            return false;
        }
        match &self.visible_classes {
            Some(allowed) => allowed.contains(&folder.class),
            None => true,
        }
    }
}

/// Persistence seam for catalog records.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Matching native records, newest first. Ties keep insertion order.
    async fn query_resources(&self, filter: &ResourceFilter) -> Result<Vec<ResourceRecord>>;

    async fn insert_resource(&self, record: ResourceRecord) -> Result<()>;

    /// All shadow records in insertion order.
    async fn list_shadows(&self) -> Result<Vec<ShadowRecord>>;

    /// Append a shadow record. Existing records are never rewritten.
    async fn insert_shadow(&self, record: ShadowRecord) -> Result<()>;

    /// Matching folders sorted by name.
    async fn query_folders(&self, filter: &FolderFilter) -> Result<Vec<FolderRecord>>;

    async fn get_folder(&self, id: &str) -> Result<Option<FolderRecord>>;

    async fn insert_folder(&self, folder: FolderRecord) -> Result<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    resources: Vec<ResourceRecord>,
    #[serde(default)]
    shadows: Vec<ShadowRecord>,
    #[serde(default)]
    folders: Vec<FolderRecord>,
}

/// Store kept in memory and, when opened from a path, mirrored to a JSON file.
pub struct JsonStore {
    path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl JsonStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Open a store file, starting empty if it does not exist yet.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => StoreState::default(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(err) => return Err(err.into()),
        };
        debug!(
            path = %path.display(),
            resources = state.resources.len(),
            shadows = state.shadows.len(),
            folders = state.folders.len(),
            "opened catalog store"
        );
        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Apply `change` to a copy of the state and keep it only once it is saved.
    async fn commit<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreState) + Send,
    {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        change(&mut next);
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for JsonStore {
    async fn query_resources(&self, filter: &ResourceFilter) -> Result<Vec<ResourceRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<ResourceRecord> = state
            .resources
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn insert_resource(&self, record: ResourceRecord) -> Result<()> {
        self.commit(|state| state.resources.push(record)).await
    }

    async fn list_shadows(&self) -> Result<Vec<ShadowRecord>> {
        Ok(self.state.read().await.shadows.clone())
    }

    async fn insert_shadow(&self, record: ShadowRecord) -> Result<()> {
        self.commit(|state| state.shadows.push(record)).await
    }

    async fn query_folders(&self, filter: &FolderFilter) -> Result<Vec<FolderRecord>> {
        let state = self.state.read().await;
        let mut folders: Vec<FolderRecord> = state
            .folders
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn get_folder(&self, id: &str) -> Result<Option<FolderRecord>> {
        let state = self.state.read().await;
        Ok(state.folders.iter().find(|f| f.id == id).cloned())
    }

    async fn insert_folder(&self, folder: FolderRecord) -> Result<()> {
        self.commit(|state| state.folders.push(folder)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::records::ShadowAction;

    fn record(id: &str, class: &str, minute: i64) -> ResourceRecord {
        ResourceRecord {
            id: id.into(),
            title: format!("Title {}", id),
            description: Some("Chapter summary".into()),
            link: format!("https://example.com/{}.pdf", id),
            class: class.parse().unwrap(),
            category: "Notes".into(),
            resource_type: ResourceType::Pdf,
            drive_folder_id: None,
            folder_id: None,
            hidden: false,
            created_by: "admin".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minute),
        }
    }

    #[test]
    fn test_filter_matches() {
        let r = record("a", "5", 0);
        assert!(ResourceFilter::default().matches(&r));
        assert!(ResourceFilter {
            category: Some("notes".into()),
            search: Some("CHAPTER".into()),
            ..Default::default()
        }
        .matches(&r));
        assert!(!ResourceFilter {
            class: Some("6".parse().unwrap()),
            ..Default::default()
        }
        .matches(&r));
        assert!(!ResourceFilter {
            visible_classes: Some(vec![ClassTag::general()]),
            ..Default::default()
        }
        .matches(&r));
        assert!(!ResourceFilter {
            resource_type: Some(ResourceType::Video),
            ..Default::default()
        }
        .matches(&r));

        let hidden = ResourceRecord {
            hidden: true,
            ..record("b", "5", 0)
        };
        assert!(!ResourceFilter::default().matches(&hidden));

        let filed = ResourceRecord {
            folder_id: Some("f1".into()),
            ..record("c", "5", 0)
        };
        let in_f1 = ResourceFilter {
            folder_id: Some("f1".into()),
            ..Default::default()
        };
        assert!(in_f1.matches(&filed));
        assert!(!in_f1.matches(&r));
    }

    #[tokio::test]
    async fn test_query_sorted_newest_first() {
        let store = JsonStore::in_memory();
        store.insert_resource(record("old", "1", 0)).await.unwrap();
        store.insert_resource(record("new", "1", 10)).await.unwrap();
        store.insert_resource(record("mid", "1", 5)).await.unwrap();

        let ids: Vec<String> = store
            .query_resources(&ResourceFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_shadows_append_only() {
        let store = JsonStore::in_memory();
        for id in ["s1", "s2"] {
            store
                .insert_shadow(ShadowRecord {
                    id: id.into(),
                    external_item_id: "x".into(),
                    action: ShadowAction::Hide,
                    created_by: "admin".into(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let shadows = store.list_shadows().await.unwrap();
        assert_eq!(shadows.len(), 2);
        assert_eq!(shadows[0].id, "s1");
    }

    fn folder(id: &str, name: &str, class: &str, parent: Option<&str>) -> FolderRecord {
        FolderRecord {
            id: id.into(),
            name: name.into(),
            class: class.parse().unwrap(),
            parent_folder: parent.map(str::to_string),
            path: parent.map(str::to_string).into_iter().collect(),
            created_by: "admin".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_folders_by_level_and_class() {
        let store = JsonStore::in_memory();
        store.insert_folder(folder("b", "Biology", "5", None)).await.unwrap();
        store.insert_folder(folder("a", "Algebra", "GENERAL", None)).await.unwrap();
        store.insert_folder(folder("c", "Chemistry", "6", None)).await.unwrap();
        store.insert_folder(folder("b1", "Cells", "5", Some("b"))).await.unwrap();

        let names = |folders: Vec<FolderRecord>| -> Vec<String> {
            folders.into_iter().map(|f| f.name).collect()
        };

        let top = store.query_folders(&FolderFilter::default()).await.unwrap();
        assert_eq!(names(top), vec!["Algebra", "Biology", "Chemistry"]);

        let scoped = FolderFilter {
            parent: None,
            visible_classes: Some(vec!["5".parse().unwrap(), ClassTag::general()]),
        };
        assert_eq!(
            names(store.query_folders(&scoped).await.unwrap()),
            vec!["Algebra", "Biology"]
        );

        let nested = FolderFilter {
            parent: Some("b".into()),
            ..Default::default()
        };
        assert_eq!(names(store.query_folders(&nested).await.unwrap()), vec!["Cells"]);
        assert!(store.get_folder("b1").await.unwrap().is_some());
        assert!(store.get_folder("zz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let store = JsonStore::open(&path).await.unwrap();
        store.insert_resource(record("kept", "1", 0)).await.unwrap();

        // A directory in the temp file's place makes every save fail.
        std::fs::create_dir(dir.path().join("catalog.json.tmp")).unwrap();

        assert!(store.insert_resource(record("lost", "1", 1)).await.is_err());
        let shadow = ShadowRecord {
            id: "s1".into(),
            external_item_id: "x".into(),
            action: ShadowAction::Hide,
            created_by: "admin".into(),
            created_at: Utc::now(),
        };
        assert!(store.insert_shadow(shadow).await.is_err());
        assert!(store.insert_folder(folder("f", "Physics", "1", None)).await.is_err());

        let ids: Vec<String> = store
            .query_resources(&ResourceFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["kept"]);
        assert!(store.list_shadows().await.unwrap().is_empty());
        assert!(store.query_folders(&FolderFilter::default()).await.unwrap().is_empty());

        let reopened = JsonStore::open(&path).await.unwrap();
        let count = reopened
            .query_resources(&ResourceFilter::default())
            .await
            .unwrap()
            .len();
        assert_eq!(count, 1);
    }
}
