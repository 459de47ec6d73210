//! Resource aggregation: native records joined with mounted drive folders.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::TreeSource;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::flatten::{flatten, FlatItem, FlattenTarget};
use crate::reconcile::ShadowIndex;
use crate::records::{
    required, ClassTag, CreateFolderRequest, CreateMountRequest, FolderRecord, ResourceRecord,
    ResourceType, ShadowAction, ShadowRecord, ShadowRequest, VisibleResourceItem,
};
use crate::store::{FolderFilter, ResourceFilter, ResourceStore};
use crate::tree::{ExternalTreeNode, TreeLimits, TreeMaterializer};
use crate::url_parser::extract_folder_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

/// The authenticated caller, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    /// A student's own class; ignored for admins.
    pub class: Option<ClassTag>,
}

impl Actor {
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
            class: None,
        }
    }

    pub fn student(user_id: impl Into<String>, class: Option<ClassTag>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Student,
            class,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CatalogError::Forbidden(format!(
                "user {} is not an administrator",
                self.user_id
            )))
        }
    }

    /// Students see their own class and `GENERAL`; admins see everything.
    fn visible_classes(&self) -> Option<Vec<ClassTag>> {
        match self.role {
            Role::Admin => None,
            Role::Student => Some(
                self.class
                    .iter()
                    .cloned()
                    .chain(std::iter::once(ClassTag::general()))
                    .collect(),
            ),
        }
    }
}

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub class: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub search: Option<String>,
    pub folder_id: Option<String>,
}

/// Validated listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub filter: ResourceFilter,
    pub page: usize,
    pub page_size: usize,
}

impl ListQuery {
    pub fn parse(&self, config: &CatalogConfig) -> Result<ListRequest> {
        let class = non_empty(&self.class)
            .map(|c| c.parse::<ClassTag>())
            .transpose()?;
        let resource_type = non_empty(&self.resource_type)
            .map(|t| t.parse::<ResourceType>())
            .transpose()?;
        let category = non_empty(&self.category).filter(|c| !c.eq_ignore_ascii_case("all"));

        Ok(ListRequest {
            filter: ResourceFilter {
                class,
                visible_classes: None,
                category,
                resource_type,
                search: non_empty(&self.search),
                folder_id: non_empty(&self.folder_id),
            },
            page: self.page.unwrap_or(1).max(1),
            page_size: self
                .page_size
                .unwrap_or(config.default_page_size)
                .clamp(1, config.max_page_size.max(1)),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// One page of the visible catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePage {
    pub resources: Vec<VisibleResourceItem>,
    pub total_resources: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl ResourcePage {
    fn paginate(items: Vec<VisibleResourceItem>, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_resources = items.len();
        let resources = items
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        Self {
            resources,
            total_resources,
            total_pages: total_resources.div_ceil(page_size),
            current_page: page,
        }
    }
}

/// Entry point for listing, mounting and shadowing drive content.
pub struct Catalog {
    source: Arc<dyn TreeSource>,
    store: Arc<dyn ResourceStore>,
    config: CatalogConfig,
    target: FlattenTarget,
}

impl Catalog {
    pub fn new(
        source: Arc<dyn TreeSource>,
        store: Arc<dyn ResourceStore>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            target: FlattenTarget::documents(),
        }
    }

    pub fn with_target(mut self, target: FlattenTarget) -> Self {
        self.target = target;
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn materializer(&self) -> TreeMaterializer {
        TreeMaterializer::new(Arc::clone(&self.source), TreeLimits::from(&self.config))
    }

    /// List one page of visible resources for `actor`.
    ///
    /// Facet filters select native records. Each selected mount then
    /// contributes its reconciled drive files at the mount's position.
    pub async fn list(&self, actor: &Actor, request: &ListRequest) -> Result<ResourcePage> {
        let visible_classes = actor.visible_classes();
        let filter = ResourceFilter {
            visible_classes: visible_classes.clone(),
            ..request.filter.clone()
        };

        let records = self.store.query_resources(&filter).await?;
        let shadows = self.store.list_shadows().await?;
        let index = ShadowIndex::build(&shadows);
        debug!(
            records = records.len(),
            shadowed = index.len(),
            "expanding catalog listing"
        );

        let expansions = join_all(
            records
                .iter()
                .filter(|r| r.mount_root().is_some())
                .map(|mount| self.expand_mount(mount)),
        )
        .await;
        let mut expansions = expansions.into_iter();

        let mut visible = Vec::with_capacity(records.len());
        for record in &records {
            if record.mount_root().is_none() {
                visible.push(VisibleResourceItem::Native(record.clone()));
                continue;
            }
            let items = expansions.next().transpose()?.unwrap_or_default();
            visible.extend(index.reconcile(&items, record).into_iter().filter(|item| {
                match (item, &visible_classes) {
                    (VisibleResourceItem::External(e), Some(allowed)) => allowed.contains(&e.class),
                    _ => true,
                }
            }));
        }

        Ok(ResourcePage::paginate(visible, request.page, request.page_size))
    }

    /// Flattened files of one mount. Provider failures yield an empty list.
    async fn expand_mount(&self, mount: &ResourceRecord) -> Result<Vec<FlatItem>> {
        let Some(root) = mount.mount_root() else {
            return Ok(Vec::new());
        };

        let outcome =
            tokio::time::timeout(self.config.mount_timeout, self.materializer().materialize(root))
                .await;

        match outcome {
            Ok(Ok(Some(tree))) => Ok(flatten(&tree, &self.target)),
            Ok(Ok(None)) => {
                warn!(mount_id = %mount.id, folder_id = root, "drive folder not found, skipping mount");
                Ok(Vec::new())
            }
            Ok(Err(err)) if err.is_isolatable() => {
                warn!(mount_id = %mount.id, folder_id = root, error = %err, "failed to expand mount");
                Ok(Vec::new())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                warn!(
                    mount_id = %mount.id,
                    folder_id = root,
                    timeout_ms = self.config.mount_timeout.as_millis() as u64,
                    "timed out expanding mount"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Materialize a folder for preview or validation. Errors propagate.
    pub async fn preview_tree(&self, folder_link: &str) -> Result<ExternalTreeNode> {
        let folder_id = extract_folder_id(folder_link)?;
        tokio::time::timeout(
            self.config.mount_timeout,
            self.materializer().materialize(&folder_id),
        )
        .await
        .map_err(|_| CatalogError::Timeout(format!("expanding drive folder {}", folder_id)))??
        .ok_or_else(|| CatalogError::NotFound(format!("drive folder {}", folder_id)))
    }

    /// Persist a new mount after checking the folder is reachable.
    pub async fn create_mount(
        &self,
        actor: &Actor,
        request: CreateMountRequest,
    ) -> Result<ResourceRecord> {
        actor.require_admin()?;
        let title = required("title", &request.title)?;
        let category = required("category", &request.category)?;
        let folder_id = extract_folder_id(&request.folder_link)?;
        let local_folder = match non_empty(&request.folder_id) {
            Some(id) => Some(self.require_folder(&id).await?.id),
            None => None,
        };

        let tree = self.preview_tree(&folder_id).await?;
        if !tree.is_folder() {
            return Err(CatalogError::InvalidInput(format!(
                "{} is a file, not a folder",
                folder_id
            )));
        }

        let record = ResourceRecord {
            id: Uuid::new_v4().to_string(),
            title,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            link: request.folder_link.trim().to_string(),
            class: request.class,
            category,
            resource_type: ResourceType::DriveFolder,
            drive_folder_id: Some(folder_id),
            folder_id: local_folder,
            hidden: false,
            created_by: actor.user_id.clone(),
            created_at: Utc::now(),
        };
        self.store.insert_resource(record.clone()).await?;

        info!(
            mount_id = %record.id,
            folder_id = record.drive_folder_id.as_deref().unwrap_or_default(),
            nodes = tree.node_count(),
            "created drive mount"
        );
        Ok(record)
    }

    /// Folders directly below `parent_id` (top level when `None`), by name.
    pub async fn list_folders(
        &self,
        actor: &Actor,
        parent_id: Option<&str>,
    ) -> Result<Vec<FolderRecord>> {
        let filter = FolderFilter {
            parent: parent_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            visible_classes: actor.visible_classes(),
        };
        self.store.query_folders(&filter).await
    }

    pub async fn create_folder(
        &self,
        actor: &Actor,
        request: CreateFolderRequest,
    ) -> Result<FolderRecord> {
        actor.require_admin()?;
        let name = required("name", &request.name)?;

        let (parent_folder, path) = match non_empty(&request.parent_id) {
            Some(parent_id) => {
                let parent = self
                    .store
                    .get_folder(&parent_id)
                    .await?
                    .ok_or_else(|| CatalogError::NotFound(format!("parent folder {}", parent_id)))?;
                let mut path = parent.path;
                path.push(parent.id.clone());
                (Some(parent.id), path)
            }
            None => (None, Vec::new()),
        };

        let folder = FolderRecord {
            id: Uuid::new_v4().to_string(),
            name,
            class: request.class,
            parent_folder,
            path,
            created_by: actor.user_id.clone(),
            created_at: Utc::now(),
        };
        self.store.insert_folder(folder.clone()).await?;

        info!(folder_id = %folder.id, depth = folder.path.len(), "created folder");
        Ok(folder)
    }

    async fn require_folder(&self, id: &str) -> Result<FolderRecord> {
        self.store
            .get_folder(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("folder {}", id)))
    }

    /// Record an override or hide against a drive file.
    pub async fn apply_shadow(&self, actor: &Actor, request: ShadowRequest) -> Result<ShadowRecord> {
        actor.require_admin()?;
        let external_item_id = request.external_id().to_string();
        let action = match request {
            ShadowRequest::Override { fields, .. } => ShadowAction::Override(fields.validated()?),
            ShadowRequest::Hide { .. } => ShadowAction::Hide,
        };

        let record = ShadowRecord {
            id: Uuid::new_v4().to_string(),
            external_item_id,
            action,
            created_by: actor.user_id.clone(),
            created_at: Utc::now(),
        };
        self.store.insert_shadow(record.clone()).await?;

        info!(
            shadow_id = %record.id,
            external_id = %record.external_item_id,
            hidden = record.is_hidden(),
            "recorded shadow"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone};

    use super::*;
    use crate::classify::MediaKind;
    use crate::records::OverrideFields;
    use crate::store::JsonStore;
    use crate::tree::testing::FakeDrive;

    const PDF: &str = "application/pdf";

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn native(id: &str, class: &str, minute: i64) -> ResourceRecord {
        ResourceRecord {
            id: id.into(),
            title: format!("Native {}", id),
            description: None,
            link: format!("https://example.com/{}.pdf", id),
            class: class.parse().unwrap(),
            category: "notes".into(),
            resource_type: ResourceType::Pdf,
            drive_folder_id: None,
            folder_id: None,
            hidden: false,
            created_by: "admin".into(),
            created_at: at(minute),
        }
    }

    fn mount(id: &str, root: &str, class: &str, minute: i64) -> ResourceRecord {
        ResourceRecord {
            resource_type: ResourceType::DriveFolder,
            drive_folder_id: Some(root.into()),
            link: format!("https://drive.google.com/drive/folders/{}", root),
            ..native(id, class, minute)
        }
    }

    fn catalog(drive: FakeDrive, store: Arc<JsonStore>) -> Catalog {
        Catalog::new(Arc::new(drive), store, CatalogConfig::default())
    }

    fn request(page: usize, page_size: usize) -> ListRequest {
        ListRequest {
            filter: ResourceFilter::default(),
            page,
            page_size,
        }
    }

    #[test]
    fn test_list_query_parse() {
        let config = CatalogConfig::default();
        let query = ListQuery {
            page: Some(0),
            page_size: Some(10_000),
            class: Some(" ".into()),
            category: Some("All".into()),
            resource_type: Some("PDF".into()),
            search: Some(" algebra ".into()),
            folder_id: Some(" f1 ".into()),
        };
        let parsed = query.parse(&config).unwrap();
        assert_eq!(parsed.page, 1);
        assert_eq!(parsed.page_size, config.max_page_size);
        assert_eq!(parsed.filter.class, None);
        assert_eq!(parsed.filter.category, None);
        assert_eq!(parsed.filter.resource_type, Some(ResourceType::Pdf));
        assert_eq!(parsed.filter.search.as_deref(), Some("algebra"));
        assert_eq!(parsed.filter.folder_id.as_deref(), Some("f1"));

        let bad = ListQuery {
            class: Some("13".into()),
            ..Default::default()
        };
        assert!(bad.parse(&config).is_err());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<VisibleResourceItem> = (0..25)
            .map(|i| VisibleResourceItem::Native(native(&i.to_string(), "1", i)))
            .collect();
        let page = ResourcePage::paginate(items.clone(), 1, 12);
        assert_eq!(page.resources.len(), 12);
        assert_eq!(page.total_pages, 3);
        let page = ResourcePage::paginate(items.clone(), 3, 12);
        assert_eq!(page.resources.len(), 1);
        assert_eq!(page.resources[0].id(), "24");
        let page = ResourcePage::paginate(items, 4, 12);
        assert!(page.resources.is_empty());
        assert_eq!(page.current_page, 4);
    }

    #[tokio::test]
    async fn test_mount_items_take_mount_position() {
        let drive = FakeDrive::default()
            .folder("root", &["d1", "d2"])
            .file("d1", PDF)
            .file("d2", PDF);
        let store = Arc::new(JsonStore::in_memory());
        store.insert_resource(native("old", "1", 0)).await.unwrap();
        store.insert_resource(mount("m", "root", "1", 5)).await.unwrap();
        store.insert_resource(native("new", "1", 10)).await.unwrap();

        let page = catalog(drive, store)
            .list(&Actor::admin("admin"), &request(1, 12))
            .await
            .unwrap();
        let ids: Vec<&str> = page.resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["new", "ext-d1", "ext-d2", "old"]);
        assert_eq!(page.total_resources, 4);
    }

    #[tokio::test]
    async fn test_missing_mount_is_isolated() {
        let drive = FakeDrive::default().folder("good", &["d1"]).file("d1", PDF);
        let store = Arc::new(JsonStore::in_memory());
        store.insert_resource(mount("bad", "gone", "1", 1)).await.unwrap();
        store.insert_resource(mount("ok", "good", "1", 2)).await.unwrap();

        let page = catalog(drive, store)
            .list(&Actor::admin("admin"), &request(1, 12))
            .await
            .unwrap();
        let ids: Vec<&str> = page.resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["ext-d1"]);
    }

    #[tokio::test]
    async fn test_custom_flatten_target() {
        let drive = FakeDrive::default()
            .folder("root", &["d1", "a1"])
            .file("d1", PDF)
            .file("a1", "audio/mpeg");
        let store = Arc::new(JsonStore::in_memory());
        store.insert_resource(mount("m", "root", "1", 0)).await.unwrap();

        let catalog = catalog(drive, store).with_target(FlattenTarget::new([MediaKind::Audio]));
        let page = catalog
            .list(&Actor::admin("admin"), &request(1, 12))
            .await
            .unwrap();
        let ids: Vec<&str> = page.resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["ext-a1"]);
    }

    #[tokio::test]
    async fn test_student_scope() {
        let drive = FakeDrive::default().folder("root", &["d1"]).file("d1", PDF);
        let store = Arc::new(JsonStore::in_memory());
        store.insert_resource(native("c5", "5", 0)).await.unwrap();
        store.insert_resource(native("c6", "6", 1)).await.unwrap();
        store.insert_resource(native("gen", "GENERAL", 2)).await.unwrap();
        store.insert_resource(mount("m", "root", "GENERAL", 3)).await.unwrap();
        store
            .insert_shadow(ShadowRecord {
                id: "s".into(),
                external_item_id: "d1".into(),
                action: ShadowAction::Override(OverrideFields {
                    title: "Class six only".into(),
                    link: "https://example.com/x".into(),
                    class: "6".parse().unwrap(),
                    category: "notes".into(),
                    resource_type: ResourceType::Pdf,
                }),
                created_by: "admin".into(),
                created_at: at(4),
            })
            .await
            .unwrap();

        let catalog = catalog(drive, store);
        let student = Actor::student("s1", Some("5".parse().unwrap()));
        let page = catalog.list(&student, &request(1, 12)).await.unwrap();
        let ids: Vec<&str> = page.resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["gen", "c5"]);

        let unassigned = Actor::student("s2", None);
        let page = catalog.list(&unassigned, &request(1, 12)).await.unwrap();
        let ids: Vec<&str> = page.resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["gen"]);
    }

    #[tokio::test]
    async fn test_create_mount_requires_admin_and_valid_folder() {
        let drive = FakeDrive::default()
            .folder("root", &["d1"])
            .file("d1", PDF);
        let store = Arc::new(JsonStore::in_memory());
        let catalog = catalog(drive, store.clone());

        let request = |link: &str| CreateMountRequest {
            title: "Physics".into(),
            folder_link: link.into(),
            class: "9".parse().unwrap(),
            category: "notes".into(),
            description: None,
            folder_id: None,
        };

        let err = catalog
            .create_mount(&Actor::student("s", None), request("root"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden(_)));

        let err = catalog
            .create_mount(&Actor::admin("a"), request("https://example.com/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));

        let err = catalog
            .create_mount(&Actor::admin("a"), request("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));

        let err = catalog
            .create_mount(&Actor::admin("a"), request("d1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));

        let record = catalog
            .create_mount(
                &Actor::admin("a"),
                request("https://drive.google.com/drive/folders/root?usp=sharing"),
            )
            .await
            .unwrap();
        assert_eq!(record.drive_folder_id.as_deref(), Some("root"));
        assert_eq!(record.resource_type, ResourceType::DriveFolder);
        assert_eq!(store.query_resources(&ResourceFilter::default()).await.unwrap().len(), 1);

        let err = catalog
            .create_mount(
                &Actor::admin("a"),
                CreateMountRequest {
                    folder_id: Some("no-such-folder".into()),
                    ..request("root")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_folders_nest_and_file_mounts() {
        let drive = FakeDrive::default().folder("root", &["d1"]).file("d1", PDF);
        let store = Arc::new(JsonStore::in_memory());
        let catalog = catalog(drive, store.clone());
        let admin = Actor::admin("a");
        let folder = |name: &str, class: &str, parent: Option<&str>| CreateFolderRequest {
            name: name.into(),
            class: class.parse().unwrap(),
            parent_id: parent.map(str::to_string),
        };

        let err = catalog
            .create_folder(&Actor::student("s", None), folder("Maths", "7", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden(_)));

        let err = catalog
            .create_folder(&admin, folder("  ", "7", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidInput(_)));

        let err = catalog
            .create_folder(&admin, folder("Algebra", "7", Some("missing")))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(ref m) if m.contains("parent folder")));

        let top = catalog
            .create_folder(&admin, folder("Maths", "7", None))
            .await
            .unwrap();
        let mid = catalog
            .create_folder(&admin, folder("Algebra", "7", Some(&top.id)))
            .await
            .unwrap();
        let leaf = catalog
            .create_folder(&admin, folder("Equations", "7", Some(&mid.id)))
            .await
            .unwrap();
        catalog
            .create_folder(&admin, folder("Art", "GENERAL", None))
            .await
            .unwrap();
        catalog
            .create_folder(&admin, folder("Biology", "9", None))
            .await
            .unwrap();
        assert_eq!(mid.parent_folder.as_deref(), Some(top.id.as_str()));
        assert_eq!(leaf.path, vec![top.id.clone(), mid.id.clone()]);

        let names = |folders: Vec<FolderRecord>| -> Vec<String> {
            folders.into_iter().map(|f| f.name).collect()
        };
        let student = Actor::student("s", Some("7".parse().unwrap()));
        let top_level = catalog.list_folders(&student, None).await.unwrap();
        assert_eq!(names(top_level), vec!["Art", "Maths"]);
        let below = catalog.list_folders(&student, Some(&top.id)).await.unwrap();
        assert_eq!(names(below), vec!["Algebra"]);
        let unassigned = catalog
            .list_folders(&Actor::student("s2", None), None)
            .await
            .unwrap();
        assert_eq!(names(unassigned), vec!["Art"]);
        assert_eq!(catalog.list_folders(&admin, None).await.unwrap().len(), 3);

        let record = catalog
            .create_mount(
                &admin,
                CreateMountRequest {
                    title: "Equation sheets".into(),
                    folder_link: "root".into(),
                    class: "7".parse().unwrap(),
                    category: "notes".into(),
                    description: None,
                    folder_id: Some(leaf.id.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(record.folder_id.as_deref(), Some(leaf.id.as_str()));
    }

    #[tokio::test]
    async fn test_apply_shadow_appends() {
        let store = Arc::new(JsonStore::in_memory());
        let catalog = catalog(FakeDrive::default(), store.clone());
        let admin = Actor::admin("a");

        catalog
            .apply_shadow(&admin, ShadowRequest::hide_item("ext-x").unwrap())
            .await
            .unwrap();
        catalog
            .apply_shadow(&admin, ShadowRequest::hide_item("ext-x").unwrap())
            .await
            .unwrap();
        assert_eq!(store.list_shadows().await.unwrap().len(), 2);

        let err = catalog
            .apply_shadow(&Actor::student("s", None), ShadowRequest::hide_item("ext-x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden(_)));
    }
}
