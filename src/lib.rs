//! drive_catalog - Mirror Google Drive folders into a learning-resource catalog.
//!
//! This library provides functionality to:
//! - Materialize a Drive folder tree through a service account
//! - Flatten it into the document files students should see
//! - Layer local override and hide records on top without touching Drive
//! - Merge the result with natively stored resources into paginated listings
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use drive_catalog::{
//!     Actor, Authenticator, Catalog, CatalogConfig, DriveTreeClient, JsonStore, ListQuery,
//!     ProviderConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = ProviderConfig::from_env()?;
//!     let auth = Arc::new(Authenticator::new(&provider)?);
//!     let client = DriveTreeClient::new(&provider, auth)?;
//!     let store = JsonStore::open("catalog.json").await?;
//!
//!     let config = CatalogConfig::default();
//!     let catalog = Catalog::new(Arc::new(client), Arc::new(store), config.clone());
//!     let request = ListQuery::default().parse(&config)?;
//!     let page = catalog.list(&Actor::admin("admin"), &request).await?;
//!     for item in page.resources {
//!         println!("{}\t{}", item.id(), item.title());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod flatten;
pub mod identity;
pub mod models;
pub mod reconcile;
pub mod records;
pub mod store;
pub mod tree;
pub mod url_parser;

// Re-exports for convenience
pub use auth::{AccessTokenSource, Authenticator, StaticToken};
pub use catalog::{Actor, Catalog, ListQuery, ListRequest, ResourcePage, Role};
pub use classify::MediaKind;
pub use client::{DriveTreeClient, TreeSource};
pub use config::{CatalogConfig, ProviderConfig};
pub use error::{CatalogError, Result};
pub use flatten::{flatten, FlatItem, FlattenTarget};
pub use identity::TokenVerifier;
pub use reconcile::{reconcile, ShadowIndex};
pub use records::{FolderRecord, ResourceRecord, ShadowRecord, VisibleResourceItem};
pub use store::{JsonStore, ResourceStore};
pub use tree::{ExternalTreeNode, TreeMaterializer};
pub use url_parser::extract_folder_id;
