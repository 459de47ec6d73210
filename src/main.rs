//! drive_catalog CLI - Manage drive mounts and serve the catalog API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use drive_catalog::api::{register, AppState};
use drive_catalog::identity::SessionClaims;
use drive_catalog::records::{
    ClassTag, CreateFolderRequest, CreateMountRequest, OverrideFields, ResourceType,
    ShadowRequest,
};
use drive_catalog::{
    Actor, Authenticator, Catalog, CatalogConfig, DriveTreeClient, ExternalTreeNode, JsonStore,
    ListQuery, ProviderConfig, Role, TokenVerifier, VisibleResourceItem,
};

/// Mirror Google Drive folders into the resource catalog.
#[derive(Parser)]
#[command(name = "drive_catalog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to service account JSON credentials file. When omitted the
    /// GOOGLE_CLIENT_EMAIL and GOOGLE_PRIVATE_KEY variables are used.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Catalog store file.
    #[arg(long, env = "CATALOG_STORE", default_value = "catalog.json")]
    store: PathBuf,

    /// Timeout for each Drive API call, in seconds.
    #[arg(long, env = "DRIVE_REQUEST_TIMEOUT_SECS", default_value_t = 15)]
    request_timeout_secs: u64,

    /// Timeout for expanding one mounted folder, in seconds.
    #[arg(long, env = "MOUNT_TIMEOUT_SECS", default_value_t = 30)]
    mount_timeout_secs: u64,

    /// Deepest folder nesting expanded under a mount.
    #[arg(long, env = "MAX_TREE_DEPTH", default_value_t = 16)]
    max_depth: usize,

    /// Most nodes expanded under a mount.
    #[arg(long, env = "MAX_TREE_NODES", default_value_t = 5000)]
    max_nodes: usize,

    /// Acting administrator for catalog commands.
    #[arg(long, env = "CATALOG_USER", default_value = "cli-admin")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the folder tree behind a Drive link.
    Tree {
        /// Folder URL or ID.
        folder: String,
    },

    /// List catalog resources.
    List {
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        resource_type: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// Only resources filed under this local folder.
        #[arg(long)]
        folder: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Mount a Drive folder into the catalog.
    Mount {
        /// Folder URL or ID.
        folder: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        class: ClassTag,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        /// Local folder to file the mount under.
        #[arg(long = "in")]
        local_folder: Option<String>,
    },

    /// List local folders one level at a time.
    Folders {
        /// Parent folder id; top level when omitted.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Create a local folder.
    Mkdir {
        name: String,
        #[arg(long)]
        class: ClassTag,
        #[arg(long)]
        parent: Option<String>,
    },

    /// Override how a drive file is presented.
    Override {
        /// Listing id of the drive file (ext-<id>).
        id: String,
        #[command(flatten)]
        fields: OverrideArgs,
    },

    /// Hide a drive file from listings.
    Hide {
        /// Listing id of the drive file (ext-<id>).
        id: String,
    },

    /// Issue a session token for the HTTP API, signed for the acting user.
    Token {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Student)]
        role: RoleArg,
        #[arg(long)]
        class: Option<ClassTag>,
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
    },

    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
        port: u16,
        /// Shared secret for session tokens.
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Student,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Student => Role::Student,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Args)]
struct OverrideArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    link: String,
    #[arg(long)]
    class: ClassTag,
    #[arg(long)]
    category: String,
    #[arg(long = "type")]
    resource_type: ResourceType,
}

impl From<OverrideArgs> for OverrideFields {
    fn from(args: OverrideArgs) -> Self {
        OverrideFields {
            title: args.title,
            link: args.link,
            class: args.class,
            category: args.category,
            resource_type: args.resource_type,
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to init logging filter")?;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Token {
        email,
        role,
        class,
        ttl_hours,
        jwt_secret,
    } = &cli.command
    {
        let claims = SessionClaims {
            user_id: cli.user.clone(),
            email: email.clone(),
            role: (*role).into(),
            class: class.clone(),
            exp: (Utc::now() + ChronoDuration::hours(*ttl_hours)).timestamp().max(0) as u64,
        };
        let token = TokenVerifier::new(jwt_secret)
            .issue(&claims)
            .context("Failed to sign session token")?;
        println!("{}", token);
        return Ok(());
    }

    let provider = match &cli.credentials {
        Some(path) => ProviderConfig::from_file(path)
            .with_context(|| format!("Failed to load credentials from {:?}", path))?,
        None => ProviderConfig::from_env().context("Failed to load credentials from environment")?,
    }
    .with_request_timeout(Duration::from_secs(cli.request_timeout_secs));

    let auth = Arc::new(Authenticator::new(&provider)?);
    debug!(client_email = auth.client_email(), "using service account");
    let client = DriveTreeClient::new(&provider, auth)?;
    let store = JsonStore::open(&cli.store)
        .await
        .with_context(|| format!("Failed to open catalog store {:?}", cli.store))?;

    let config = CatalogConfig {
        max_depth: cli.max_depth,
        max_nodes: cli.max_nodes,
        mount_timeout: Duration::from_secs(cli.mount_timeout_secs),
        ..CatalogConfig::default()
    };
    let catalog = Catalog::new(Arc::new(client), Arc::new(store), config);
    let actor = Actor::admin(cli.user.clone());

    match cli.command {
        Commands::Tree { folder } => {
            let tree = catalog
                .preview_tree(&folder)
                .await
                .with_context(|| format!("Failed to read folder: {}", folder))?;
            print_tree(&tree, 0);
        }

        Commands::List {
            class,
            category,
            resource_type,
            search,
            folder,
            page,
            page_size,
        } => {
            let query = ListQuery {
                page: Some(page),
                page_size,
                class,
                category,
                resource_type,
                search,
                folder_id: folder,
            };
            let request = query.parse(catalog.config())?;
            let page = catalog.list(&actor, &request).await?;

            if page.resources.is_empty() {
                println!("No resources found.");
            } else {
                println!("{:<44} {:<16} {:<8} {}", "ID", "TYPE", "CLASS", "TITLE");
                println!("{}", "-".repeat(100));
                for item in &page.resources {
                    print_item(item);
                }
            }
            println!(
                "Page {}/{} ({} resources)",
                page.current_page, page.total_pages, page.total_resources
            );
        }

        Commands::Mount {
            folder,
            title,
            class,
            category,
            description,
            local_folder,
        } => {
            let record = catalog
                .create_mount(
                    &actor,
                    CreateMountRequest {
                        title,
                        folder_link: folder.clone(),
                        class,
                        category,
                        description,
                        folder_id: local_folder,
                    },
                )
                .await
                .with_context(|| format!("Failed to mount folder: {}", folder))?;
            println!("Mounted {} as {}", folder, record.id);
        }

        Commands::Folders { parent } => {
            let folders = catalog.list_folders(&actor, parent.as_deref()).await?;
            if folders.is_empty() {
                println!("No folders found.");
            }
            for folder in &folders {
                println!("{:<38} {:<8} {}", folder.id, folder.class.as_str(), folder.name);
            }
        }

        Commands::Mkdir {
            name,
            class,
            parent,
        } => {
            let folder = catalog
                .create_folder(
                    &actor,
                    CreateFolderRequest {
                        name,
                        class,
                        parent_id: parent,
                    },
                )
                .await?;
            println!("Created folder {} ({})", folder.name, folder.id);
        }

        Commands::Override { id, fields } => {
            let request = ShadowRequest::override_item(&id, fields.into())?;
            let record = catalog.apply_shadow(&actor, request).await?;
            println!("Override recorded ({})", record.id);
        }

        Commands::Hide { id } => {
            let request = ShadowRequest::hide_item(&id)?;
            let record = catalog.apply_shadow(&actor, request).await?;
            println!("Hidden ({})", record.id);
        }

        // Issued above without touching Drive.
        Commands::Token { .. } => {}

        Commands::Serve {
            host,
            port,
            jwt_secret,
        } => {
            let state = web::Data::new(AppState {
                catalog,
                verifier: TokenVerifier::new(&jwt_secret),
            });

            info!(host = %host, port, "starting drive catalog API");
            HttpServer::new(move || {
                App::new()
                    .wrap(Logger::default())
                    .app_data(state.clone())
                    .configure(register)
            })
            .bind((host.as_str(), port))?
            .run()
            .await?;
        }
    }

    Ok(())
}

fn print_tree(node: &ExternalTreeNode, depth: usize) {
    let marker = if node.is_folder() { "+" } else { "-" };
    println!(
        "{}{} {}\t{}\t{}",
        "  ".repeat(depth),
        marker,
        node.name,
        node.id,
        node.mime_type
    );
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

fn print_item(item: &VisibleResourceItem) {
    let (resource_type, class) = match item {
        VisibleResourceItem::External(e) => (e.resource_type.as_str(), e.class.as_str()),
        VisibleResourceItem::Native(r) => (r.resource_type.as_str(), r.class.as_str()),
    };
    println!(
        "{:<44} {:<16} {:<8} {}",
        item.id(),
        resource_type,
        class,
        item.title()
    );
}
