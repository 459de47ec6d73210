//! HTTP surface over the catalog.

use actix_web::http::{header, StatusCode};
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::catalog::{Actor, Catalog, ListQuery};
use crate::error::CatalogError;
use crate::identity::TokenVerifier;
use crate::records::{CreateFolderRequest, CreateMountRequest, OverrideFields, ShadowRequest};

pub struct AppState {
    pub catalog: Catalog,
    pub verifier: TokenVerifier,
}

impl AppState {
    fn actor(&self, req: &HttpRequest) -> Result<Actor, CatalogError> {
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        self.verifier.authenticate(header)
    }
}

impl ResponseError for CatalogError {
    fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::PermissionDenied(_) | CatalogError::Forbidden(_) => StatusCode::FORBIDDEN,
            CatalogError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            CatalogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CatalogError::TreeTooLarge(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CatalogError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CatalogError::ProviderUnavailable(_)
            | CatalogError::AuthenticationError(_)
            | CatalogError::TokenRefreshError(_) => StatusCode::BAD_GATEWAY,
            CatalogError::MissingEnvVar(_)
            | CatalogError::Io(_)
            | CatalogError::Json(_)
            | CatalogError::JwtError(_)
            | CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        HttpResponse::build(status).json(json!({
            "error": self.to_string()
        }))
    }
}

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        CatalogError::InvalidInput(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        CatalogError::InvalidInput(err.to_string()).into()
    }))
    .service(health)
    .service(
        web::scope("/api")
            .service(list_resources)
            .service(create_mount)
            .service(override_resource)
            .service(hide_resource)
            .service(list_folders)
            .service(create_folder)
            .service(drive_folder),
    );
}

#[get("/healthz")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "drive-catalog",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[get("/resources")]
async fn list_resources(
    req: HttpRequest,
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, CatalogError> {
    let actor = state.actor(&req)?;
    let request = query.into_inner().parse(state.catalog.config())?;
    let page = state.catalog.list(&actor, &request).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/mounts")]
async fn create_mount(
    req: HttpRequest,
    body: web::Json<CreateMountRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, CatalogError> {
    let actor = state.actor(&req)?;
    let record = state.catalog.create_mount(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(record))
}

#[put("/resources/{id}")]
async fn override_resource(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<OverrideFields>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, CatalogError> {
    let actor = state.actor(&req)?;
    let request = ShadowRequest::override_item(&path.into_inner(), body.into_inner())?;
    let record = state.catalog.apply_shadow(&actor, request).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[delete("/resources/{id}")]
async fn hide_resource(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, CatalogError> {
    let actor = state.actor(&req)?;
    let request = ShadowRequest::hide_item(&path.into_inner())?;
    let record = state.catalog.apply_shadow(&actor, request).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Resource hidden",
        "shadow": record
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderQuery {
    parent_id: Option<String>,
}

#[get("/folders")]
async fn list_folders(
    req: HttpRequest,
    query: web::Query<FolderQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, CatalogError> {
    let actor = state.actor(&req)?;
    let folders = state
        .catalog
        .list_folders(&actor, query.parent_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(folders))
}

#[post("/folders")]
async fn create_folder(
    req: HttpRequest,
    body: web::Json<CreateFolderRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, CatalogError> {
    let actor = state.actor(&req)?;
    let folder = state.catalog.create_folder(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(folder))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFolderRequest {
    folder_link: String,
}

#[post("/drive/folder")]
async fn drive_folder(
    req: HttpRequest,
    body: web::Json<DriveFolderRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, CatalogError> {
    state.actor(&req)?;
    let tree = state.catalog.preview_tree(&body.folder_link).await?;
    Ok(HttpResponse::Ok().json(tree))
}
