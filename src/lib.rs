pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::GatewayConfig;
use crate::services::file_service::FileService;
use crate::services::limiter::AdmissionLimiter;
use crate::services::storage::BlobStore;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::upload::upload_file,
        api::handlers::files::upload::update_file,
        api::handlers::files::download::get_download_link,
        api::handlers::files::list::list_files,
        api::handlers::files::archive::download_archive,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::files::UploadResponse,
            api::handlers::files::UpdateFileResponse,
            api::handlers::files::DownloadLinkResponse,
            api::handlers::files::ListFilesResponse,
            api::handlers::files::DownloadArchiveRequest,
            api::handlers::health::HealthResponse,
            models::FileRecord,
        )
    ),
    tags(
        (name = "files", description = "Blob transfer and listing endpoints"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn BlobStore>,
    pub file_service: Arc<FileService>,
    pub limiter: AdmissionLimiter,
    pub config: GatewayConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn BlobStore>, config: GatewayConfig) -> Self {
        let file_service = Arc::new(FileService::new(storage.clone(), config.presign_ttl));
        let limiter = AdmissionLimiter::new(
            config.file_ops_concurrency_limit,
            config.list_ops_concurrency_limit,
        );
        Self {
            storage,
            file_service,
            limiter,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/files",
            post(api::handlers::files::upload_file)
                .put(api::handlers::files::update_file)
                .get(api::handlers::files::list_files),
        )
        .route("/files/link", get(api::handlers::files::get_download_link))
        .route(
            "/files/archive",
            post(api::handlers::files::download_archive),
        )
        .route_layer(from_fn_with_state(
            state.limiter.clone(),
            api::middleware::admission::admission_middleware,
        ))
        .route("/health", get(api::handlers::health::health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(axum::extract::DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state)
}
