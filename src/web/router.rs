//! Router configuration for Web API.

use axum::{
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::dto::HealthResponse;
use super::handlers::{
    complete_upload, create_folder, delete_file, delete_folder, download_file, get_folder_tree,
    list_folder_files, request_upload, update_file, update_folder, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let folder_routes = Router::new()
        .route("/tree", get(get_folder_tree))
        .route("/:folder_id", patch(update_folder).delete(delete_folder))
        .route("/:folder_id/files", get(list_folder_files))
        .route("/:folder_id/files/upload", post(request_upload));

    let file_routes = Router::new()
        .route("/:file_id", patch(update_file).delete(delete_file))
        .route("/:file_id/complete", post(complete_upload))
        .route("/:file_id/download", get(download_file));

    let project_routes = Router::new()
        .route("/folders", post(create_folder))
        .nest("/folders", folder_routes)
        .nest("/files", file_routes);

    let api_routes = Router::new().nest("/projects/:project_id", project_routes);

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
