//! Folder handlers for Web API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::library::{Deleted, FolderNode};
use crate::web::dto::{
    ApiResponse, CreateFolderRequest, FileResponse, FolderResponse, ListFilesQuery,
    UpdateFolderRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/projects/:project_id/folders/tree - Nested folder tree.
pub async fn get_folder_tree(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(project_id): Path<i64>,
) -> Result<Json<ApiResponse<FolderNode>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let tree = state.library().list_tree(&caller, project_id).await?;
    Ok(Json(ApiResponse::new(tree)))
}

/// POST /api/projects/:project_id/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(project_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FolderResponse>>), ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let folder = state
        .library()
        .create_folder(&caller, project_id, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(folder.into()))))
}

/// PATCH /api/projects/:project_id/folders/:folder_id - Rename and/or move a folder.
pub async fn update_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, folder_id)): Path<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<UpdateFolderRequest>,
) -> Result<Json<ApiResponse<FolderResponse>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let folder = state
        .library()
        .update_folder(&caller, project_id, folder_id, &req.into())
        .await?;
    Ok(Json(ApiResponse::new(folder.into())))
}

/// DELETE /api/projects/:project_id/folders/:folder_id - Delete an empty folder.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, folder_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<Deleted>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let deleted = state
        .library()
        .delete_folder(&caller, project_id, folder_id)
        .await?;
    Ok(Json(ApiResponse::new(deleted)))
}

/// GET /api/projects/:project_id/folders/:folder_id/files - Files in a folder.
pub async fn list_folder_files(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, folder_id)): Path<(i64, i64)>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let files = state
        .library()
        .list_files(&caller, project_id, folder_id, &query.into())
        .await?;
    Ok(Json(ApiResponse::new(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}
