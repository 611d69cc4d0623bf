//! File handlers for Web API.
//!
//! Bytes never flow through these handlers. Uploads and downloads go to the
//! blob gateway through signed URLs; without a blob store those routes
//! answer 501.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::library::SignedUrl;
use crate::web::dto::{
    ApiResponse, FileResponse, RequestUploadRequest, UpdateFileRequest, UploadTicketResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// PATCH /api/projects/:project_id/files/:file_id - Rename and/or move a file.
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, file_id)): Path<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<UpdateFileRequest>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let file = state
        .library()
        .update_file(&caller, project_id, file_id, &req.into())
        .await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// DELETE /api/projects/:project_id/files/:file_id - Soft-delete a file.
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, file_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let file = state
        .library()
        .delete_file(&caller, project_id, file_id)
        .await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// POST /api/projects/:project_id/folders/:folder_id/files/upload - Register an upload.
pub async fn request_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, folder_id)): Path<(i64, i64)>,
    ValidatedJson(req): ValidatedJson<RequestUploadRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UploadTicketResponse>>), ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let ticket = state
        .library()
        .request_upload(&caller, project_id, &req.into_upload(folder_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(ticket.into()))))
}

/// POST /api/projects/:project_id/files/:file_id/complete - Confirm an upload.
pub async fn complete_upload(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, file_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<FileResponse>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let file = state
        .library()
        .complete_upload(&caller, project_id, file_id)
        .await?;
    Ok(Json(ApiResponse::new(file.into())))
}

/// GET /api/projects/:project_id/files/:file_id/download - Signed download URL.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path((project_id, file_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<SignedUrl>>, ApiError> {
    let caller = auth.caller(&state.admin_roles);
    let url = state
        .library()
        .download_url(&caller, project_id, file_id)
        .await?;
    Ok(Json(ApiResponse::new(url)))
}
