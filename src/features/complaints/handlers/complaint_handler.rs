use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::complaints::dtos::{ComplaintResponseDto, CreateComplaintForm};
use crate::features::complaints::models::{ComplaintDraft, ImageFile};
use crate::features::complaints::services::{ComplaintService, IMAGE_TOO_LARGE_MESSAGE};
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's complaints, newest first
#[utoipa::path(
    get,
    path = "/api/complaints",
    responses(
        (status = 200, description = "Complaints of the current user", body = ApiResponse<Vec<ComplaintResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "complaints"
)]
pub async fn list_my_complaints(
    user: AuthenticatedUser,
    State(service): State<Arc<ComplaintService>>,
) -> Result<Json<ApiResponse<Vec<ComplaintResponseDto>>>> {
    let complaints = service.list_for_user(user.id).await?;
    let total = complaints.len() as i64;
    let items = complaints.into_iter().map(ComplaintResponseDto::from).collect();

    Ok(Json(ApiResponse::success(Some(items), None, Some(Meta { total }))))
}

/// The body limit trips inside the multipart stream; report it like the image size check
fn multipart_error(e: MultipartError, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        debug!("Multipart body over the limit: {}", e);
        return AppError::Validation(IMAGE_TOO_LARGE_MESSAGE.to_string());
    }
    AppError::BadRequest(format!("Failed to read {}: {}", context, e))
}

async fn read_text(field: axum::extract::multipart::Field<'_>, name: &str) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| multipart_error(e, &format!("{} field", name)))
}

/// Submit a complaint
///
/// Accepts multipart/form-data with `title`, `description`, optional `category`
/// and `priority`, and an optional `image` attached as evidence.
#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body(
        content = CreateComplaintForm,
        content_type = "multipart/form-data",
        description = "Complaint form with an optional evidence image",
    ),
    responses(
        (status = 201, description = "Complaint submitted", body = ApiResponse<ComplaintResponseDto>),
        (status = 400, description = "Missing fields or invalid image"),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "Image upload failed")
    ),
    security(("bearer_auth" = [])),
    tag = "complaints"
)]
pub async fn create_complaint(
    user: AuthenticatedUser,
    State(service): State<Arc<ComplaintService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ComplaintResponseDto>>)> {
    let mut draft = ComplaintDraft::default();
    let mut image: Option<ImageFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "multipart data"))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => draft.title = read_text(field, "title").await?,
            "description" => draft.description = read_text(field, "description").await?,
            "category" => {
                let text = read_text(field, "category").await?;
                if !text.trim().is_empty() {
                    draft.category = text.parse().map_err(AppError::BadRequest)?;
                }
            }
            "priority" => {
                let text = read_text(field, "priority").await?;
                if !text.trim().is_empty() {
                    draft.priority = text.parse().map_err(AppError::BadRequest)?;
                }
            }
            "image" => {
                let name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "image data"))?;

                // Browsers send an empty part when no file was picked
                if !data.is_empty() {
                    image = Some(ImageFile::new(name, content_type, data.to_vec()));
                }
            }
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    let complaint = service.create(user.id, draft, image.as_ref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(complaint.into()),
            Some("Complaint submitted".to_string()),
            None,
        )),
    ))
}

/// Delete one of the caller's complaints
#[utoipa::path(
    delete,
    path = "/api/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint deleted"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No such complaint for this user"),
        (status = 409, description = "Complaint is resolved or rejected")
    ),
    security(("bearer_auth" = [])),
    tag = "complaints"
)]
pub async fn delete_my_complaint(
    user: AuthenticatedUser,
    State(service): State<Arc<ComplaintService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_owned(id, user.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Complaint deleted".to_string()),
        None,
    )))
}
