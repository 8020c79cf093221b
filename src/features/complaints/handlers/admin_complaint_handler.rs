use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::complaints::dtos::{AdminComplaintResponseDto, UpdateComplaintDto};
use crate::features::complaints::models::ComplaintPatch;
use crate::features::complaints::services::AdminComplaintService;
use crate::shared::types::{ApiResponse, Meta};

/// List every complaint with its submitter profile (admin only)
///
/// A failed profile lookup never fails the listing; that complaint is returned
/// with `user: null` and `submitter_status: "unknown"`.
#[utoipa::path(
    get,
    path = "/api/admin/complaints",
    responses(
        (status = 200, description = "All complaints, newest first", body = ApiResponse<Vec<AdminComplaintResponseDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_all_complaints(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<AdminComplaintService>>,
) -> Result<Json<ApiResponse<Vec<AdminComplaintResponseDto>>>> {
    let entries = service.load_all_with_profiles().await?;
    let total = entries.len() as i64;
    let items = entries
        .into_iter()
        .map(AdminComplaintResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::success(Some(items), None, Some(Meta { total }))))
}

/// Update a complaint, typically its status (admin only)
#[utoipa::path(
    patch,
    path = "/api/admin/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body = UpdateComplaintDto,
    responses(
        (status = 200, description = "Complaint updated", body = ApiResponse<AdminComplaintResponseDto>),
        (status = 400, description = "Validation error or empty update"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Complaint not found")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_complaint(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<AdminComplaintService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateComplaintDto>,
) -> Result<Json<ApiResponse<AdminComplaintResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let patch = ComplaintPatch::from(dto);
    let entry = service.update(id, &patch, None).await?;
    tracing::debug!("Admin {} updated complaint {}", admin.id, id);

    Ok(Json(ApiResponse::success(
        Some(entry.into()),
        Some("Complaint updated".to_string()),
        None,
    )))
}

/// Delete any complaint (admin only)
#[utoipa::path(
    delete,
    path = "/api/admin/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint deleted"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_complaint(
    RequireAdmin(_admin): RequireAdmin,
    State(service): State<Arc<AdminComplaintService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Complaint deleted".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::features::auth::model::AuthenticatedUser;
    use crate::features::complaints::routes::routes;
    use crate::modules::gateway::{Filter, GatewayOp, InMemoryGateway};
    use crate::shared::constants::{COMPLAINTS_TABLE, PROFILES_TABLE};
    use crate::shared::test_helpers::{
        admin_service, complaint_gateway, complaint_row, complaint_service, create_admin_user,
        create_test_user, profile_row, with_auth,
    };

    fn server(gateway: &Arc<InMemoryGateway>, user: AuthenticatedUser) -> TestServer {
        let app = routes(
            Arc::new(complaint_service(gateway)),
            Arc::new(admin_service(gateway)),
        );
        TestServer::new(with_auth(app, user)).unwrap()
    }

    fn seed_one(gateway: &InMemoryGateway) -> (Uuid, String) {
        let owner = Uuid::new_v4();
        let row = complaint_row(owner, "Lost ID card", Utc::now());
        let id = row["id"].as_str().unwrap().to_string();
        gateway.seed(COMPLAINTS_TABLE, vec![row]);
        (owner, id)
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let gateway = complaint_gateway();
        let server = server(&gateway, create_test_user());

        let response = server.get("/api/admin/complaints").await;

        response.assert_status(StatusCode::FORBIDDEN);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_joins_profiles_and_tolerates_missing_ones() {
        let gateway = complaint_gateway();
        let (known, unknown) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        gateway.seed(
            COMPLAINTS_TABLE,
            vec![
                complaint_row(known, "with profile", now),
                complaint_row(unknown, "without profile", now - Duration::minutes(1)),
            ],
        );
        gateway.seed(PROFILES_TABLE, vec![profile_row(known, "sari")]);
        let server = server(&gateway, create_admin_user());

        let response = server.get("/api/admin/complaints").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["user"]["username"], json!("sari"));
        assert_eq!(data[0]["submitter_status"], json!("known"));
        assert_eq!(data[1]["user"], json!(null));
        assert_eq!(data[1]["submitter_status"], json!("unknown"));
    }

    #[tokio::test]
    async fn test_patch_status() {
        let gateway = complaint_gateway();
        let (owner, id) = seed_one(&gateway);
        gateway.seed(PROFILES_TABLE, vec![profile_row(owner, "budi")]);
        let server = server(&gateway, create_admin_user());

        let response = server
            .patch(&format!("/api/admin/complaints/{}", id))
            .json(&json!({"status": "resolved"}))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], json!("resolved"));
        assert_eq!(body["data"]["user"]["username"], json!("budi"));
        assert_eq!(gateway.rows(COMPLAINTS_TABLE)[0]["status"], json!("resolved"));
    }

    #[tokio::test]
    async fn test_patch_rejects_unknown_status() {
        let gateway = complaint_gateway();
        let (_, id) = seed_one(&gateway);
        let server = server(&gateway, create_admin_user());

        let response = server
            .patch(&format!("/api/admin/complaints/{}", id))
            .json(&json!({"status": "archived"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(gateway.calls_of(GatewayOp::Update).is_empty());
    }

    #[tokio::test]
    async fn test_patch_rejects_whitespace_title() {
        let gateway = complaint_gateway();
        let (_, id) = seed_one(&gateway);
        let server = server(&gateway, create_admin_user());

        let response = server
            .patch(&format!("/api/admin/complaints/{}", id))
            .json(&json!({"title": "   "}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(gateway.calls_of(GatewayOp::Update).is_empty());
    }

    #[tokio::test]
    async fn test_patch_missing_complaint_is_not_found() {
        let gateway = complaint_gateway();
        let server = server(&gateway, create_admin_user());

        let response = server
            .patch(&format!("/api/admin/complaints/{}", Uuid::new_v4()))
            .json(&json!({"status": "reviewed"}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_delete_by_id() {
        let gateway = complaint_gateway();
        let (_, id) = seed_one(&gateway);
        let server = server(&gateway, create_admin_user());

        let response = server
            .delete(&format!("/api/admin/complaints/{}", id))
            .await;

        response.assert_status_ok();
        assert_eq!(
            gateway.calls_of(GatewayOp::Delete)[0].filters,
            vec![Filter::eq("id", &id)]
        );
        assert!(gateway.rows(COMPLAINTS_TABLE).is_empty());
    }
}
