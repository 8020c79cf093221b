use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch},
    Router,
};

use crate::features::complaints::handlers;
use crate::features::complaints::services::{AdminComplaintService, ComplaintService};
use crate::shared::constants::MAX_IMAGE_SIZE;

/// Create routes for the complaints feature
///
/// All routes expect an authenticated user; the `/api/admin` ones additionally
/// require the admin role.
pub fn routes(
    complaint_service: Arc<ComplaintService>,
    admin_service: Arc<AdminComplaintService>,
) -> Router {
    let user_routes = Router::new()
        .route(
            "/api/complaints",
            get(handlers::list_my_complaints)
                .post(handlers::create_complaint)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + 1024 * 1024)),
        )
        .route("/api/complaints/{id}", delete(handlers::delete_my_complaint))
        .with_state(complaint_service);

    let admin_routes = Router::new()
        .route("/api/admin/complaints", get(handlers::list_all_complaints))
        .route(
            "/api/admin/complaints/{id}",
            patch(handlers::update_complaint).delete(handlers::delete_complaint),
        )
        .with_state(admin_service);

    user_routes.merge(admin_routes)
}
