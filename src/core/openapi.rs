use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::complaints::models::{
    ComplaintCategory, ComplaintPriority, ComplaintStatus, SubmitterStatus,
};
use crate::features::complaints::{dtos as complaints_dtos, handlers as complaints_handlers};
use crate::features::profiles::models::ProfileSummary;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Complaints
        complaints_handlers::list_my_complaints,
        complaints_handlers::create_complaint,
        complaints_handlers::delete_my_complaint,
        // Admin
        complaints_handlers::list_all_complaints,
        complaints_handlers::update_complaint,
        complaints_handlers::delete_complaint,
    ),
    components(
        schemas(
            // Shared
            Meta,
            ApiResponse<complaints_dtos::ComplaintResponseDto>,
            ApiResponse<Vec<complaints_dtos::ComplaintResponseDto>>,
            ApiResponse<complaints_dtos::AdminComplaintResponseDto>,
            ApiResponse<Vec<complaints_dtos::AdminComplaintResponseDto>>,
            // Complaints
            ComplaintCategory,
            ComplaintPriority,
            ComplaintStatus,
            SubmitterStatus,
            ProfileSummary,
            complaints_dtos::CreateComplaintForm,
            complaints_dtos::ComplaintResponseDto,
            complaints_dtos::AdminComplaintResponseDto,
            complaints_dtos::UpdateComplaintDto,
        )
    ),
    tags(
        (name = "complaints", description = "Submitting and managing your own complaints"),
        (name = "admin", description = "Complaint review for administrators"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Ruang Aman API",
        version = "0.1.0",
        description = "API documentation for the Ruang Aman complaint service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
