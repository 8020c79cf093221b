use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::{DateTime, Utc};
use fake::faker::internet::en::Username;
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::features::auth::model::AuthenticatedUser;
use crate::features::complaints::services::{
    AdminComplaintService, ComplaintService, ImageUploadService,
};
use crate::features::profiles::ProfileService;
use crate::modules::gateway::InMemoryGateway;
use crate::shared::constants::{
    COMPLAINTS_TABLE, COMPLAINT_BUCKET, ROLE_ADMIN, SIGNED_URL_TTL_SECS,
};

pub fn create_test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        email: Some("student@campus.test".to_string()),
        roles: vec![],
    }
}

pub fn create_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        email: Some("counselor@campus.test".to_string()),
        roles: vec![ROLE_ADMIN.to_string()],
    }
}

/// Inject `user` into every request, standing in for the token middleware
pub fn with_auth(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                let response: Response = next.run(request).await;
                response
            }
        },
    ))
}

/// Memory gateway with the column defaults of the `complaints` table
pub fn complaint_gateway() -> Arc<InMemoryGateway> {
    Arc::new(
        InMemoryGateway::new()
            .with_column_default(COMPLAINTS_TABLE, "status", json!("pending"))
            .with_column_default(COMPLAINTS_TABLE, "priority", json!("medium"))
            .with_column_default(COMPLAINTS_TABLE, "category", json!("general")),
    )
}

pub fn image_service(gateway: &Arc<InMemoryGateway>) -> Arc<ImageUploadService> {
    Arc::new(ImageUploadService::new(
        gateway.clone(),
        COMPLAINT_BUCKET.to_string(),
        SIGNED_URL_TTL_SECS,
    ))
}

pub fn complaint_service(gateway: &Arc<InMemoryGateway>) -> ComplaintService {
    ComplaintService::new(gateway.clone(), image_service(gateway))
}

pub fn admin_service(gateway: &Arc<InMemoryGateway>) -> AdminComplaintService {
    AdminComplaintService::new(
        Arc::new(complaint_service(gateway)),
        Arc::new(ProfileService::new(gateway.clone())),
    )
}

/// Complaint row as the gateway stores it, with generated text
pub fn complaint_row(user_id: Uuid, title: &str, created_at: DateTime<Utc>) -> Value {
    let description: String = Paragraph(2..4).fake();
    json!({
        "id": Uuid::new_v4().to_string(),
        "user_id": user_id.to_string(),
        "title": title,
        "description": description,
        "category": "general",
        "priority": "medium",
        "status": "pending",
        "image_url": null,
        "created_at": created_at.to_rfc3339(),
    })
}

/// Complaint row with a random title
pub fn random_complaint_row(user_id: Uuid, created_at: DateTime<Utc>) -> Value {
    let title: String = Sentence(3..6).fake();
    complaint_row(user_id, &title, created_at)
}

pub fn profile_row(user_id: Uuid, username: &str) -> Value {
    let full_name: String = Name().fake();
    json!({
        "id": user_id.to_string(),
        "username": username,
        "avatar_url": null,
        "full_name": full_name,
    })
}

pub fn random_profile_row(user_id: Uuid) -> Value {
    let username: String = Username().fake();
    profile_row(user_id, &username)
}
