use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::complaints::models::{
    Complaint, ComplaintCategory, ComplaintEntry, ComplaintPatch, ComplaintPriority,
    ComplaintStatus, SubmitterStatus,
};
use crate::features::profiles::models::ProfileSummary;

/// Create complaint form for OpenAPI documentation.
/// The handler reads the multipart fields directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateComplaintForm {
    #[schema(example = "Broken lock in dorm B")]
    pub title: String,
    #[schema(example = "The main door lock has been broken since Monday")]
    pub description: String,
    /// general, technical, academic, facility, safety or other (default general)
    #[schema(example = "facility")]
    pub category: Option<String>,
    /// low, medium or high (default medium)
    #[schema(example = "medium")]
    pub priority: Option<String>,
    /// Optional evidence image, at most 5MB
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: Option<String>,
}

/// Complaint as returned to its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComplaintResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Complaint> for ComplaintResponseDto {
    fn from(complaint: Complaint) -> Self {
        Self {
            id: complaint.id,
            user_id: complaint.user_id,
            title: complaint.title,
            description: complaint.description,
            category: complaint.category,
            priority: complaint.priority,
            status: complaint.status,
            image_url: complaint.image_url,
            created_at: complaint.created_at,
        }
    }
}

/// Complaint with its submitter, as listed to admins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminComplaintResponseDto {
    #[serde(flatten)]
    pub complaint: ComplaintResponseDto,
    /// Submitter profile; `null` when it could not be loaded
    pub user: Option<ProfileSummary>,
    /// `known`, `stale` (kept from an earlier load) or `unknown`
    pub submitter_status: SubmitterStatus,
}

impl From<ComplaintEntry> for AdminComplaintResponseDto {
    fn from(entry: ComplaintEntry) -> Self {
        let (user, submitter_status) = match entry.submitter {
            Some(submitter) => (submitter.profile().cloned(), submitter.status()),
            None => (None, SubmitterStatus::Unknown),
        };

        Self {
            complaint: entry.complaint.into(),
            user,
            submitter_status,
        }
    }
}

/// Partial complaint update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateComplaintDto {
    #[validate(
        length(min = 1, max = 255, message = "Title must be 1-255 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Title cannot be blank")
    )]
    pub title: Option<String>,

    #[validate(
        length(min = 1, max = 10000, message = "Description must be 1-10000 characters"),
        custom(function = "crate::shared::validation::not_blank", message = "Description cannot be blank")
    )]
    pub description: Option<String>,

    pub category: Option<ComplaintCategory>,
    pub priority: Option<ComplaintPriority>,
    pub status: Option<ComplaintStatus>,
}

impl From<UpdateComplaintDto> for ComplaintPatch {
    fn from(dto: UpdateComplaintDto) -> Self {
        Self {
            title: dto.title,
            description: dto.description,
            category: dto.category,
            priority: dto.priority,
            status: dto.status,
            image_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::complaints::models::Submitter;
    use serde_json::json;

    fn complaint() -> Complaint {
        Complaint {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Wifi down".to_string(),
            description: "Whole east wing".to_string(),
            category: ComplaintCategory::Facility,
            priority: ComplaintPriority::High,
            status: ComplaintStatus::Reviewed,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_dto_flattens_complaint() {
        let profile = ProfileSummary {
            username: Some("dimas".to_string()),
            ..Default::default()
        };
        let entry = ComplaintEntry::with_submitter(complaint(), Submitter::Known(profile));

        let value = serde_json::to_value(AdminComplaintResponseDto::from(entry)).unwrap();

        assert_eq!(value["title"], json!("Wifi down"));
        assert_eq!(value["status"], json!("reviewed"));
        assert_eq!(value["user"]["username"], json!("dimas"));
        assert_eq!(value["submitter_status"], json!("known"));
    }

    #[test]
    fn test_unknown_submitter_serializes_null_user() {
        let entry = ComplaintEntry::with_submitter(complaint(), Submitter::Unknown);
        let dto = AdminComplaintResponseDto::from(entry);

        assert!(dto.user.is_none());
        assert_eq!(dto.submitter_status, SubmitterStatus::Unknown);
    }

    #[test]
    fn test_update_dto_rejects_blank_title() {
        let dto = UpdateComplaintDto {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateComplaintDto {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateComplaintDto {
            description: Some("\n\t ".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto: UpdateComplaintDto = serde_json::from_value(json!({"status": "resolved"})).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(
            ComplaintPatch::from(dto),
            ComplaintPatch::status(ComplaintStatus::Resolved)
        );
    }
}
