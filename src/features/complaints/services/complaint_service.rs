use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::complaints::models::{
    Complaint, ComplaintDraft, ComplaintPatch, ImageFile, NewComplaint,
};
use crate::features::complaints::services::ImageUploadService;
use crate::modules::gateway::{
    decode_row, decode_rows, Filter, GatewayError, SelectQuery, TableGateway,
};
use crate::shared::constants::COMPLAINTS_TABLE;

/// Complaint table operations shared by users and admins
pub struct ComplaintService {
    gateway: Arc<dyn TableGateway>,
    images: Arc<ImageUploadService>,
}

/// Newest first; ties keep their relative order
fn newest_first(mut complaints: Vec<Complaint>) -> Vec<Complaint> {
    complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    complaints
}

impl ComplaintService {
    pub fn new(gateway: Arc<dyn TableGateway>, images: Arc<ImageUploadService>) -> Self {
        Self { gateway, images }
    }

    async fn select(&self, query: SelectQuery) -> Result<Vec<Complaint>> {
        let rows = self.gateway.select(query).await.map_err(|e| {
            tracing::error!("Failed to fetch complaints: {:?}", e);
            AppError::from(e)
        })?;

        Ok(newest_first(decode_rows(COMPLAINTS_TABLE, rows)))
    }

    /// Complaints submitted by `user_id`, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Complaint>> {
        self.select(
            SelectQuery::from(COMPLAINTS_TABLE)
                .eq("user_id", user_id)
                .order_desc("created_at"),
        )
        .await
    }

    /// Every complaint the gateway lets this client see, newest first
    pub async fn list_visible(&self) -> Result<Vec<Complaint>> {
        self.select(SelectQuery::from(COMPLAINTS_TABLE).order_desc("created_at"))
            .await
    }

    pub async fn insert(&self, record: NewComplaint) -> Result<Complaint> {
        let payload = serde_json::to_value(&record).map_err(GatewayError::from)?;

        let row = self
            .gateway
            .insert(COMPLAINTS_TABLE, payload)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert complaint: {:?}", e);
                AppError::from(e)
            })?;

        let complaint: Complaint = decode_row(COMPLAINTS_TABLE, row)?;
        tracing::info!(
            "Complaint created: id={}, user={}, category={}",
            complaint.id,
            complaint.user_id,
            complaint.category
        );
        Ok(complaint)
    }

    /// Validate, upload the optional image, then insert.
    ///
    /// Nothing reaches the gateway when validation fails; the insert is skipped
    /// when the upload fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        draft: ComplaintDraft,
        image: Option<&ImageFile>,
    ) -> Result<Complaint> {
        draft.validate()?;

        let image_url = match image {
            Some(file) => Some(self.images.upload_evidence(file, user_id).await?),
            None => None,
        };

        self.insert(draft.into_record(user_id, image_url)).await
    }

    /// Apply `patch` to one complaint
    pub async fn update(&self, id: Uuid, patch: &ComplaintPatch) -> Result<Complaint> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let payload = serde_json::to_value(patch).map_err(GatewayError::from)?;
        let row = self
            .gateway
            .update(COMPLAINTS_TABLE, &[Filter::eq("id", id)], payload)
            .await
            .map_err(|e| match e {
                GatewayError::NotFound(_) => {
                    AppError::NotFound(format!("Complaint {} not found", id))
                }
                other => {
                    tracing::error!("Failed to update complaint {}: {:?}", id, other);
                    AppError::from(other)
                }
            })?;

        Ok(decode_row(COMPLAINTS_TABLE, row)?)
    }

    /// Delete one of `user_id`'s complaints while it is still open.
    ///
    /// The delete itself is a single call scoped to both ids. Closed complaints
    /// are refused because the service key bypasses the backend's row rules.
    pub async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let complaint = self
            .select(
                SelectQuery::from(COMPLAINTS_TABLE)
                    .eq("id", id)
                    .eq("user_id", user_id),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Complaint {} not found", id)))?;

        if complaint.status.is_final() {
            tracing::warn!(
                "User {} tried to delete {} complaint {}",
                user_id,
                complaint.status,
                id
            );
            return Err(AppError::Conflict(format!(
                "A {} complaint can no longer be deleted",
                complaint.status
            )));
        }

        self.delete(&[Filter::eq("id", id), Filter::eq("user_id", user_id)])
            .await
    }

    /// Delete by id alone; callers check authorization first
    pub async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        self.delete(&[Filter::eq("id", id)]).await
    }

    async fn delete(&self, filters: &[Filter]) -> Result<()> {
        self.gateway
            .delete(COMPLAINTS_TABLE, filters)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete complaint: {:?}", e);
                AppError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::complaints::models::{ComplaintCategory, ComplaintStatus};
    use crate::modules::gateway::{GatewayOp, InMemoryGateway};
    use crate::shared::constants::COMPLAINT_BUCKET;
    use crate::shared::test_helpers::{complaint_gateway, complaint_row, complaint_service};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn draft(title: &str, description: &str) -> ComplaintDraft {
        ComplaintDraft {
            title: title.to_string(),
            description: description.to_string(),
            category: ComplaintCategory::Facility,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_blank_draft_makes_no_calls() {
        let gateway = complaint_gateway();
        let service = complaint_service(&gateway);

        let err = service
            .create(Uuid::new_v4(), draft("", "Room 204"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_without_image_sends_null_url() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();

        let complaint = complaint_service(&gateway)
            .create(user, draft("Broken AC", "Lab 3 is too hot"), None)
            .await
            .unwrap();

        assert_eq!(complaint.user_id, user);
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert_eq!(complaint.image_url, None);

        let inserts = gateway.calls_of(GatewayOp::Insert);
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].payload.as_ref().unwrap()["image_url"], json!(null));
        assert!(gateway.calls_of(GatewayOp::Upload).is_empty());
    }

    #[tokio::test]
    async fn test_create_with_image_uploads_before_insert() {
        let gateway = complaint_gateway();
        let image = ImageFile::new("proof.png", "image/png", vec![1, 2, 3]);

        let complaint = complaint_service(&gateway)
            .create(Uuid::new_v4(), draft("Flooded hall", "Water everywhere"), Some(&image))
            .await
            .unwrap();

        let url = complaint.image_url.unwrap();
        assert!(url.starts_with(&format!("memory://{}/", COMPLAINT_BUCKET)));

        let ops: Vec<_> = gateway.calls().iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![GatewayOp::Upload, GatewayOp::SignUrl, GatewayOp::Insert]);
    }

    #[tokio::test]
    async fn test_upload_failure_skips_insert() {
        let gateway = complaint_gateway();
        gateway.fail(GatewayOp::Upload, COMPLAINT_BUCKET, "quota exceeded");
        let image = ImageFile::new("proof.png", "image/png", vec![1]);

        let err = complaint_service(&gateway)
            .create(Uuid::new_v4(), draft("Title", "Body"), Some(&image))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Failed to upload image: Storage error: quota exceeded");
        assert!(gateway.calls_of(GatewayOp::Insert).is_empty());
    }

    #[tokio::test]
    async fn test_list_for_user_is_newest_first() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let now = Utc::now();
        gateway.seed(
            COMPLAINTS_TABLE,
            vec![
                complaint_row(user, "T3", now - Duration::hours(2)),
                complaint_row(user, "T1", now),
                complaint_row(Uuid::new_v4(), "other user", now),
                complaint_row(user, "T2", now - Duration::hours(1)),
            ],
        );

        let titles: Vec<_> = complaint_service(&gateway)
            .list_for_user(user)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();

        assert_eq!(titles, vec!["T1", "T2", "T3"]);
    }

    #[tokio::test]
    async fn test_rows_with_unknown_status_are_dropped() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let mut bad = complaint_row(user, "bad", Utc::now());
        bad["status"] = json!("escalated");
        gateway.seed(COMPLAINTS_TABLE, vec![bad, complaint_row(user, "good", Utc::now())]);

        let complaints = complaint_service(&gateway).list_visible().await.unwrap();
        assert_eq!(complaints.len(), 1);
        assert_eq!(complaints[0].title, "good");
    }

    #[tokio::test]
    async fn test_delete_owned_is_one_scoped_call() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let row = complaint_row(user, "mine", Utc::now());
        let id = Uuid::parse_str(row["id"].as_str().unwrap()).unwrap();
        gateway.seed(COMPLAINTS_TABLE, vec![row, complaint_row(user, "keep", Utc::now())]);

        complaint_service(&gateway).delete_owned(id, user).await.unwrap();

        let deletes = gateway.calls_of(GatewayOp::Delete);
        assert_eq!(deletes.len(), 1);
        assert_eq!(
            deletes[0].filters,
            vec![Filter::eq("id", id), Filter::eq("user_id", user)]
        );
        assert_eq!(gateway.rows(COMPLAINTS_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_owned_ignores_other_users_rows() {
        let gateway = complaint_gateway();
        let owner = Uuid::new_v4();
        let row = complaint_row(owner, "theirs", Utc::now());
        let id = Uuid::parse_str(row["id"].as_str().unwrap()).unwrap();
        gateway.seed(COMPLAINTS_TABLE, vec![row]);

        let err = complaint_service(&gateway)
            .delete_owned(id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(gateway.calls_of(GatewayOp::Delete).is_empty());
        assert_eq!(gateway.rows(COMPLAINTS_TABLE).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_owned_refuses_closed_complaints() {
        let gateway = complaint_gateway();
        let user = Uuid::new_v4();
        let mut resolved = complaint_row(user, "done", Utc::now());
        resolved["status"] = json!("resolved");
        let mut rejected = complaint_row(user, "refused", Utc::now());
        rejected["status"] = json!("rejected");
        let ids: Vec<Uuid> = [&resolved, &rejected]
            .iter()
            .map(|row| Uuid::parse_str(row["id"].as_str().unwrap()).unwrap())
            .collect();
        gateway.seed(COMPLAINTS_TABLE, vec![resolved, rejected]);
        let service = complaint_service(&gateway);

        for id in ids {
            let err = service.delete_owned(id, user).await.unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));
        }

        assert!(gateway.calls_of(GatewayOp::Delete).is_empty());
        assert_eq!(gateway.rows(COMPLAINTS_TABLE).len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_complaint_is_not_found() {
        let gateway = Arc::new(InMemoryGateway::new());
        let err = complaint_service(&gateway)
            .update(Uuid::new_v4(), &ComplaintPatch::status(ComplaintStatus::Reviewed))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_patch_is_rejected() {
        let gateway = complaint_gateway();
        let err = complaint_service(&gateway)
            .update(Uuid::new_v4(), &ComplaintPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(gateway.calls().is_empty());
    }
}
