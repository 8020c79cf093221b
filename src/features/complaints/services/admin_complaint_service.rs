use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::complaints::models::{ComplaintEntry, ComplaintPatch, Submitter};
use crate::features::complaints::services::ComplaintService;
use crate::features::profiles::ProfileService;

/// Admin view of complaints: every row, joined with its submitter's profile
pub struct AdminComplaintService {
    complaints: Arc<ComplaintService>,
    profiles: Arc<ProfileService>,
}

impl AdminComplaintService {
    pub fn new(complaints: Arc<ComplaintService>, profiles: Arc<ProfileService>) -> Self {
        Self {
            complaints,
            profiles,
        }
    }

    /// Profile lookup that never fails the caller
    async fn lookup_submitter(&self, user_id: Uuid, previous: Option<&Submitter>) -> Submitter {
        match self.profiles.get_summary(user_id).await {
            Ok(profile) => Submitter::Known(profile),
            Err(e) => {
                tracing::warn!("Profile lookup for submitter {} failed: {}", user_id, e);
                Submitter::degrade(previous)
            }
        }
    }

    /// All complaints, newest first, each with a concurrently fetched submitter
    pub async fn load_all_with_profiles(&self) -> Result<Vec<ComplaintEntry>> {
        let complaints = self.complaints.list_visible().await?;

        let submitters = join_all(
            complaints
                .iter()
                .map(|complaint| self.lookup_submitter(complaint.user_id, None)),
        )
        .await;

        let entries: Vec<ComplaintEntry> = complaints
            .into_iter()
            .zip(submitters)
            .map(|(complaint, submitter)| ComplaintEntry::with_submitter(complaint, submitter))
            .collect();

        let unknown = entries
            .iter()
            .filter(|e| matches!(e.submitter, Some(Submitter::Unknown)))
            .count();
        tracing::info!(
            "Loaded {} complaints ({} without submitter profile)",
            entries.len(),
            unknown
        );

        Ok(entries)
    }

    /// Apply `patch` and re-attach the submitter; `previous` is what the caller showed before
    pub async fn update(
        &self,
        id: Uuid,
        patch: &ComplaintPatch,
        previous: Option<&Submitter>,
    ) -> Result<ComplaintEntry> {
        let complaint = self.complaints.update(id, patch).await?;
        let submitter = self.lookup_submitter(complaint.user_id, previous).await;

        if let Some(status) = patch.status {
            tracing::info!("Complaint {} moved to '{}'", id, status);
        }
        Ok(ComplaintEntry::with_submitter(complaint, submitter))
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.complaints.delete_by_id(id).await?;
        tracing::info!("Complaint {} deleted by admin", id);
        Ok(())
    }
}
