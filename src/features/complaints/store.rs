//! Client-side complaint cache.
//!
//! Mirrors the list a screen is showing: loads replace it, `add` prepends,
//! `update` replaces an entry in place, `delete` removes it. Every failure is
//! kept in [`ComplaintStore::error`] as display text.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::complaints::models::{
    Complaint, ComplaintDraft, ComplaintEntry, ComplaintPatch, ImageFile,
};
use crate::features::complaints::services::{AdminComplaintService, ComplaintService};

pub struct ComplaintStore {
    complaints: Arc<ComplaintService>,
    admin: Arc<AdminComplaintService>,
    entries: Vec<ComplaintEntry>,
    loading: bool,
    error: Option<String>,
}

impl ComplaintStore {
    pub fn new(complaints: Arc<ComplaintService>, admin: Arc<AdminComplaintService>) -> Self {
        Self {
            complaints,
            admin,
            entries: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn entries(&self) -> &[ComplaintEntry] {
        &self.entries
    }

    pub fn complaints(&self) -> impl Iterator<Item = &Complaint> {
        self.entries.iter().map(|e| &e.complaint)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record the outcome of an operation in `error`
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => self.error = Some(e.user_message()),
        }
        result
    }

    /// Every complaint the gateway exposes to this client
    pub async fn load(&mut self) {
        self.loading = true;
        let result = self.complaints.list_visible().await;
        if let Ok(complaints) = self.settle(result) {
            self.entries = complaints.into_iter().map(ComplaintEntry::plain).collect();
        }
        self.loading = false;
    }

    /// Every complaint with its submitter profile
    pub async fn load_all(&mut self) {
        self.loading = true;
        let result = self.admin.load_all_with_profiles().await;
        if let Ok(entries) = self.settle(result) {
            self.entries = entries;
        }
        self.loading = false;
    }

    /// Upload the optional image, insert, and put the new complaint first
    pub async fn add(
        &mut self,
        user_id: Uuid,
        draft: ComplaintDraft,
        image: Option<&ImageFile>,
    ) -> Result<Complaint> {
        self.loading = true;
        let result = self.complaints.create(user_id, draft, image).await;
        let result = self.settle(result);
        if let Ok(complaint) = &result {
            self.entries
                .insert(0, ComplaintEntry::plain(complaint.clone()));
        }
        self.loading = false;
        result
    }

    /// Apply `patch` and replace the cached entry where it stands
    pub async fn update(&mut self, id: Uuid, patch: ComplaintPatch) -> Result<ComplaintEntry> {
        let previous = self
            .entries
            .iter()
            .find(|e| e.complaint.id == id)
            .and_then(|e| e.submitter.clone());

        let result = self.admin.update(id, &patch, previous.as_ref()).await;
        let result = self.settle(result);
        if let Ok(updated) = &result {
            match self.entries.iter_mut().find(|e| e.complaint.id == id) {
                Some(slot) => *slot = updated.clone(),
                None => tracing::debug!("Updated complaint {} is not cached", id),
            }
        }
        result
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<()> {
        let result = self.admin.delete(id).await;
        let result = self.settle(result);
        if result.is_ok() {
            self.entries.retain(|e| e.complaint.id != id);
        }
        result
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

impl std::fmt::Debug for ComplaintStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplaintStore")
            .field("entries", &self.entries.len())
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}
