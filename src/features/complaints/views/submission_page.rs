//! Complaint submission page.
//!
//! Phases: `Idle -> FormOpen -> Submitting { uploading } -> Success | FormOpen`.
//! Each transition is published on a watch channel. A successful submission bumps
//! the refresh key, which remounts and reloads the embedded list.

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use super::list_view::ComplaintListView;
use super::scope::{ScopeHandle, ViewScope};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::complaints::models::{Complaint, ComplaintDraft, ImageFile};
use crate::features::complaints::services::{validate_image, ComplaintService, ImageUploadService};
use crate::shared::constants::COMPLAINT_IMAGE_FOLDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Idle,
    FormOpen,
    /// `uploading` while the evidence image is being stored
    Submitting { uploading: bool },
    Success,
}

/// Result of [`ComplaintPage::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(Complaint),
    /// Validation failed before anything was sent
    Invalid(String),
    /// Upload or insert failed; the form is kept
    Failed(String),
    /// The page was torn down mid-flight
    Discarded,
    /// Submit is only accepted while the form is open
    Ignored,
}

/// Picked image plus its local preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSelection {
    pub file: ImageFile,
    /// Local object URL; never the uploaded URL
    pub preview_url: String,
}

pub struct ComplaintPage {
    user: AuthenticatedUser,
    complaints: Arc<ComplaintService>,
    images: Arc<ImageUploadService>,
    scope: ViewScope,
    phase: watch::Sender<PagePhase>,
    form: ComplaintDraft,
    image: Option<ImageSelection>,
    file_input_value: String,
    error: Option<String>,
    refresh_key: u64,
    list: Option<ComplaintListView>,
    list_key: u64,
}

impl ComplaintPage {
    /// The page is only reachable for a signed-in user
    pub fn new(
        user: Option<AuthenticatedUser>,
        complaints: Arc<ComplaintService>,
        images: Arc<ImageUploadService>,
    ) -> Result<Self> {
        let user = user.ok_or_else(|| {
            AppError::Unauthorized("Sign in to submit a complaint".to_string())
        })?;
        let (phase, _) = watch::channel(PagePhase::Idle);

        Ok(Self {
            user,
            complaints,
            images,
            scope: ViewScope::new(),
            phase,
            form: ComplaintDraft::default(),
            image: None,
            file_input_value: String::new(),
            error: None,
            refresh_key: 0,
            list: None,
            list_key: 0,
        })
    }

    pub fn phase(&self) -> PagePhase {
        *self.phase.borrow()
    }

    /// Receives every phase change from now on
    pub fn subscribe(&self) -> watch::Receiver<PagePhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: PagePhase) {
        self.phase.send_replace(phase);
    }

    pub fn scope_handle(&self) -> ScopeHandle {
        self.scope.handle()
    }

    pub fn form(&self) -> &ComplaintDraft {
        &self.form
    }

    /// Editable form, only while it is open
    pub fn form_mut(&mut self) -> Option<&mut ComplaintDraft> {
        match self.phase() {
            PagePhase::FormOpen => Some(&mut self.form),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&ImageSelection> {
        self.image.as_ref()
    }

    pub fn file_input_value(&self) -> &str {
        &self.file_input_value
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    /// Show or hide the form; its contents survive. Returns whether anything changed.
    pub fn toggle_form(&mut self) -> bool {
        match self.phase() {
            PagePhase::Idle => self.set_phase(PagePhase::FormOpen),
            PagePhase::FormOpen => self.set_phase(PagePhase::Idle),
            PagePhase::Submitting { .. } | PagePhase::Success => return false,
        }
        true
    }

    /// Attach an image; invalid files only produce an inline error
    pub fn select_image(&mut self, file: ImageFile) -> std::result::Result<(), String> {
        if self.phase() != PagePhase::FormOpen {
            return Err("The form is not open".to_string());
        }

        if let Err(e) = validate_image(&file) {
            let message = e.user_message();
            self.error = Some(message.clone());
            return Err(message);
        }

        self.file_input_value = file.name.clone();
        self.image = Some(ImageSelection {
            preview_url: format!("blob:preview/{}", Uuid::new_v4()),
            file,
        });
        self.error = None;
        Ok(())
    }

    /// Drop the attached image, its preview and the file input value
    pub fn remove_image(&mut self) {
        if self.phase() != PagePhase::FormOpen {
            return;
        }
        self.image = None;
        self.file_input_value.clear();
    }

    fn fail(&mut self, message: String) -> SubmitOutcome {
        self.error = Some(message.clone());
        self.set_phase(PagePhase::FormOpen);
        SubmitOutcome::Failed(message)
    }

    /// Validate, upload the image if any, then insert
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.phase() != PagePhase::FormOpen {
            return SubmitOutcome::Ignored;
        }

        if let Err(e) = self.form.validate() {
            let message = e.user_message();
            self.error = Some(message.clone());
            return SubmitOutcome::Invalid(message);
        }

        self.error = None;
        let image = self.image.as_ref().map(|selection| selection.file.clone());
        self.set_phase(PagePhase::Submitting {
            uploading: image.is_some(),
        });

        let image_url = match image {
            None => None,
            Some(file) => {
                let images = Arc::clone(&self.images);
                let user_id = self.user.id;
                let upload = async move {
                    let object = images
                        .upload(&file, COMPLAINT_IMAGE_FOLDER, user_id)
                        .await
                        .map_err(|e| AppError::ImageUpload(e.to_string()))?;
                    images.resolve_url(&object).await.into_url()
                };

                match self.scope.run(upload).await {
                    None => return SubmitOutcome::Discarded,
                    Some(Err(e)) => return self.fail(e.user_message()),
                    Some(Ok(url)) => Some(url),
                }
            }
        };
        self.set_phase(PagePhase::Submitting { uploading: false });

        let record = self.form.clone().into_record(self.user.id, image_url);
        match self.scope.run(self.complaints.insert(record)).await {
            None => SubmitOutcome::Discarded,
            Some(Err(e)) => self.fail(e.user_message()),
            Some(Ok(complaint)) => {
                self.refresh_key += 1;
                self.set_phase(PagePhase::Success);
                tracing::info!("Complaint {} submitted from page", complaint.id);
                SubmitOutcome::Submitted(complaint)
            }
        }
    }

    /// Leave the success screen with a blank form
    pub fn dismiss_success(&mut self) {
        if self.phase() != PagePhase::Success {
            return;
        }
        self.form = ComplaintDraft::default();
        self.image = None;
        self.file_input_value.clear();
        self.error = None;
        self.set_phase(PagePhase::Idle);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The embedded list, remounted and reloaded whenever the refresh key moved
    pub async fn list(&mut self) -> &mut ComplaintListView {
        let current = match self.list.take() {
            Some(list) if self.list_key == self.refresh_key => list,
            _ => {
                let mut list = ComplaintListView::new(Arc::clone(&self.complaints), self.user.id);
                list.load().await;
                self.list_key = self.refresh_key;
                list
            }
        };
        self.list.insert(current)
    }
}
