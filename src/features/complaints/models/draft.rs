use uuid::Uuid;

use super::{ComplaintCategory, ComplaintPriority, NewComplaint};
use crate::core::error::AppError;
use crate::shared::validation::not_blank;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Title and description are required";

/// Contents of the submission form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintDraft {
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
}

impl ComplaintDraft {
    /// Title and description must both have non-whitespace content
    pub fn validate(&self) -> Result<(), AppError> {
        if not_blank(&self.title).is_err() || not_blank(&self.description).is_err() {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        Ok(())
    }

    /// Insert record for `user_id`, with trimmed text
    pub fn into_record(self, user_id: Uuid, image_url: Option<String>) -> NewComplaint {
        NewComplaint {
            user_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category,
            priority: self.priority,
            image_url,
        }
    }
}

/// A file picked by the user, held in memory until upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}
