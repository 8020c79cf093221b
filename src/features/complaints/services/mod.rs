mod admin_complaint_service;
mod complaint_service;
mod image_upload_service;

pub use admin_complaint_service::AdminComplaintService;
pub use complaint_service::ComplaintService;
pub use image_upload_service::{
    object_path, validate_image, ImageUploadService, StoredObject, UrlResolution,
    IMAGE_TOO_LARGE_MESSAGE, NOT_AN_IMAGE_MESSAGE,
};
