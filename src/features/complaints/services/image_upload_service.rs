use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::complaints::models::ImageFile;
use crate::modules::gateway::{GatewayError, ObjectStore};
use crate::shared::constants::{COMPLAINT_IMAGE_FOLDER, MAX_IMAGE_SIZE, OBJECT_SUFFIX_LEN};
use crate::shared::validation::EXTENSION_REGEX;

pub const NOT_AN_IMAGE_MESSAGE: &str = "Please select an image file";
pub const IMAGE_TOO_LARGE_MESSAGE: &str = "Image size must be less than 5MB";

/// Location of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
}

/// Outcome of turning a stored object into a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlResolution {
    /// Time-limited URL (preferred)
    Signed(String),
    /// Permanent URL, used when signing failed
    Public(String),
    /// Neither could be issued
    Failed(String),
}

impl UrlResolution {
    pub fn into_url(self) -> Result<String> {
        match self {
            UrlResolution::Signed(url) | UrlResolution::Public(url) => Ok(url),
            UrlResolution::Failed(reason) => Err(AppError::ImageUpload(reason)),
        }
    }
}

/// Rejects anything but `image/*` up to 5MB
pub fn validate_image(file: &ImageFile) -> Result<()> {
    if !file.content_type.starts_with("image/") {
        return Err(AppError::Validation(NOT_AN_IMAGE_MESSAGE.to_string()));
    }
    if file.size() > MAX_IMAGE_SIZE {
        return Err(AppError::Validation(IMAGE_TOO_LARGE_MESSAGE.to_string()));
    }
    Ok(())
}

fn extension_from_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/heic" => Some("heic"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

/// Extension of the file name, then of the content type, then `bin`
fn object_extension(file_name: &str, content_type: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| EXTENSION_REGEX.is_match(ext))
        .map(str::to_lowercase)
        .or_else(|| extension_from_content_type(content_type).map(str::to_string))
        .unwrap_or_else(|| "bin".to_string())
}

/// `{user_id}/{folder}/{millis}_{random}.{ext}`
pub fn object_path(user_id: Uuid, folder: &str, file_name: &str, content_type: &str) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(OBJECT_SUFFIX_LEN)
        .collect();

    format!(
        "{}/{}/{}_{}.{}",
        user_id,
        folder,
        Utc::now().timestamp_millis(),
        suffix,
        object_extension(file_name, content_type)
    )
}

/// Uploads images to one bucket and issues URLs for them
pub struct ImageUploadService {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    signed_url_ttl_secs: u32,
}

impl ImageUploadService {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, signed_url_ttl_secs: u32) -> Self {
        Self {
            store,
            bucket,
            signed_url_ttl_secs,
        }
    }

    /// Store one new object; never overwrites
    pub async fn upload(
        &self,
        file: &ImageFile,
        folder: &str,
        user_id: Uuid,
    ) -> std::result::Result<StoredObject, GatewayError> {
        let path = object_path(user_id, folder, &file.name, &file.content_type);

        let path = self
            .store
            .upload_object(&self.bucket, &path, file.data.clone(), &file.content_type)
            .await?;

        debug!("Stored image '{}' ({} bytes)", path, file.size());
        Ok(StoredObject {
            bucket: self.bucket.clone(),
            path,
        })
    }

    /// Signed URL first, public URL when signing fails
    pub async fn resolve_url(&self, object: &StoredObject) -> UrlResolution {
        match self
            .store
            .create_signed_url(&object.bucket, &object.path, self.signed_url_ttl_secs)
            .await
        {
            Ok(url) => return UrlResolution::Signed(url),
            Err(e) => warn!(
                "Signing '{}' failed, falling back to public URL: {}",
                object.path, e
            ),
        }

        match self.store.get_public_url(&object.bucket, &object.path) {
            Ok(url) => UrlResolution::Public(url),
            Err(e) => {
                tracing::error!("No URL could be issued for '{}': {:?}", object.path, e);
                UrlResolution::Failed(e.to_string())
            }
        }
    }

    /// Upload into `folder` and return the resolved URL
    pub async fn upload_image(&self, file: &ImageFile, folder: &str, user_id: Uuid) -> Result<String> {
        let object = self.upload(file, folder, user_id).await.map_err(|e| {
            tracing::error!("Failed to upload image: {:?}", e);
            AppError::ImageUpload(e.to_string())
        })?;

        self.resolve_url(&object).await.into_url()
    }

    /// Validate and upload a complaint evidence image
    pub async fn upload_evidence(&self, file: &ImageFile, user_id: Uuid) -> Result<String> {
        validate_image(file)?;
        self.upload_image(file, COMPLAINT_IMAGE_FOLDER, user_id).await
    }
}
