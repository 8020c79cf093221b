// =============================================================================
// TABLES
// =============================================================================

/// Complaint records
pub const COMPLAINTS_TABLE: &str = "complaints";

/// Public user profiles, keyed by auth user id
pub const PROFILES_TABLE: &str = "profiles";

/// Columns fetched when joining a submitter onto a complaint
pub const PROFILE_SUMMARY_COLUMNS: &str = "username,avatar_url,full_name";

// =============================================================================
// EVIDENCE IMAGES
// =============================================================================

/// Bucket holding complaint evidence images
pub const COMPLAINT_BUCKET: &str = "complaints-evidence";

/// Folder (below the user id) for complaint images
pub const COMPLAINT_IMAGE_FOLDER: &str = "complaint-images";

/// Maximum accepted image size (5MB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Validity of signed evidence URLs (1 hour)
pub const SIGNED_URL_TTL_SECS: u32 = 3600;

/// Length of the random suffix in object names
pub const OBJECT_SUFFIX_LEN: usize = 9;

// =============================================================================
// LIST VIEW
// =============================================================================

/// Collapsed descriptions show this many characters followed by "..."
pub const DESCRIPTION_PREVIEW_CHARS: usize = 120;

/// Shown in place of an evidence image that failed to load
pub const IMAGE_FALLBACK_TEXT: &str = "Image unavailable";

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Admin role - can list every complaint, change its status and delete it
pub const ROLE_ADMIN: &str = "admin";
