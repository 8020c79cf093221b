use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Regex for file extensions taken from user-supplied file names
    /// - Valid: "png", "JPG", "webp"
    /// - Invalid: "", "tar.gz", "p g", "verylongextension"
    pub static ref EXTENSION_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]{1,10}$").unwrap();
}

/// Rejects strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
