use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Complaint category; a missing value means `general`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintCategory {
    #[default]
    General,
    Technical,
    Academic,
    Facility,
    Safety,
    Other,
}

impl ComplaintCategory {
    pub const ALL: [ComplaintCategory; 6] = [
        ComplaintCategory::General,
        ComplaintCategory::Technical,
        ComplaintCategory::Academic,
        ComplaintCategory::Facility,
        ComplaintCategory::Safety,
        ComplaintCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ComplaintCategory::General => "General",
            ComplaintCategory::Technical => "Technical",
            ComplaintCategory::Academic => "Academic",
            ComplaintCategory::Facility => "Facility",
            ComplaintCategory::Safety => "Safety",
            ComplaintCategory::Other => "Other",
        }
    }
}

impl std::fmt::Display for ComplaintCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintCategory::General => write!(f, "general"),
            ComplaintCategory::Technical => write!(f, "technical"),
            ComplaintCategory::Academic => write!(f, "academic"),
            ComplaintCategory::Facility => write!(f, "facility"),
            ComplaintCategory::Safety => write!(f, "safety"),
            ComplaintCategory::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ComplaintCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(ComplaintCategory::General),
            "technical" => Ok(ComplaintCategory::Technical),
            "academic" => Ok(ComplaintCategory::Academic),
            "facility" => Ok(ComplaintCategory::Facility),
            "safety" => Ok(ComplaintCategory::Safety),
            "other" => Ok(ComplaintCategory::Other),
            other => Err(format!("Unknown category '{}'", other)),
        }
    }
}

/// Complaint priority; a missing value means `medium`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl ComplaintPriority {
    pub fn label(&self) -> &'static str {
        match self {
            ComplaintPriority::Low => "Low",
            ComplaintPriority::Medium => "Medium",
            ComplaintPriority::High => "High",
        }
    }
}

impl std::fmt::Display for ComplaintPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintPriority::Low => write!(f, "low"),
            ComplaintPriority::Medium => write!(f, "medium"),
            ComplaintPriority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for ComplaintPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(ComplaintPriority::Low),
            "medium" => Ok(ComplaintPriority::Medium),
            "high" => Ok(ComplaintPriority::High),
            other => Err(format!("Unknown priority '{}'", other)),
        }
    }
}

/// Review status; only the admin path moves a complaint out of `pending`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    #[default]
    Pending,
    Reviewed,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    /// Resolved and rejected complaints are closed to their submitter
    pub fn is_final(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::Reviewed => "Reviewed",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintStatus::Pending => write!(f, "pending"),
            ComplaintStatus::Reviewed => write!(f, "reviewed"),
            ComplaintStatus::Resolved => write!(f, "resolved"),
            ComplaintStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// `null` decodes like a missing column
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Row of the `complaints` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: ComplaintCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: ComplaintPriority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ComplaintStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Record sent on insert; the gateway assigns `id`, `status` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComplaint {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub priority: ComplaintPriority,
    /// Always sent, `null` when no image was attached
    pub image_url: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ComplaintCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<ComplaintPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplaintStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ComplaintPatch {
    pub fn status(status: ComplaintStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
