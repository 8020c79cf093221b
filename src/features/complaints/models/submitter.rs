use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Complaint;
use crate::features::profiles::models::ProfileSummary;

/// Submitter profile as far as the last lookup could tell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitter {
    /// Fetched together with the complaint
    Known(ProfileSummary),
    /// A refresh failed; this is the profile from an earlier lookup
    Stale(ProfileSummary),
    /// No lookup has succeeded
    Unknown,
}

/// Wire form of [`Submitter`] without the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmitterStatus {
    Known,
    Stale,
    Unknown,
}

impl Submitter {
    pub fn profile(&self) -> Option<&ProfileSummary> {
        match self {
            Submitter::Known(profile) | Submitter::Stale(profile) => Some(profile),
            Submitter::Unknown => None,
        }
    }

    pub fn status(&self) -> SubmitterStatus {
        match self {
            Submitter::Known(_) => SubmitterStatus::Known,
            Submitter::Stale(_) => SubmitterStatus::Stale,
            Submitter::Unknown => SubmitterStatus::Unknown,
        }
    }

    /// What to show after a failed refresh, given what was shown before
    pub fn degrade(previous: Option<&Submitter>) -> Submitter {
        match previous.and_then(Submitter::profile) {
            Some(profile) => Submitter::Stale(profile.clone()),
            None => Submitter::Unknown,
        }
    }
}

/// One cached complaint; admin loads also carry the submitter
#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintEntry {
    pub complaint: Complaint,
    pub submitter: Option<Submitter>,
}

impl ComplaintEntry {
    pub fn plain(complaint: Complaint) -> Self {
        Self {
            complaint,
            submitter: None,
        }
    }

    pub fn with_submitter(complaint: Complaint, submitter: Submitter) -> Self {
        Self {
            complaint,
            submitter: Some(submitter),
        }
    }
}
