use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::profiles::models::ProfileSummary;
use crate::modules::gateway::{decode_row, SelectQuery, TableGateway};
use crate::shared::constants::{PROFILES_TABLE, PROFILE_SUMMARY_COLUMNS};

/// Read-only access to the `profiles` table
pub struct ProfileService {
    gateway: Arc<dyn TableGateway>,
}

impl ProfileService {
    pub fn new(gateway: Arc<dyn TableGateway>) -> Self {
        Self { gateway }
    }

    /// Username, avatar and full name of one user
    pub async fn get_summary(&self, user_id: Uuid) -> Result<ProfileSummary> {
        let query = SelectQuery::from(PROFILES_TABLE)
            .columns(PROFILE_SUMMARY_COLUMNS)
            .eq("id", user_id);

        let row = self
            .gateway
            .select(query)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch profile {}: {:?}", user_id, e);
                AppError::from(e)
            })?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))?;

        Ok(decode_row(PROFILES_TABLE, row)?)
    }
}
