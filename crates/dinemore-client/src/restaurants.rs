//! Restaurant-scoped endpoints for the DineMore API client.

use dinemore_core::{ActivityLog, Branch};

use crate::client::{ApiClient, QueryKey};
use crate::error::ClientError;

/// Query-cache key of a restaurant's branch list.
#[must_use]
pub fn branches_key(restaurant_id: &str) -> QueryKey {
    QueryKey::new(["/api/restaurants", restaurant_id, "branches"])
}

/// Query-cache key of a restaurant's activity log.
#[must_use]
pub fn activity_logs_key(restaurant_id: &str, limit: u32) -> QueryKey {
    QueryKey::new(["/api/restaurants", restaurant_id, "activity-logs"]).with_param("limit", limit)
}

impl ApiClient {
    /// `GET /api/restaurants/:id/branches`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] on a non-2xx response.
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::Deserialize`] if the body is not a branch list.
    pub async fn branches(&self, restaurant_id: &str) -> Result<Vec<Branch>, ClientError> {
        let url = self.query_url(&branches_key(restaurant_id))?;
        self.get_json(url).await
    }

    /// `GET /api/restaurants/:id/activity-logs?limit=N`, newest first as
    /// served.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] on a non-2xx response.
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::Deserialize`] if the body is not an activity list.
    pub async fn activity_logs(
        &self,
        restaurant_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityLog>, ClientError> {
        let url = self.query_url(&activity_logs_key(restaurant_id, limit))?;
        self.get_json(url).await
    }
}
