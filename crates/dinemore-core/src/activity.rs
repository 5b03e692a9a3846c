use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{opaque_id, opaque_id_opt};

/// One entry of `GET /api/restaurants/:id/activity-logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub action: String,
    /// JSON-encoded payload as stored by the server; see [`ActivityLog::details_json`].
    #[serde(default)]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<ActivityUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUser {
    #[serde(default, deserialize_with = "opaque_id_opt")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ActivityLog {
    /// Parses `details`; a missing or unparsable payload yields `None`.
    #[must_use]
    pub fn details_json(&self) -> Option<serde_json::Value> {
        self.details
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// Display name of the actor, if the server attached one.
    #[must_use]
    pub fn actor_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }
}
