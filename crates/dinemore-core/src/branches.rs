use serde::{Deserialize, Serialize};

use crate::auth::opaque_id;

/// Operating location of a restaurant, as served by
/// `GET /api/restaurants/:id/branches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub restaurant_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
