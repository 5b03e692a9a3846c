use serde::{Deserialize, Deserializer, Serialize};

/// Role attached to an account by the server.
///
/// Unknown roles are kept verbatim so that a newer server never breaks
/// deserialization on an older client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserType {
    Diner,
    RestaurantAdmin,
    SuperAdmin,
    Other(String),
}

impl UserType {
    /// Whether this role may sign in to the restaurant admin portal.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, UserType::RestaurantAdmin | UserType::SuperAdmin)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            UserType::Diner => "diner",
            UserType::RestaurantAdmin => "restaurant_admin",
            UserType::SuperAdmin => "super_admin",
            UserType::Other(raw) => raw,
        }
    }
}

impl From<String> for UserType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "diner" => UserType::Diner,
            "restaurant_admin" => UserType::RestaurantAdmin,
            "super_admin" => UserType::SuperAdmin,
            _ => UserType::Other(raw),
        }
    }
}

impl From<&str> for UserType {
    fn from(raw: &str) -> Self {
        UserType::from(raw.to_string())
    }
}

impl From<UserType> for String {
    fn from(user_type: UserType) -> Self {
        user_type.as_str().to_string()
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity persisted in client-local storage under `dinemore_auth`.
///
/// The role is stored as the raw string the server sent; it is never
/// validated on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAuth {
    pub user_id: String,
    pub user_type: String,
}

impl StoredAuth {
    /// A stored identity with an empty field counts as no identity at all.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.user_type.trim().is_empty()
    }

    #[must_use]
    pub fn role(&self) -> UserType {
        UserType::from(self.user_type.as_str())
    }
}

/// Account returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub user_type: UserType,
    /// Restaurant the account administers; `None` for diners.
    #[serde(default, deserialize_with = "opaque_id_opt")]
    pub restaurant_id: Option<String>,
}

impl User {
    #[must_use]
    pub fn stored_auth(&self) -> StoredAuth {
        StoredAuth {
            user_id: self.id.clone(),
            user_type: self.user_type.as_str().to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Ids are opaque: the server may send them as strings or integers.
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn opaque_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}
