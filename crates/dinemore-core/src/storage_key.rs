//! Typed keys for client-local storage.
//!
//! Every persisted value goes through [`StorageKey`] so the per-restaurant
//! keys are built in exactly one place.

/// Persisted branch-selection value meaning "aggregate view".
pub const ALL_BRANCHES_SENTINEL: &str = "all";

const AUTH_KEY: &str = "dinemore_auth";
const BRANCH_SELECTION_PREFIX: &str = "dinemore_all_branches_view_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// `{userId, userType}` JSON of the logged-in account.
    Auth,
    /// Selected branch id or [`ALL_BRANCHES_SENTINEL`] for one restaurant.
    BranchSelection(String),
}

impl StorageKey {
    #[must_use]
    pub fn branch_selection(restaurant_id: &str) -> Self {
        StorageKey::BranchSelection(restaurant_id.to_string())
    }

    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            StorageKey::Auth => AUTH_KEY.to_string(),
            StorageKey::BranchSelection(restaurant_id) => {
                format!("{BRANCH_SELECTION_PREFIX}{restaurant_id}")
            }
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_key_is_fixed() {
        assert_eq!(StorageKey::Auth.as_key(), "dinemore_auth");
    }

    #[test]
    fn branch_selection_key_is_scoped_by_restaurant() {
        let a = StorageKey::branch_selection("r-1");
        let b = StorageKey::branch_selection("r-2");
        assert_eq!(a.as_key(), "dinemore_all_branches_view_r-1");
        assert_ne!(a.as_key(), b.as_key());
    }
}
