//! Persisted identity of the signed-in account.
//!
//! [`SessionStore`] reads and writes [`StoredAuth`] under
//! [`StorageKey::Auth`] and turns it into the identity headers every request
//! carries.

use std::collections::BTreeMap;
use std::sync::Arc;

use dinemore_core::{StorageKey, StoredAuth};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_TYPE_HEADER: &str = "X-User-Type";

/// Identity headers, empty when nobody is signed in.
pub type AuthHeaders = BTreeMap<&'static str, String>;

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Storage backend, shared with other per-profile state.
    #[must_use]
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Reads the persisted identity.
    ///
    /// Fails closed: a missing key, unparsable JSON, an identity with an
    /// empty field or an unreadable backend all yield `None`.
    #[must_use]
    pub fn get_stored_auth(&self) -> Option<StoredAuth> {
        let key = StorageKey::Auth.as_key();
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored auth");
                return None;
            }
        };
        match serde_json::from_str::<StoredAuth>(&raw) {
            Ok(auth) if auth.is_complete() => Some(auth),
            Ok(_) => {
                tracing::warn!("stored auth has an empty field, treating as signed out");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored auth is malformed, treating as signed out");
                None
            }
        }
    }

    /// Persists `user_id`/`user_type`, replacing any previous identity.
    ///
    /// The role is not checked here; the server decides what it allows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Rejected`] if either field is blank (the
    /// previous identity is kept), or [`StorageError`] if the backend cannot
    /// be written.
    pub fn set_stored_auth(&self, user_id: &str, user_type: &str) -> Result<(), StorageError> {
        let key = StorageKey::Auth.as_key();
        let auth = StoredAuth {
            user_id: user_id.to_string(),
            user_type: user_type.to_string(),
        };
        if !auth.is_complete() {
            return Err(StorageError::Rejected {
                key,
                reason: "user id and user type must both be non-empty".to_string(),
            });
        }
        let raw = serde_json::to_string(&auth)?;
        self.store.set(&key, &raw)
    }

    /// Forgets the persisted identity. Safe to call when signed out.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    pub fn clear_stored_auth(&self) -> Result<(), StorageError> {
        self.store.remove(&StorageKey::Auth.as_key())
    }

    #[must_use]
    pub fn get_auth_headers(&self) -> AuthHeaders {
        let mut headers = AuthHeaders::new();
        if let Some(auth) = self.get_stored_auth() {
            headers.insert(USER_ID_HEADER, auth.user_id);
            headers.insert(USER_TYPE_HEADER, auth.user_type);
        }
        headers
    }
}
