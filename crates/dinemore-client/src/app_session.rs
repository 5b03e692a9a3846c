//! Explicitly passed application state for one client profile.
//!
//! [`AppSession`] owns the query cache (and through it the API client and
//! session store) and, while a restaurant admin is signed in, the
//! [`BranchContext`]. Callers hand `&AppSession` / `&mut AppSession` down to
//! whatever needs them instead of reaching for globals.

use std::sync::Arc;

use dinemore_core::{AppConfig, User};

use crate::branch_context::BranchContext;
use crate::client::ApiClient;
use crate::error::ClientError;
use crate::query::QueryClient;
use crate::session::SessionStore;
use crate::storage::FileStore;

pub struct AppSession {
    query: QueryClient,
    branch: Option<BranchContext>,
}

impl AppSession {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            query: QueryClient::new(api),
            branch: None,
        }
    }

    /// Opens the file-backed profile at `config.storage_path` and builds the
    /// client on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the profile file cannot be read, or
    /// the construction errors of [`ApiClient::new`].
    pub fn open(config: &AppConfig) -> Result<Self, ClientError> {
        let store = FileStore::open(&config.storage_path)?;
        let session = SessionStore::new(Arc::new(store));
        let api = ApiClient::new(config, session)?;
        Ok(Self::new(api))
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        self.query.api()
    }

    #[must_use]
    pub fn query(&self) -> &QueryClient {
        &self.query
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        self.api().session()
    }

    /// Admin sign-in; on success the branch context is scoped to the
    /// account's restaurant.
    ///
    /// # Errors
    ///
    /// The errors of [`ApiClient::sign_in_admin`].
    pub async fn login_admin(&mut self, email: &str, password: &str) -> Result<User, ClientError> {
        let user = self.api().sign_in_admin(email, password).await?;
        self.query.clear();
        self.branch = None;
        self.enter_restaurant(user.restaurant_id.as_deref())?;
        Ok(user)
    }

    /// Points the branch context at `restaurant_id`, creating it on first use.
    ///
    /// Switching to a different restaurant resets the selection.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] when no identity is stored, and
    /// [`ClientError::RoleMismatch`] when the stored identity is not an admin.
    pub fn enter_restaurant(
        &mut self,
        restaurant_id: Option<&str>,
    ) -> Result<&mut BranchContext, ClientError> {
        let auth = self
            .session()
            .get_stored_auth()
            .ok_or(ClientError::NotAuthenticated)?;
        if !auth.role().is_admin() {
            return Err(ClientError::RoleMismatch {
                user_type: auth.user_type,
            });
        }

        let store = self.session().store();
        let ctx = self
            .branch
            .get_or_insert_with(|| BranchContext::new(store, restaurant_id));
        ctx.set_restaurant(restaurant_id);
        Ok(ctx)
    }

    /// # Errors
    ///
    /// [`ClientError::NoBranchContext`] outside a restaurant admin session.
    pub fn branch_context(&self) -> Result<&BranchContext, ClientError> {
        self.branch.as_ref().ok_or(ClientError::NoBranchContext)
    }

    /// # Errors
    ///
    /// [`ClientError::NoBranchContext`] outside a restaurant admin session.
    pub fn branch_context_mut(&mut self) -> Result<&mut BranchContext, ClientError> {
        self.branch.as_mut().ok_or(ClientError::NoBranchContext)
    }

    /// Signs out: forgets the stored identity, cached queries and the branch
    /// context. Persisted branch selections are kept for the next sign-in.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the identity cannot be removed.
    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.session().clear_stored_auth()?;
        self.query.clear();
        self.branch = None;
        tracing::info!("signed out");
        Ok(())
    }
}
