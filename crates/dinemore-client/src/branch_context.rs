//! Branch selection for the admin portal of a multi-branch restaurant.
//!
//! A [`BranchContext`] belongs to one signed-in restaurant session. It loads
//! the restaurant's branches, picks an initial selection (one branch or the
//! aggregate "all branches" view) and persists every explicit change under
//! [`StorageKey::BranchSelection`].
//!
//! Loads are split into [`BranchContext::begin_load`] and
//! [`BranchContext::complete_load`] so a fetch can run without holding the
//! context. Each load carries the epoch it started in; switching restaurant
//! starts a new epoch and any result from an older one is dropped.

use std::sync::Arc;

use dinemore_core::{Branch, StorageKey, ALL_BRANCHES_SENTINEL};

use crate::client::ApiClient;
use crate::error::{ClientError, StorageError};
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchPhase {
    /// Nothing loaded for the current restaurant yet.
    Uninitialized,
    /// First load of the epoch in flight.
    Loading,
    /// Selection resolved; later loads only refresh the list.
    Resolved,
    /// First load failed; another load may be started.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSelection {
    /// Aggregate view across every branch.
    AllBranches,
    Branch(String),
}

impl BranchSelection {
    fn from_persisted(raw: &str) -> Self {
        if raw == ALL_BRANCHES_SENTINEL {
            BranchSelection::AllBranches
        } else {
            BranchSelection::Branch(raw.to_string())
        }
    }

    fn persisted_value(&self) -> &str {
        match self {
            BranchSelection::AllBranches => ALL_BRANCHES_SENTINEL,
            BranchSelection::Branch(id) => id,
        }
    }
}

/// Handle for one branch-list fetch, tied to the epoch it started in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
    restaurant_id: String,
}

impl LoadTicket {
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn restaurant_id(&self) -> &str {
        &self.restaurant_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// First load of the epoch; the initial selection was resolved.
    Resolved,
    /// List refreshed; the selection was left alone.
    Refreshed,
    /// Restaurant has no branches yet; resolution waits for a later load.
    Empty,
    /// Fetch failed; see [`BranchContext::error`].
    Failed,
    /// Result belonged to an earlier restaurant and was dropped.
    Stale,
}

pub struct BranchContext {
    store: Arc<dyn KeyValueStore>,
    restaurant_id: Option<String>,
    epoch: u64,
    phase: BranchPhase,
    branches: Vec<Branch>,
    selection: Option<BranchSelection>,
    error: Option<String>,
}

impl BranchContext {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, restaurant_id: Option<&str>) -> Self {
        Self {
            store,
            restaurant_id: restaurant_id.map(str::to_string),
            epoch: 0,
            phase: BranchPhase::Uninitialized,
            branches: Vec::new(),
            selection: None,
            error: None,
        }
    }

    #[must_use]
    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant_id.as_deref()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn phase(&self) -> &BranchPhase {
        &self.phase
    }

    #[must_use]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == BranchPhase::Loading
    }

    /// Message of the most recent failed load, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn selection(&self) -> Option<&BranchSelection> {
        self.selection.as_ref()
    }

    /// Selected branch id; `None` in the aggregate view or before resolution.
    #[must_use]
    pub fn selected_branch_id(&self) -> Option<&str> {
        match &self.selection {
            Some(BranchSelection::Branch(id)) => Some(id),
            _ => None,
        }
    }

    /// Selected branch, if it is present in the current list.
    #[must_use]
    pub fn selected_branch(&self) -> Option<&Branch> {
        let id = self.selected_branch_id()?;
        self.branches.iter().find(|b| b.id == id)
    }

    /// A single-branch restaurant is never in the aggregate view.
    #[must_use]
    pub fn is_all_branches_view(&self) -> bool {
        self.selection == Some(BranchSelection::AllBranches) && self.branches.len() > 1
    }

    /// Switches to another restaurant (or none).
    ///
    /// A real change starts a new epoch: list, selection and error are cleared
    /// and results of loads started before the switch will be discarded.
    pub fn set_restaurant(&mut self, restaurant_id: Option<&str>) {
        if self.restaurant_id.as_deref() == restaurant_id {
            return;
        }
        tracing::debug!(
            from = ?self.restaurant_id,
            to = ?restaurant_id,
            "restaurant changed, resetting branch selection"
        );
        self.restaurant_id = restaurant_id.map(str::to_string);
        self.epoch += 1;
        self.phase = BranchPhase::Uninitialized;
        self.branches.clear();
        self.selection = None;
        self.error = None;
    }

    /// Starts a branch-list fetch for the current restaurant.
    ///
    /// Returns `None` when there is no restaurant to load for.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        let restaurant_id = self.restaurant_id.clone()?;
        if matches!(self.phase, BranchPhase::Uninitialized | BranchPhase::Failed) {
            self.phase = BranchPhase::Loading;
        }
        Some(LoadTicket {
            epoch: self.epoch,
            restaurant_id,
        })
    }

    /// Applies the result of the fetch started by `ticket`.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Branch>, ClientError>,
    ) -> LoadOutcome {
        if ticket.epoch != self.epoch
            || self.restaurant_id.as_deref() != Some(ticket.restaurant_id.as_str())
        {
            tracing::debug!(
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch,
                restaurant_id = %ticket.restaurant_id,
                "discarding branch list from an earlier restaurant"
            );
            return LoadOutcome::Stale;
        }

        let branches = match result {
            Ok(branches) => branches,
            Err(e) => {
                tracing::warn!(restaurant_id = %ticket.restaurant_id, error = %e, "branch list fetch failed");
                self.error = Some(e.to_string());
                if self.phase != BranchPhase::Resolved {
                    self.phase = BranchPhase::Failed;
                }
                return LoadOutcome::Failed;
            }
        };

        self.error = None;
        self.branches = branches;

        if self.phase == BranchPhase::Resolved {
            return LoadOutcome::Refreshed;
        }
        if self.branches.is_empty() {
            self.phase = BranchPhase::Uninitialized;
            return LoadOutcome::Empty;
        }

        self.selection = Some(self.resolve_selection(&ticket.restaurant_id));
        self.phase = BranchPhase::Resolved;
        LoadOutcome::Resolved
    }

    /// Fetches the branch list through `api` and applies it.
    ///
    /// Fetch failures are recorded on the context and reported as
    /// [`LoadOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingRestaurant`] when no restaurant is set.
    pub async fn load(&mut self, api: &ApiClient) -> Result<LoadOutcome, ClientError> {
        let ticket = self.begin_load().ok_or(ClientError::MissingRestaurant)?;
        let result = api.branches(ticket.restaurant_id()).await;
        Ok(self.complete_load(ticket, result))
    }

    /// Selects a branch, or the aggregate view for `None`, and persists the
    /// choice for the current restaurant.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the choice cannot be persisted; the
    /// in-memory selection is updated regardless.
    pub fn set_selected_branch_id(&mut self, branch_id: Option<&str>) -> Result<(), StorageError> {
        let selection = branch_id.map_or(BranchSelection::AllBranches, |id| {
            BranchSelection::Branch(id.to_string())
        });
        let persisted = selection.persisted_value().to_string();
        self.selection = Some(selection);

        match &self.restaurant_id {
            Some(restaurant_id) => self
                .store
                .set(&StorageKey::branch_selection(restaurant_id).as_key(), &persisted),
            None => Ok(()),
        }
    }

    fn persisted_selection(&self, restaurant_id: &str) -> Option<BranchSelection> {
        let key = StorageKey::branch_selection(restaurant_id).as_key();
        match self.store.get(&key) {
            Ok(raw) => raw.as_deref().map(BranchSelection::from_persisted),
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted branch selection");
                None
            }
        }
    }

    /// Initial selection for a non-empty branch list.
    fn resolve_selection(&self, restaurant_id: &str) -> BranchSelection {
        let multi_branch = self.branches.len() > 1;
        match self.persisted_selection(restaurant_id) {
            Some(BranchSelection::AllBranches) if multi_branch => {
                return BranchSelection::AllBranches;
            }
            Some(BranchSelection::Branch(id)) if self.branches.iter().any(|b| b.id == id) => {
                return BranchSelection::Branch(id);
            }
            _ => {}
        }

        if multi_branch {
            return BranchSelection::AllBranches;
        }
        let fallback = self
            .branches
            .iter()
            .find(|b| b.is_default)
            .or_else(|| self.branches.first());
        match fallback {
            Some(branch) => BranchSelection::Branch(branch.id.clone()),
            None => BranchSelection::AllBranches,
        }
    }
}
