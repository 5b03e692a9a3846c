//! Client-side core of the DineMore loyalty app: persisted session identity,
//! the authenticated request helper with its query cache, and the
//! branch-selection state of the admin portal.

pub mod app_session;
pub mod auth;
pub mod branch_context;
pub mod client;
pub mod error;
pub mod query;
pub mod restaurants;
pub mod session;
pub mod storage;

pub use app_session::AppSession;
pub use auth::{CheckTokenResponse, DinerLogin, RequestOtpResponse};
pub use branch_context::{BranchContext, BranchPhase, BranchSelection, LoadOutcome, LoadTicket};
pub use client::{ApiClient, QueryKey, UnauthorizedBehavior};
pub use error::{ClientError, StorageError};
pub use query::{QueryClient, QueryPolicy, RefetchTrigger};
pub use restaurants::{activity_logs_key, branches_key};
pub use session::{AuthHeaders, SessionStore, USER_ID_HEADER, USER_TYPE_HEADER};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
