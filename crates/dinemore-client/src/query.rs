//! Query cache in front of [`ApiClient::query`].
//!
//! The policy is fixed for the whole process: cached data is never fresh, every
//! revalidation trigger refetches, and failed fetches are not retried. The
//! cache only remembers the last good value per key and collapses concurrent
//! fetches of one key into a single request.
//!
//! [`QueryClient::clear`] starts a new generation. Fetches started before it
//! are no longer joined by new callers and their results are never cached, so
//! data fetched under one identity cannot reach the next.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{ApiClient, QueryKey, UnauthorizedBehavior};
use crate::error::ClientError;

type SharedFetch = Shared<BoxFuture<'static, Result<Option<Value>, Arc<ClientError>>>>;

/// Events after which a view asks whether its data should be refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchTrigger {
    Mount,
    WindowFocus,
    Reconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// Age after which cached data counts as stale.
    pub stale_time: Duration,
    pub refetch_on_mount: bool,
    pub refetch_on_window_focus: bool,
    pub refetch_on_reconnect: bool,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            refetch_on_mount: true,
            refetch_on_window_focus: true,
            refetch_on_reconnect: true,
        }
    }
}

impl QueryPolicy {
    #[must_use]
    pub fn refetches_on(&self, trigger: RefetchTrigger) -> bool {
        match trigger {
            RefetchTrigger::Mount => self.refetch_on_mount,
            RefetchTrigger::WindowFocus => self.refetch_on_window_focus,
            RefetchTrigger::Reconnect => self.refetch_on_reconnect,
        }
    }
}

struct InFlight {
    generation: u64,
    requests: HashMap<QueryKey, SharedFetch>,
}

struct CacheEntry {
    data: Option<Value>,
    fetched_at: Instant,
}

pub struct QueryClient {
    api: ApiClient,
    policy: QueryPolicy,
    on401: UnauthorizedBehavior,
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    in_flight: Mutex<InFlight>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl QueryClient {
    /// Cache with the default policy; a 401 fails the query.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self::with_policy(api, QueryPolicy::default(), UnauthorizedBehavior::Throw)
    }

    #[must_use]
    pub fn with_policy(api: ApiClient, policy: QueryPolicy, on401: UnauthorizedBehavior) -> Self {
        Self {
            api,
            policy,
            on401,
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(InFlight {
                generation: 0,
                requests: HashMap::new(),
            }),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Fetches `key` from the network and caches the result.
    ///
    /// A caller that arrives while a fetch of the same key is in flight awaits
    /// that fetch instead of sending its own request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Shared`] wrapping the fetch error. The previous
    /// cached value is left untouched on failure.
    pub async fn fetch(&self, key: &QueryKey) -> Result<Option<Value>, ClientError> {
        let (generation, fetch) = {
            let mut in_flight = lock(&self.in_flight);
            let generation = in_flight.generation;
            let fetch = in_flight
                .requests
                .entry(key.clone())
                .or_insert_with(|| self.start_fetch(key))
                .clone();
            (generation, fetch)
        };

        let result = fetch.clone().await;

        {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.requests.get(key).is_some_and(|f| f.ptr_eq(&fetch)) {
                in_flight.requests.remove(key);
            }
        }

        let data = result.map_err(ClientError::Shared)?;

        // `clear` bumps the generation while holding `entries`; compare under it.
        let mut entries = lock(&self.entries);
        if lock(&self.in_flight).generation == generation {
            entries.insert(
                key.clone(),
                CacheEntry {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(key = %key, "dropping result fetched before the cache was cleared");
        }
        Ok(data)
    }

    /// [`QueryClient::fetch`] decoded into `T`.
    ///
    /// # Errors
    ///
    /// As [`QueryClient::fetch`], plus [`ClientError::Deserialize`] if the
    /// cached JSON does not match `T`.
    pub async fn fetch_as<T>(&self, key: &QueryKey) -> Result<Option<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let Some(value) = self.fetch(key).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ClientError::Deserialize {
                context: key.path(),
                source: e,
            })
    }

    /// Last successfully fetched value, without touching the network.
    #[must_use]
    pub fn cached(&self, key: &QueryKey) -> Option<Value> {
        lock(&self.entries).get(key).and_then(|e| e.data.clone())
    }

    /// Whether `key` has no cached value or one older than `stale_time`.
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        lock(&self.entries)
            .get(key)
            .is_none_or(|e| e.fetched_at.elapsed() >= self.policy.stale_time)
    }

    #[must_use]
    pub fn should_refetch(&self, key: &QueryKey, trigger: RefetchTrigger) -> bool {
        self.policy.refetches_on(trigger) && self.is_stale(key)
    }

    /// Refetches `key` if the policy asks for it on `trigger`, otherwise
    /// serves the cached value.
    ///
    /// # Errors
    ///
    /// As [`QueryClient::fetch`] when a refetch happens.
    pub async fn revalidate(
        &self,
        key: &QueryKey,
        trigger: RefetchTrigger,
    ) -> Result<Option<Value>, ClientError> {
        if self.should_refetch(key, trigger) {
            self.fetch(key).await
        } else {
            Ok(self.cached(key))
        }
    }

    /// Drops every cached entry whose key starts with `prefix`.
    pub fn invalidate(&self, prefix: &QueryKey) {
        lock(&self.entries).retain(|key, _| !key.starts_with(prefix));
    }

    /// Drops all cached data and forgets in-flight fetches, e.g. on logout.
    pub fn clear(&self) {
        let mut entries = lock(&self.entries);
        let mut in_flight = lock(&self.in_flight);
        in_flight.generation += 1;
        in_flight.requests.clear();
        entries.clear();
    }

    fn start_fetch(&self, key: &QueryKey) -> SharedFetch {
        let api = self.api.clone();
        let key = key.clone();
        let on401 = self.on401;
        async move { api.query::<Value>(&key, on401).await.map_err(Arc::new) }
            .boxed()
            .shared()
    }
}
