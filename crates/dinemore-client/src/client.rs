//! HTTP request helper for the DineMore API.
//!
//! Wraps `reqwest` so that every call carries the identity headers from the
//! [`SessionStore`], sends cookies, and turns any non-2xx response into
//! [`ClientError::Status`] with the `"<status>: <body>"` message the UI shows.
//! Requests are single-attempt: nothing here retries.

use std::time::Duration;

use dinemore_core::AppConfig;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;
use crate::session::SessionStore;

/// What a query does when the server answers 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedBehavior {
    /// Resolve to `None`, e.g. for "who am I" probes.
    ReturnNull,
    /// Fail like any other non-2xx status.
    Throw,
}

/// Cache key of a query, and the request it stands for.
///
/// The first segment is a root-relative route such as `/api/restaurants`;
/// every later segment is one path segment and is percent-encoded when the
/// URL is built. Query parameters are kept apart from the segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    segments: Vec<String>,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            params: Vec::new(),
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Human-readable form used in logs and error context; not encoded.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = self.segments.join("/");
        for (i, (name, value)) in self.params.iter().enumerate() {
            path.push(if i == 0 { '?' } else { '&' });
            path.push_str(name);
            path.push('=');
            path.push_str(value);
        }
        path
    }

    /// Whether `prefix`'s segments are the leading segments of this key.
    #[must_use]
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Client for the DineMore REST API.
///
/// Cheap to clone: the connection pool, cookie jar and session storage are
/// shared between clones.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: SessionStore,
}

impl ApiClient {
    /// Creates a client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidUrl`] if the base URL does not parse.
    pub fn new(config: &AppConfig, session: SessionStore) -> Result<Self, ClientError> {
        Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            &config.user_agent,
            session,
        )
    }

    /// Creates a client against an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        session: SessionStore,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;

        // A trailing slash makes relative joins append to the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends `method` to `path` with identity headers and an optional JSON body.
    ///
    /// The JSON content type is only set when `data` is present. Pass
    /// `None::<&()>` for body-less requests.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] for any non-2xx response, formatted as
    ///   `"<status>: <body>"` (status text when the body is empty).
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::InvalidUrl`] if `path` cannot be joined to the base URL.
    pub async fn api_request<T>(
        &self,
        method: Method,
        path: &str,
        data: Option<&T>,
    ) -> Result<Response, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.resolve(path)?;
        self.send(method, url, data).await
    }

    /// Fetches and decodes the JSON resource named by `key`.
    ///
    /// Returns `Ok(None)` only for a 401 under [`UnauthorizedBehavior::ReturnNull`].
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] for non-2xx responses (including 401 under
    ///   [`UnauthorizedBehavior::Throw`]).
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::Deserialize`] if the body does not match `T`.
    pub async fn query<T>(
        &self,
        key: &QueryKey,
        on401: UnauthorizedBehavior,
    ) -> Result<Option<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = self.query_url(key)?;
        let response = self.send_raw(Method::GET, url, None::<&()>).await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED
            && on401 == UnauthorizedBehavior::ReturnNull
        {
            tracing::debug!(key = %key, "query unauthorized, resolving to null");
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        decode(response, &key.path()).await.map(Some)
    }

    /// Joins a relative or root-relative path onto the base URL.
    pub(crate) fn resolve(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// URL a query key is fetched from: the route resolved against the base
    /// URL, then each remaining segment percent-encoded, then the parameters.
    pub(crate) fn query_url(&self, key: &QueryKey) -> Result<Url, ClientError> {
        let (route, rest) = match key.segments() {
            [route, rest @ ..] => (route.as_str(), rest),
            [] => ("", &[][..]),
        };
        let mut url = self.resolve(route)?;
        if !rest.is_empty() {
            url.path_segments_mut()
                .map_err(|()| ClientError::InvalidUrl {
                    url: self.base_url.to_string(),
                    reason: "base URL cannot have path segments".to_string(),
                })?
                .pop_if_empty()
                .extend(rest);
        }
        if !key.params().is_empty() {
            url.query_pairs_mut().extend_pairs(key.params());
        }
        Ok(url)
    }

    /// Sends a request and asserts a 2xx status.
    pub(crate) async fn send<T>(
        &self,
        method: Method,
        url: Url,
        data: Option<&T>,
    ) -> Result<Response, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let response = self.send_raw(method, url, data).await?;
        ensure_success(response).await
    }

    /// Sends a JSON body to `path` and decodes the JSON answer.
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.api_request(Method::POST, path, Some(body)).await?;
        decode(response, path).await
    }

    /// Fetches `url` and decodes the JSON answer.
    pub(crate) async fn get_json<T>(&self, url: Url) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let context = url.path().to_string();
        let response = self.send(Method::GET, url, None::<&()>).await?;
        decode(response, &context).await
    }

    async fn send_raw<T>(
        &self,
        method: Method,
        url: Url,
        data: Option<&T>,
    ) -> Result<Response, ClientError>
    where
        T: Serialize + ?Sized,
    {
        tracing::debug!(%method, %url, has_body = data.is_some(), "api request");
        let mut request = self.client.request(method, url);
        for (name, value) in self.session.get_auth_headers() {
            request = request.header(name, value);
        }
        if let Some(body) = data {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

/// Passes 2xx responses through; otherwise reads the body into
/// [`ClientError::Status`].
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        body
    };
    tracing::debug!(status = status.as_u16(), %message, "api request failed");
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T>(response: Response, context: &str) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}
