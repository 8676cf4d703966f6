//! Session client: the only sanctioned transport for protected calls.
//!
//! Outgoing requests carry the stored access token as a bearer credential. A 401
//! starts the refresh protocol, at most once per originating request:
//!
//! 1. Without a refresh token the session is over (step 4).
//! 2. The refresh token is exchanged over the bare [`AuthClient`] channel.
//! 3. On success the new access token is stored, written into a copy of the
//!    pending request, and that copy is sent exactly once. Its outcome, even a
//!    second 401, goes back to the caller.
//! 4. On failure the store is cleared, the [`Navigator`] is sent to the login
//!    screen and the caller receives the original 401.
//!
//! A refresh result is only written while the store still holds the refresh
//! token that was exchanged. If the session was cleared or replaced during the
//! exchange, the result is dropped, nothing is replayed and the caller receives
//! the original 401.
//!
//! Concurrent requests that hit a 401 each refresh independently; the service
//! treats redundant refreshes as harmless. When the service rotates refresh
//! tokens, the request whose refresh lands second sees a replaced session and
//! gets its 401 back while the session itself stays intact.

mod auth;
mod http;
mod types;

pub use auth::AuthClient;
pub use types::{AuthOutcome, Credentials, Refreshed, Registration};

use types::RefreshRequest;

use crate::{
    config::ClientConfig,
    error::{Error, Result},
    session::UserProfile,
    store::CredentialStore,
};
use reqwest::{
    Client, Method, StatusCode,
    header::{AUTHORIZATION, HeaderMap},
};
use secrecy::ExposeSecret;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::{Instrument, debug, info, info_span, warn};

/// Performs a full navigation, used when the session cannot be recovered.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// An outbound call, complete enough to be replayed after a refresh.
///
/// Values are never mutated by the client: the bearer credential and the retry
/// marker are applied to copies, so one request's attempt count cannot leak
/// into another.
#[derive(Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    headers: Vec<(String, String)>,
    attempt: u8,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            attempt: 0,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// # Errors
    /// Returns an error if `body` cannot be encoded as JSON.
    pub fn json_from<B: Serialize>(self, body: &B) -> Result<Self> {
        let body = serde_json::to_value(body)
            .map_err(|err| Error::Serialization(format!("Failed to encode request: {err}")))?;
        Ok(self.json(body))
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn attempt(&self) -> u8 {
        self.attempt
    }

    #[must_use]
    pub const fn is_retry(&self) -> bool {
        self.attempt > 0
    }

    /// Copy with any previous authorization header replaced by `token`.
    #[must_use]
    fn with_bearer(&self, token: &str) -> Self {
        let mut next = self.clone();
        next.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION.as_str()));
        next.headers
            .push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
        next
    }

    /// Copy marked as the one permitted retry.
    #[must_use]
    fn retry(&self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self.clone()
        }
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                    (name.as_str(), "[REDACTED]")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        formatter
            .debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_body", &self.body.is_some())
            .field("headers", &headers)
            .field("attempt", &self.attempt)
            .finish()
    }
}

/// A successful response, passed through as received.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// # Errors
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|err| Error::Parse(format!("Failed to decode response: {err}")))
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct SessionClient {
    http: Client,
    auth: AuthClient,
    store: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    config: Arc<ClientConfig>,
}

impl SessionClient {
    /// # Errors
    /// Returns an error if the HTTP clients cannot be built.
    pub fn new(
        config: ClientConfig,
        store: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        Ok(Self {
            http: http::client(&config)?,
            auth: AuthClient::with_shared_config(config.clone())?,
            store,
            navigator,
            config,
        })
    }

    /// Sends a protected call, refreshing the access token once on a 401.
    /// # Errors
    /// Returns [`Error::Http`] for failure statuses (including the original 401
    /// when the session could not be recovered), or transport errors.
    pub async fn request(&self, request: PendingRequest) -> Result<ApiResponse> {
        let authorized = match self.store.get().access_token {
            Some(token) => request.with_bearer(token.expose_secret()),
            None => request,
        };

        match self.dispatch(&authorized).await {
            Err(err) if err.is_unauthorized() && !authorized.is_retry() => {
                self.refresh_and_replay(&authorized, err).await
            }
            outcome => outcome,
        }
    }

    /// Sends a protected call and decodes a JSON body.
    /// # Errors
    /// See [`SessionClient::request`]; also fails if the body does not decode.
    pub async fn request_json<T: DeserializeOwned>(&self, request: PendingRequest) -> Result<T> {
        self.request(request).await?.json()
    }

    async fn refresh_and_replay(
        &self,
        request: &PendingRequest,
        original: Error,
    ) -> Result<ApiResponse> {
        let Some(refresh_token) = self.store.get().refresh_token else {
            warn!("access token rejected and no refresh token stored");
            self.end_session();
            return Err(original);
        };

        debug!(path = request.path(), "access token rejected, refreshing");

        let refreshed = match self.auth.refresh(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(err) => {
                warn!("token refresh failed: {err}");
                self.end_session();
                return Err(original);
            }
        };

        match self
            .store
            .set_if_refresh_matches(&refresh_token, refreshed.patch())
        {
            Ok(true) => {}
            Ok(false) => return Err(original),
            // The new token is still valid for this replay; the next 401 refreshes again.
            Err(err) => warn!("failed to store refreshed token: {err}"),
        }

        let replay = request
            .retry()
            .with_bearer(refreshed.access_token.expose_secret());

        self.dispatch(&replay).await
    }

    /// Clears the session and sends the visitor to the login screen.
    fn end_session(&self) {
        if let Err(err) = self.store.clear() {
            warn!("failed to clear session: {err}");
        }
        info!("session ended, navigating to {}", self.config.login_location);
        self.navigator.navigate(&self.config.login_location);
    }

    async fn dispatch(&self, request: &PendingRequest) -> Result<ApiResponse> {
        let url = self.config.endpoint(request.path())?;

        let span = info_span!(
            "gatehouse.request",
            http.method = %request.method(),
            url = %url,
            attempt = request.attempt()
        );

        let mut builder = self.http.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().instrument(span).await?;
        let status = response.status();

        if !status.is_success() {
            debug!(status = status.as_u16(), path = request.path(), "request failed");
            return Err(http::failure(response).await);
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    /// Logs in and stores the token pair and profile in one write.
    /// # Errors
    /// Returns an error if the service rejects the credentials or the store write fails.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile> {
        let outcome = self.auth.login(credentials).await?;
        self.store.set(outcome.patch())?;
        info!("logged in");
        Ok(outcome.user)
    }

    /// Registers and stores the new session in one write.
    /// # Errors
    /// Returns [`Error::Validation`] for per-field rejections, other errors as for login.
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile> {
        let outcome = self.auth.register(registration).await?;
        self.store.set(outcome.patch())?;
        info!("registered and logged in");
        Ok(outcome.user)
    }

    /// Revokes the refresh token on the service, then clears the local session
    /// whatever the service answered.
    /// # Errors
    /// Returns an error only if the local session cannot be cleared.
    pub async fn logout(&self) -> Result<()> {
        if let Some(refresh_token) = self.store.get().refresh_token {
            let request = PendingRequest::post(self.config.logout_endpoint.clone()).json_from(
                &RefreshRequest {
                    refresh: refresh_token.expose_secret(),
                },
            )?;

            match self.request(request).await {
                Ok(_) => debug!("refresh token revoked"),
                Err(err) => warn!("logout request failed: {err}"),
            }
        }

        self.store.clear()?;
        info!("logged out");
        Ok(())
    }
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionClient")
            .field("api_base_url", &self.config.api_base_url.as_str())
            .finish_non_exhaustive()
    }
}
