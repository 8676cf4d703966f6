//! Client configuration: where the backend lives, how long a call may take and
//! which authentication endpoints to use. Values are not secret.

use crate::{
    APP_USER_AGENT,
    error::{Error, Result},
};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const LOGIN_ENDPOINT: &str = "api/login/";
pub const REGISTER_ENDPOINT: &str = "api/register/";
pub const REFRESH_ENDPOINT: &str = "api/token/refresh/";
pub const LOGOUT_ENDPOINT: &str = "api/logout/";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
    pub login_endpoint: String,
    pub register_endpoint: String,
    pub refresh_endpoint: String,
    pub logout_endpoint: String,
    /// Screen the client navigates to when the session cannot be recovered.
    pub login_location: String,
}

impl ClientConfig {
    /// # Errors
    /// Returns an error if `api_base_url` is not an absolute http(s) URL.
    pub fn new(api_base_url: &str) -> Result<Self> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            timeout: DEFAULT_TIMEOUT,
            user_agent: APP_USER_AGENT.to_string(),
            login_endpoint: LOGIN_ENDPOINT.to_string(),
            register_endpoint: REGISTER_ENDPOINT.to_string(),
            refresh_endpoint: REFRESH_ENDPOINT.to_string(),
            logout_endpoint: LOGOUT_ENDPOINT.to_string(),
            login_location: crate::router::paths::LOGIN.to_string(),
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL; leading slashes are ignored so every path
    /// stays under the base.
    /// # Errors
    /// Returns an error if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.api_base_url
            .join(path.trim().trim_start_matches('/'))
            .map_err(|err| Error::Config(format!("invalid endpoint {path}: {err}")))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Config("API base URL is not configured.".to_string()));
    }

    let mut url =
        Url::parse(raw).map_err(|err| Error::Config(format!("invalid API base URL: {err}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(Error::Config(format!(
                "invalid API base URL: unsupported scheme {scheme}"
            )));
        }
    }

    if url.host().is_none() {
        return Err(Error::Config(
            "invalid API base URL: no host specified".to_string(),
        ));
    }

    // Without the trailing slash `join` would replace the last segment.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
