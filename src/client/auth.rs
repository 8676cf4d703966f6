//! Bare client for the authentication service. It never attaches the stored
//! access token and never refreshes, so the session client can call it from
//! inside its own 401 handling without recursing.

use super::{
    http,
    types::{
        AuthOutcome, AuthResponse, Credentials, RefreshRequest, RefreshResponse, Refreshed,
        Registration,
    },
};
use crate::{
    config::ClientConfig,
    error::{Error, FieldErrors, Result},
};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{Instrument, debug, info_span};

#[derive(Clone, Debug)]
pub struct AuthClient {
    http: Client,
    config: Arc<ClientConfig>,
}

impl AuthClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_shared_config(Arc::new(config))
    }

    pub(crate) fn with_shared_config(config: Arc<ClientConfig>) -> Result<Self> {
        Ok(Self {
            http: http::client(&config)?,
            config,
        })
    }

    /// Exchanges credentials for a token pair and the user's profile.
    /// # Errors
    /// Returns [`Error::Http`] when the service rejects the credentials.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthOutcome> {
        let response = self
            .send("gatehouse.login", &self.config.login_endpoint, credentials)
            .await?;
        let response: AuthResponse = decode(response).await?;

        debug!("login accepted");

        Ok(response.into())
    }

    /// Creates an account and returns the same shape as [`AuthClient::login`].
    /// # Errors
    /// Returns [`Error::Validation`] with per-field messages when the service
    /// answers 400 with a field map, [`Error::Http`] for other failures.
    pub async fn register(&self, registration: &Registration) -> Result<AuthOutcome> {
        let response = self
            .send(
                "gatehouse.register",
                &self.config.register_endpoint,
                registration,
            )
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(field_errors(&body).map_or_else(
                || http::http_error(StatusCode::BAD_REQUEST, &body),
                Error::Validation,
            ));
        }

        let response: AuthResponse = decode(response).await?;

        debug!("registration accepted");

        Ok(response.into())
    }

    /// Mints a new access token from a refresh token.
    /// # Errors
    /// Returns an error if the call fails or the service rejects the token.
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<Refreshed> {
        let request = RefreshRequest {
            refresh: refresh_token.expose_secret(),
        };
        let response = self
            .send("gatehouse.refresh", &self.config.refresh_endpoint, &request)
            .await?;
        let response: RefreshResponse = decode(response).await?;

        if response.access.trim().is_empty() {
            return Err(Error::Parse(
                "Refresh response did not include an access token".to_string(),
            ));
        }

        Ok(response.into())
    }

    async fn send<B>(&self, op: &'static str, endpoint: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.endpoint(endpoint)?;

        let span = info_span!(
            "gatehouse.auth",
            op,
            http.method = "POST",
            url = %url
        );

        Ok(self
            .http
            .post(url)
            .json(body)
            .send()
            .instrument(span)
            .await?)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(http::failure(response).await);
    }

    response
        .json::<T>()
        .await
        .map_err(|err| Error::Parse(format!("Failed to decode response: {err}")))
}

/// Reads a 400 body shaped as `field -> messages` (or `field -> message`).
fn field_errors(body: &str) -> Option<FieldErrors> {
    let Value::Object(object) = serde_json::from_str::<Value>(body).ok()? else {
        return None;
    };

    let mut fields = BTreeMap::new();
    for (field, value) in object {
        let messages = match value {
            Value::String(message) => vec![message],
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(message) => Some(message),
                    _ => None,
                })
                .collect(),
            _ => continue,
        };
        if !messages.is_empty() {
            fields.insert(field, messages);
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(FieldErrors(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn auth_client(server: &MockServer) -> Result<AuthClient> {
        Ok(AuthClient::new(ClientConfig::new(&server.uri())?)?)
    }

    fn registration() -> Registration {
        Registration {
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            password: SecretString::from("correct horse"),
            confirm_password: SecretString::from("correct horse"),
        }
    }

    #[test]
    fn field_errors_accepts_lists_and_strings() -> Result<()> {
        let fields = field_errors(
            r#"{"email": ["user with this email already exists."], "confirm_password": "Passwords do not match", "code": 4}"#,
        )
        .ok_or_else(|| anyhow!("expected field errors"))?;
        assert_eq!(
            fields.get("email"),
            Some(&["user with this email already exists.".to_string()][..])
        );
        assert_eq!(
            fields.get("confirm_password"),
            Some(&["Passwords do not match".to_string()][..])
        );
        assert!(fields.get("code").is_none());
        Ok(())
    }

    #[test]
    fn field_errors_rejects_non_objects() {
        assert!(field_errors("Bad Request").is_none());
        assert!(field_errors("[]").is_none());
        assert!(field_errors(r#"{"code": 4}"#).is_none());
    }

    #[tokio::test]
    async fn login_returns_tokens_and_profile() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/login/"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": "correct horse"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Login successful",
                "user": {"id": 1, "email": "ada@example.com", "username": "ada"},
                "tokens": {"refresh": "refresh-1", "access": "access-1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = auth_client(&server)?
            .login(&Credentials::new("ada@example.com", "correct horse"))
            .await?;

        assert_eq!(outcome.access_token.expose_secret(), "access-1");
        assert_eq!(outcome.refresh_token.expose_secret(), "refresh-1");
        assert_eq!(outcome.user.display_name(), Some("ada"));
        Ok(())
    }

    #[tokio::test]
    async fn login_rejection_surfaces_service_message() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/login/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let err = auth_client(&server)?
            .login(&Credentials::new("ada@example.com", "wrong"))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;

        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("Invalid credentials"));
        Ok(())
    }

    #[tokio::test]
    async fn register_maps_field_errors() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/register/"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "username": "ada",
                "password": "correct horse",
                "confirm_password": "correct horse"
            })))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "username": ["custom user with this username already exists."]
            })))
            .mount(&server)
            .await;

        let err = auth_client(&server)?
            .register(&registration())
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;

        let Error::Validation(fields) = err else {
            return Err(anyhow!("expected validation error, got {err}"));
        };
        assert_eq!(
            fields.get("username"),
            Some(&["custom user with this username already exists.".to_string()][..])
        );
        Ok(())
    }

    #[tokio::test]
    async fn register_returns_login_shape() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/register/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "User registered successfully",
                "user": {"id": 2, "email": "ada@example.com", "username": "ada"},
                "tokens": {"refresh": "refresh-2", "access": "access-2"}
            })))
            .mount(&server)
            .await;

        let outcome = auth_client(&server)?.register(&registration()).await?;
        assert_eq!(outcome.access_token.expose_secret(), "access-2");
        assert_eq!(
            outcome.message.as_deref(),
            Some("User registered successfully")
        );
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_empty_access_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/token/refresh/"))
            .and(body_json(json!({"refresh": "refresh-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": ""})))
            .mount(&server)
            .await;

        let err = auth_client(&server)?
            .refresh(&SecretString::from("refresh-1"))
            .await
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(matches!(err, Error::Parse(_)));
        Ok(())
    }
}
