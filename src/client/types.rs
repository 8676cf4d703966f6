//! Request and response payloads for the authentication service. Credential
//! fields are `SecretString` and are only exposed while serializing the body.

use crate::session::{SessionPatch, UserProfile};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    pub email: String,
    pub username: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    #[serde(serialize_with = "expose")]
    pub confirm_password: SecretString,
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    pub access: String,
    /// Present when the service rotates refresh tokens.
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Successful login or registration.
#[derive(Clone, Debug)]
pub struct AuthOutcome {
    pub message: Option<String>,
    pub user: UserProfile,
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

impl AuthOutcome {
    #[must_use]
    pub fn patch(&self) -> SessionPatch {
        SessionPatch::login(
            self.access_token.clone(),
            self.refresh_token.clone(),
            self.user.clone(),
        )
    }
}

impl From<AuthResponse> for AuthOutcome {
    fn from(response: AuthResponse) -> Self {
        Self {
            message: response.message,
            user: response.user,
            access_token: SecretString::from(response.tokens.access),
            refresh_token: SecretString::from(response.tokens.refresh),
        }
    }
}

/// Credentials minted by a refresh.
#[derive(Clone, Debug)]
pub struct Refreshed {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
}

impl Refreshed {
    #[must_use]
    pub fn patch(&self) -> SessionPatch {
        SessionPatch {
            refresh_token: self.refresh_token.clone(),
            ..SessionPatch::refreshed(self.access_token.clone())
        }
    }
}

impl From<RefreshResponse> for Refreshed {
    fn from(response: RefreshResponse) -> Self {
        Self {
            access_token: SecretString::from(response.access),
            refresh_token: response
                .refresh
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
        }
    }
}
