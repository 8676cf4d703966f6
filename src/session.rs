//! Session value types. A [`Session`] is a snapshot: it is read from the
//! credential store and never mutated in place. Changes go through a
//! [`SessionPatch`] applied by the store in a single write.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current login state: bearer credentials plus the cached profile.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// Either token counts; the profile alone never does.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.access_token.is_some() || self.refresh_token.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_admin)
    }
}

/// Profile cached from the last successful login or registration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "is_superuser", alias = "is_admin", default)]
    pub is_admin: bool,
    /// Display fields (`id`, `email`, `username`, ...) kept as the service sent them.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl UserProfile {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Username when present, otherwise email.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.field("username")
            .filter(|name| !name.is_empty())
            .or_else(|| self.field("email"))
    }
}

/// Fields to merge into the stored session; `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct SessionPatch {
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub user: Option<UserProfile>,
}

impl SessionPatch {
    /// Full field set written after a successful login or registration.
    #[must_use]
    pub const fn login(
        access_token: SecretString,
        refresh_token: SecretString,
        user: UserProfile,
    ) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user: Some(user),
        }
    }

    /// Replacement access token minted by a refresh.
    #[must_use]
    pub const fn refreshed(access_token: SecretString) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: None,
            user: None,
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(token.into()));
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.user = Some(user);
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}
