//! Route guard: decides whether guarded content renders, the visitor is
//! redirected, or a forbidden message takes the content's place.
//!
//! The decision is a pure table over [`Classification`]; [`RouteGuard::evaluate`]
//! re-reads the store on every call so no classification survives between
//! navigations or between nested guards.

use crate::{
    policy::{Classification, classify_store},
    router::paths,
    store::CredentialStore,
};

/// Result of running a guard for one render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    /// Navigate away. `from` carries the requested location so login can return to it.
    Redirect { to: String, from: Option<String> },
    /// Show this message in place of the guarded content.
    Forbidden(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGuard {
    pub require_admin: bool,
    pub redirect_to: String,
    pub forbidden_redirect_to: String,
    pub forbidden_message: Option<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            require_admin: false,
            redirect_to: paths::LOGIN.to_string(),
            forbidden_redirect_to: paths::HOME.to_string(),
            forbidden_message: None,
        }
    }
}

impl RouteGuard {
    /// Guard that only requires a session.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Guard that requires the admin flag on the cached profile.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            require_admin: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn redirect_to(mut self, destination: impl Into<String>) -> Self {
        self.redirect_to = destination.into();
        self
    }

    #[must_use]
    pub fn forbidden_redirect_to(mut self, destination: impl Into<String>) -> Self {
        self.forbidden_redirect_to = destination.into();
        self
    }

    #[must_use]
    pub fn forbidden_message(mut self, message: impl Into<String>) -> Self {
        self.forbidden_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn decide(&self, classification: Classification, location: &str) -> GuardOutcome {
        match (classification, self.require_admin) {
            (Classification::Anonymous, _) => GuardOutcome::Redirect {
                to: self.redirect_to.clone(),
                from: Some(location.to_string()),
            },
            (Classification::Authenticated, true) => match &self.forbidden_message {
                Some(message) => GuardOutcome::Forbidden(message.clone()),
                None => GuardOutcome::Redirect {
                    to: self.forbidden_redirect_to.clone(),
                    from: None,
                },
            },
            (Classification::Authenticated, false) | (Classification::AuthenticatedAdmin, _) => {
                GuardOutcome::Render
            }
        }
    }

    /// Classifies the store's current contents and applies [`RouteGuard::decide`].
    #[must_use]
    pub fn evaluate(&self, store: &CredentialStore, location: &str) -> GuardOutcome {
        self.decide(classify_store(store), location)
    }
}
