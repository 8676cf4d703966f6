//! Access policy: derives the visitor's access level from a session snapshot.
//! Pure and deterministic; callers that need the live state read the store
//! first (see [`classify_store`]).

use crate::{session::Session, store::CredentialStore};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    Anonymous,
    Authenticated,
    AuthenticatedAdmin,
}

impl Classification {
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::AuthenticatedAdmin => "authenticated-admin",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Either token makes the visitor authenticated; only the cached profile's
/// admin flag elevates, and never without a token.
#[must_use]
pub fn classify(session: &Session) -> Classification {
    if !session.has_token() {
        Classification::Anonymous
    } else if session.is_admin() {
        Classification::AuthenticatedAdmin
    } else {
        Classification::Authenticated
    }
}

/// Classifies the store's current contents.
#[must_use]
pub fn classify_store(store: &CredentialStore) -> Classification {
    classify(&store.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserProfile;
    use secrecy::SecretString;

    fn session(access: bool, refresh: bool, user: Option<bool>) -> Session {
        Session {
            access_token: access.then(|| SecretString::from("access")),
            refresh_token: refresh.then(|| SecretString::from("refresh")),
            user: user.map(|is_admin| UserProfile {
                is_admin,
                ..UserProfile::default()
            }),
        }
    }

    #[test]
    fn no_tokens_is_anonymous_whatever_the_profile() {
        for user in [None, Some(false), Some(true)] {
            assert_eq!(
                classify(&session(false, false, user)),
                Classification::Anonymous
            );
        }
    }

    #[test]
    fn any_token_without_admin_flag_is_authenticated() {
        for (access, refresh) in [(true, false), (false, true), (true, true)] {
            for user in [None, Some(false)] {
                assert_eq!(
                    classify(&session(access, refresh, user)),
                    Classification::Authenticated
                );
            }
        }
    }

    #[test]
    fn any_token_with_admin_flag_is_admin() {
        for (access, refresh) in [(true, false), (false, true), (true, true)] {
            assert_eq!(
                classify(&session(access, refresh, Some(true))),
                Classification::AuthenticatedAdmin
            );
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(Classification::Anonymous.to_string(), "anonymous");
        assert_eq!(
            Classification::AuthenticatedAdmin.to_string(),
            "authenticated-admin"
        );
        assert!(Classification::Authenticated.is_authenticated());
        assert!(!Classification::Anonymous.is_authenticated());
    }
}
