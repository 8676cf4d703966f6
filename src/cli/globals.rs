use crate::{
    cli::commands::{ARG_API_URL, ARG_STORE, ARG_TIMEOUT, DEFAULT_STORE},
    client::{Navigator, SessionClient},
    config::{ClientConfig, DEFAULT_API_URL},
    store::{CredentialStore, FileStorage},
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub store_path: PathBuf,
    pub timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        Self {
            api_url: matches
                .get_one::<String>(ARG_API_URL)
                .cloned()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            store_path: matches
                .get_one::<String>(ARG_STORE)
                .map_or_else(|| PathBuf::from(DEFAULT_STORE), PathBuf::from),
            timeout: Duration::from_secs(matches.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(5)),
        }
    }

    /// Opens the session file; an unreadable file starts an empty session.
    #[must_use]
    pub fn store(&self) -> Arc<CredentialStore> {
        Arc::new(CredentialStore::init(FileStorage::new(&self.store_path)))
    }

    /// # Errors
    /// Returns an error if the API URL is invalid.
    pub fn config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig::new(&self.api_url)
            .with_context(|| format!("invalid --api-url {}", self.api_url))?
            .with_timeout(self.timeout))
    }

    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn session_client(&self) -> Result<SessionClient> {
        Ok(SessionClient::new(
            self.config()?,
            self.store(),
            Arc::new(Terminal),
        )?)
    }
}

/// Navigation target for the terminal: there is no screen to switch, so the
/// user is told to sign in again.
#[derive(Debug)]
pub struct Terminal;

impl Navigator for Terminal {
    fn navigate(&self, location: &str) {
        info!(location, "session ended");
        eprintln!("Your session has ended. Run `gatehouse login` to sign in again.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_global_args() -> Result<()> {
        temp_env::with_vars(
            [
                ("GATEHOUSE_API_URL", Some("https://api.example.com/v1")),
                ("GATEHOUSE_STORE", None),
                ("GATEHOUSE_TIMEOUT", Some("9")),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["gatehouse", "status"]);
                let globals = GlobalArgs::from_matches(&matches);

                assert_eq!(globals.api_url, "https://api.example.com/v1");
                assert_eq!(globals.store_path, PathBuf::from(DEFAULT_STORE));
                assert_eq!(globals.timeout, Duration::from_secs(9));

                let config = globals.config()?;
                assert_eq!(config.api_base_url.as_str(), "https://api.example.com/v1/");
                assert_eq!(config.timeout, Duration::from_secs(9));
                Ok(())
            },
        )
    }

    #[test]
    fn test_invalid_api_url() {
        let globals = GlobalArgs {
            api_url: "ftp://example.com".to_string(),
            store_path: PathBuf::from(DEFAULT_STORE),
            timeout: Duration::from_secs(5),
        };
        assert!(globals.config().is_err());
    }
}
