//! Credential store: durable key-value persistence for the access token, the
//! refresh token and the cached user profile.
//!
//! Every write builds the complete next state and hands it to the backend in a
//! single `save`, under the same lock readers take, so a reader sees either the
//! state before a transition or the state after it. Reads never fail: a value
//! that cannot be parsed is reported as absent.

use crate::{
    error::{Error, Result},
    session::{Session, SessionPatch, UserProfile},
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::BTreeMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, info, warn};

pub const ACCESS_TOKEN_KEY: &str = "gatehouse.access_token";
pub const REFRESH_TOKEN_KEY: &str = "gatehouse.refresh_token";
pub const USER_KEY: &str = "gatehouse.user";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

pub type Entries = BTreeMap<String, String>;

/// Synchronous persistence backend.
pub trait Storage: Send + Sync {
    /// Loads every persisted entry.
    /// # Errors
    /// Returns an error if the backing medium cannot be read or decoded.
    fn load(&self) -> Result<Entries>;

    /// Replaces the persisted entries in one write.
    /// # Errors
    /// Returns an error if the backing medium cannot be written.
    fn save(&self, entries: &Entries) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn load(&self) -> Result<Entries> {
        (**self).load()
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        (**self).save(entries)
    }
}

/// Process-local storage, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<Entries>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entries(entries: Entries) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Entries> {
        Ok(lock(&self.entries).clone())
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        lock(&self.entries).clone_from(entries);
        Ok(())
    }
}

/// JSON document on disk, replaced atomically through a temp file and rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Entries> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => {
                return Err(Error::Storage(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };

        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&raw).map_err(|err| {
            Error::Storage(format!("failed to decode {}: {err}", self.path.display()))
        })
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                Error::Storage(format!("failed to create {}: {err}", parent.display()))
            })?;
        }

        let payload = serde_json::to_vec_pretty(entries)
            .map_err(|err| Error::Serialization(format!("Failed to encode session: {err}")))?;

        let temp_path = self.temp_path();
        let mut file = open_private(&temp_path).map_err(|err| {
            Error::Storage(format!("failed to open {}: {err}", temp_path.display()))
        })?;
        file.write_all(&payload)
            .and_then(|()| file.sync_all())
            .map_err(|err| {
                Error::Storage(format!("failed to write {}: {err}", temp_path.display()))
            })?;

        fs::rename(&temp_path, &self.path).map_err(|err| {
            Error::Storage(format!("failed to replace {}: {err}", self.path.display()))
        })?;

        debug!("session persisted to {}", self.path.display());

        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared credential store. Build one with [`CredentialStore::init`] at startup
/// and pass it around behind an `Arc`.
pub struct CredentialStore {
    backend: Box<dyn Storage>,
    entries: Mutex<Entries>,
}

impl CredentialStore {
    /// Loads the persisted state. An unreadable backend starts the session empty.
    pub fn init(backend: impl Storage + 'static) -> Self {
        let entries = backend.load().unwrap_or_else(|err| {
            warn!("ignoring unreadable session state: {err}");
            Entries::new()
        });

        Self {
            backend: Box::new(backend),
            entries: Mutex::new(entries),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::init(MemoryStorage::new())
    }

    /// Current session snapshot.
    #[must_use]
    pub fn get(&self) -> Session {
        let entries = lock(&self.entries);

        let user = entries.get(USER_KEY).and_then(|raw| {
            serde_json::from_str::<UserProfile>(raw)
                .map_err(|err| warn!("ignoring corrupt cached profile: {err}"))
                .ok()
        });

        Session {
            access_token: read_token(&entries, ACCESS_TOKEN_KEY),
            refresh_token: read_token(&entries, REFRESH_TOKEN_KEY),
            user,
        }
    }

    /// Merges `patch` into the stored session and persists the result.
    /// # Errors
    /// Returns an error if the profile cannot be encoded or the backend write fails;
    /// the previous state is kept in that case.
    pub fn set(&self, patch: SessionPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut entries = lock(&self.entries);
        self.commit(&mut entries, &patch)
    }

    /// Applies a refresh result only while the stored refresh token is still the
    /// one that was exchanged. Returns `false` without writing when the session
    /// was cleared or replaced in the meantime.
    /// # Errors
    /// Returns an error if the backend write fails; the previous state is kept.
    pub fn set_if_refresh_matches(
        &self,
        exchanged: &SecretString,
        patch: SessionPatch,
    ) -> Result<bool> {
        let mut entries = lock(&self.entries);

        let current = read_token(&entries, REFRESH_TOKEN_KEY);
        if current.as_ref().map(ExposeSecret::expose_secret) != Some(exchanged.expose_secret()) {
            debug!("session changed while refreshing, discarding refreshed token");
            return Ok(false);
        }

        if !patch.is_empty() {
            self.commit(&mut entries, &patch)?;
        }

        Ok(true)
    }

    fn commit(&self, entries: &mut Entries, patch: &SessionPatch) -> Result<()> {
        let mut next = entries.clone();

        if let Some(token) = &patch.access_token {
            next.insert(
                ACCESS_TOKEN_KEY.to_string(),
                token.expose_secret().to_string(),
            );
        }
        if let Some(token) = &patch.refresh_token {
            next.insert(
                REFRESH_TOKEN_KEY.to_string(),
                token.expose_secret().to_string(),
            );
        }
        if let Some(user) = &patch.user {
            let raw = serde_json::to_string(user)
                .map_err(|err| Error::Serialization(format!("Failed to encode profile: {err}")))?;
            next.insert(USER_KEY.to_string(), raw);
        }

        self.backend.save(&next)?;
        *entries = next;

        debug!(
            access_token = patch.access_token.is_some(),
            refresh_token = patch.refresh_token.is_some(),
            user = patch.user.is_some(),
            "session updated"
        );

        Ok(())
    }

    /// Erases every session field in one write. Clearing an empty store is a no-op.
    /// # Errors
    /// Returns an error if the backend write fails.
    pub fn clear(&self) -> Result<()> {
        let mut entries = lock(&self.entries);
        if SESSION_KEYS.iter().all(|key| !entries.contains_key(*key)) {
            return Ok(());
        }

        let mut next = entries.clone();
        for key in SESSION_KEYS {
            next.remove(key);
        }

        self.backend.save(&next)?;
        *entries = next;

        info!("session cleared");

        Ok(())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CredentialStore")
            .field("session", &self.get())
            .finish_non_exhaustive()
    }
}

fn read_token(entries: &Entries, key: &str) -> Option<SecretString> {
    entries
        .get(key)
        .filter(|value| !value.trim().is_empty())
        .map(|value| SecretString::from(value.clone()))
}
