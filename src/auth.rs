//! Saved session token.
//!
//! Stands in for the browser's local storage: the access token returned by
//! login is written to `session.json` and attached to later requests until it
//! is cleared by logout or by an expired-session event.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::client::AuthEvent;
use crate::config::{self, Config};

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub access_token: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// File-backed session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's config directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(config::config_dir()?.join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session, if any.
    pub fn load(&self) -> Result<Option<SavedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).context("Failed to read session file")?;
        let session = serde_json::from_str(&content).context("Failed to parse session file")?;
        Ok(Some(session))
    }

    pub fn token(&self) -> Option<String> {
        match self.load() {
            Ok(session) => session.map(|s| s.access_token),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session: {:#}", e);
                None
            }
        }
    }

    pub fn save(&self, session: &SavedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        fs::write(&self.path, content).context("Failed to write session file")?;
        Ok(())
    }

    /// Remove the saved session. Clearing an absent session succeeds.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove session file"),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Where the bearer token for this run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `ESSAY_COMPOSER_TOKEN`.
    Environment,
    /// The saved session file.
    Saved,
    /// No token; requests go out unauthenticated.
    Absent,
}

/// Pick the token for this run: the environment override first, then the
/// saved session.
pub fn resolve_token(config: &Config, store: &SessionStore) -> (Option<String>, TokenSource) {
    if let Some(token) = &config.token_override {
        return (Some(token.clone()), TokenSource::Environment);
    }
    match store.token() {
        Some(token) => (Some(token), TokenSource::Saved),
        None => (None, TokenSource::Absent),
    }
}

/// Watch for [`AuthEvent::Expired`] until every sender is gone.
///
/// The saved session is cleared only when it supplied the rejected token.
/// Resolves to the source of the rejected token, or `None` if nothing expired.
pub fn spawn_expiry_listener(
    mut events: broadcast::Receiver<AuthEvent>,
    store: SessionStore,
    source: TokenSource,
) -> JoinHandle<Option<TokenSource>> {
    tokio::spawn(async move {
        let mut expired = None;
        loop {
            match events.recv().await {
                Ok(AuthEvent::Expired) if expired.is_none() => {
                    expired = Some(source);
                    if source == TokenSource::Saved {
                        if let Err(e) = store.clear() {
                            tracing::warn!("Failed to clear session: {:#}", e);
                        }
                    }
                }
                Ok(AuthEvent::Expired) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        expired
    })
}
