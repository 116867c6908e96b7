//! Runtime configuration.
//!
//! Configuration is via environment variables:
//! - `ESSAY_COMPOSER_URL` - Base URL (default: `http://127.0.0.1:8000`)
//! - `ESSAY_COMPOSER_TOKEN` - Access token, overrides the saved session (optional)

use std::path::PathBuf;

use anyhow::Result;

/// Default URL for local development.
pub const DEFAULT_URL: &str = "http://127.0.0.1:8000";

pub const APP_NAME: &str = "essay-composer";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Token taken from the environment rather than the session file.
    pub token_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            token_override: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("ESSAY_COMPOSER_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let token_override = std::env::var("ESSAY_COMPOSER_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Self {
            base_url,
            token_override,
        }
    }

    /// Replace the base URL when one was given on the command line.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }
}

/// Directory holding the saved session, under the user's config dir.
pub fn config_dir() -> Result<PathBuf> {
    let mut path =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    Ok(path)
}
