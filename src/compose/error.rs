use thiserror::Error;

use crate::client::ClientError;

/// Errors raised by the composition core.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Essay has no outline yet")]
    NoOutline,

    #[error("Unknown section header: {0:?}")]
    UnknownHeader(String),

    #[error("Section {header:?}: response carried no text")]
    MalformedSection { header: String },

    #[error("Section {header:?}: {source}")]
    Section {
        header: String,
        #[source]
        source: ClientError,
    },

    #[error("Essay was discarded before section {header:?} completed")]
    Detached { header: String },

    #[error(transparent)]
    Remote(#[from] ClientError),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ComposeError {
    /// Header this error belongs to, for per-section failures.
    pub fn header(&self) -> Option<&str> {
        match self {
            Self::UnknownHeader(header)
            | Self::MalformedSection { header }
            | Self::Section { header, .. }
            | Self::Detached { header } => Some(header),
            _ => None,
        }
    }

    /// Whether the error came from an expired session.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Remote(ClientError::AuthExpired { .. })
                | Self::Section {
                    source: ClientError::AuthExpired { .. },
                    ..
                }
        )
    }
}
