//! Copy and download of the assembled essay.

use std::path::{Path, PathBuf};

use super::error::ComposeError;

pub const MARKDOWN_MEDIA_TYPE: &str = "text/markdown";
pub const DEFAULT_BASE_NAME: &str = "essay";
const EXTENSION: &str = "md";

/// Destination for copied text.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ComposeError>;
}

/// The operating system clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ComposeError> {
        let inner = arboard::Clipboard::new().map_err(|e| ComposeError::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ComposeError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ComposeError::Clipboard(e.to_string()))
    }
}

/// Write `text` to `clipboard`.
pub fn copy(text: &str, clipboard: &mut dyn Clipboard) -> Result<(), ComposeError> {
    clipboard.set_text(text)?;
    tracing::debug!("Copied {} bytes to clipboard", text.len());
    Ok(())
}

/// A downloadable file: name, media type and UTF-8 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, returning the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ComposeError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|source| ComposeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("Exported essay to {}", path.display());
        Ok(path)
    }
}

/// Build the markdown download for `text`, named after `topic`.
pub fn download(topic: &str, text: &str) -> ExportArtifact {
    ExportArtifact {
        file_name: export_file_name(topic),
        media_type: MARKDOWN_MEDIA_TYPE,
        bytes: text.as_bytes().to_vec(),
    }
}

/// `<sanitized topic>.md`, or `essay.md` when nothing usable is left.
pub fn export_file_name(topic: &str) -> String {
    let base = sanitize_file_stem(topic);
    let base = if base.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        base
    };
    format!("{}.{}", base, EXTENSION)
}

/// Make `topic` safe to use as a file name on common file systems.
///
/// Reserved and control characters become `_`; surrounding whitespace and
/// trailing dots are dropped.
pub fn sanitize_file_stem(topic: &str) -> String {
    let replaced: String = topic
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced
        .trim()
        .trim_end_matches('.')
        .trim_end()
        .to_string()
}
