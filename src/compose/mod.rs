//! Essay composition.
//!
//! Data flows one way: the raw outline from the service is normalized into a
//! canonical outline, sections are generated per header into the
//! [`ContentStore`], and progress and the assembled document are derived from
//! outline + store on every read.

mod assemble;
mod coordinator;
mod error;
mod export;
mod outline;
mod progress;
mod session;
mod store;

pub use assemble::assemble;
pub use coordinator::{SectionCoordinator, SectionState};
pub use error::ComposeError;
pub use export::{
    copy, download, export_file_name, sanitize_file_stem, Clipboard, ExportArtifact,
    SystemClipboard, DEFAULT_BASE_NAME, MARKDOWN_MEDIA_TYPE,
};
pub use outline::{contains_header, normalize};
pub use progress::{progress, Progress};
pub use session::EssaySession;
pub use store::{ContentStore, WeakContentStore};
