//! Wire models for the essay service.
//!
//! # Core Concepts
//!
//! - [`Essay`]: An essay under composition. Its `outline` is kept in the raw
//!   shape the server sent; use [`crate::compose::normalize`] to obtain the
//!   canonical ordered outline.
//! - [`OutlineEntry`]: One planned section, keyed by its header.
//! - [`Document`]: An uploaded research document that essays are grounded on.
//! - [`AuthResponse`]: Result of signup or login.

mod account;
mod document;
mod essay;
mod timestamp;

pub use account::*;
pub use document::*;
pub use essay::*;
