//! Client-side essay composition.
//!
//! - [`client`]: HTTP access to the essay service.
//! - [`compose`]: outline normalization, per-section generation, progress and
//!   export.
//! - [`auth`]: the saved session token.

pub mod auth;
pub mod client;
pub mod compose;
pub mod config;
pub mod models;
pub mod render;
