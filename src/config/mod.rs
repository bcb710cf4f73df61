// src/config/mod.rs

//! Command file loading and validation for shrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a command file from disk (`loader.rs`).
//! - Validate it and turn it into a [`CommandFile`] (`validate.rs`).
//! - Parse human-friendly durations such as `"30s"` (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path};
pub use model::{CommandFile, RawCommandFile};
