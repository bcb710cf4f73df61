// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{CommandFile, RawCommandFile};
use crate::errors::Result;

/// Load a command file from a given path and return the raw `RawCommandFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawCommandFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawCommandFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a command file from path, validate it and resolve relative paths.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde`).
/// - Checks the binary, environment names, paths and timeout.
/// - Resolves relative `working_dir` / `input_file` against the directory
///   containing the command file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<CommandFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let mut file = CommandFile::try_from(raw)?;

    let base = config_root_dir(path);
    file.working_dir = file.working_dir.map(|dir| resolve(&base, dir));
    file.input_file = file.input_file.map(|input| resolve(&base, input));

    debug!(path = %path.display(), binary = %file.binary, "loaded command file");
    Ok(file)
}

/// Directory that relative paths in a command file are resolved against.
///
/// A bare filename like `cmd.toml` has an empty parent; that means the
/// current directory, so relative paths are left as they are.
fn config_root_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::new(),
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path
    } else {
        base.join(path)
    }
}
