#![allow(dead_code)]

use std::path::{Path, PathBuf};

use shrun::CommandBuilder;

/// Absolute path so lookups keep working when a test replaces the
/// environment (and with it `PATH`).
pub const SH: &str = "/bin/sh";

/// Builder for `/bin/sh -c <script>`.
pub fn sh(script: &str) -> CommandBuilder {
    CommandBuilder::new(SH).args(["-c", script])
}

/// A command that exits with `code` and prints nothing.
pub fn exit_with(code: i32) -> CommandBuilder {
    sh(&format!("exit {code}"))
}

/// Write a TOML command file into `dir` and return its path.
pub fn write_command_file(dir: &Path, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
