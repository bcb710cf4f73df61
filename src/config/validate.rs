// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{CommandFile, RawCommandFile};
use crate::errors::{Result, ShrunError};

impl TryFrom<RawCommandFile> for CommandFile {
    type Error = crate::errors::ShrunError;

    fn try_from(raw: RawCommandFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_command(&raw)?;

        let timeout = raw
            .timeout
            .as_deref()
            .map(parse_timeout)
            .transpose()?;

        Ok(CommandFile {
            binary: raw.binary,
            args: raw.args,
            environment: raw.environment,
            working_dir: raw.working_dir,
            expected_return_code: raw.expected_return_code,
            timeout,
            input_file: raw.input_file,
        })
    }
}

fn validate_raw_command(raw: &RawCommandFile) -> Result<()> {
    ensure_has_binary(raw)?;
    validate_environment(raw)?;
    validate_paths(raw)?;
    Ok(())
}

fn ensure_has_binary(raw: &RawCommandFile) -> Result<()> {
    if raw.binary.trim().is_empty() {
        return Err(ShrunError::ConfigError(
            "command file must set a non-empty `binary`".to_string(),
        ));
    }
    Ok(())
}

fn validate_environment(raw: &RawCommandFile) -> Result<()> {
    let Some(env) = &raw.environment else {
        return Ok(());
    };

    for key in env.keys() {
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(ShrunError::ConfigError(format!(
                "invalid environment variable name {key:?}"
            )));
        }
    }
    Ok(())
}

fn validate_paths(raw: &RawCommandFile) -> Result<()> {
    if matches!(&raw.working_dir, Some(dir) if dir.as_os_str().is_empty()) {
        return Err(ShrunError::ConfigError(
            "`working_dir` must not be empty (omit it to inherit the current directory)"
                .to_string(),
        ));
    }
    if matches!(&raw.input_file, Some(path) if path.as_os_str().is_empty()) {
        return Err(ShrunError::ConfigError(
            "`input_file` must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn parse_timeout(s: &str) -> Result<std::time::Duration> {
    let timeout = parse_duration(s)
        .map_err(|e| ShrunError::ConfigError(format!("invalid `timeout`: {e}")))?;
    if timeout.is_zero() {
        return Err(ShrunError::ConfigError(
            "`timeout` must be greater than zero".to_string(),
        ));
    }
    Ok(timeout)
}
