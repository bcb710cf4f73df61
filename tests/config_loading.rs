use std::time::Duration;

use shrun::config::{load_and_validate, parse_duration};
use shrun::errors::ShrunError;
use shrun_test_utils::builders::write_command_file;
use shrun_test_utils::init_tracing;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_full_command_file_loads() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        r#"
binary = "make"
args = ["test", "-j4"]
working_dir = "project"
expected_return_code = 2
timeout = "30s"
input_file = "stdin.txt"

[environment]
CI = "1"
"#,
    )?;

    let file = load_and_validate(&path)?;

    assert_eq!(file.binary, "make");
    assert_eq!(file.args, vec!["test", "-j4"]);
    assert_eq!(file.expected_return_code, 2);
    assert_eq!(file.timeout, Some(Duration::from_secs(30)));
    assert_eq!(file.working_dir, Some(dir.path().join("project")));
    assert_eq!(file.input_file, Some(dir.path().join("stdin.txt")));
    assert_eq!(
        file.environment.unwrap().get("CI").map(String::as_str),
        Some("1")
    );
    Ok(())
}

#[test]
fn test_minimal_command_file_uses_defaults() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(dir.path(), "cmd.toml", r#"binary = "true""#)?;

    let file = load_and_validate(&path)?;

    assert!(file.args.is_empty());
    assert!(file.environment.is_none());
    assert!(file.working_dir.is_none());
    assert_eq!(file.expected_return_code, 0);
    assert!(file.timeout.is_none());
    Ok(())
}

#[test]
fn test_absolute_paths_are_kept() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        "binary = \"true\"\nworking_dir = \"/\"\n",
    )?;

    let file = load_and_validate(&path)?;

    assert_eq!(file.working_dir, Some(std::path::PathBuf::from("/")));
    Ok(())
}

#[test]
fn test_empty_binary_returns_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(dir.path(), "cmd.toml", r#"binary = "  ""#)?;

    match load_and_validate(&path) {
        Err(ShrunError::ConfigError(msg)) => assert!(msg.contains("binary")),
        other => panic!("expected ConfigError, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_missing_binary_returns_toml_error() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(dir.path(), "cmd.toml", r#"args = ["x"]"#)?;

    assert!(matches!(
        load_and_validate(&path),
        Err(ShrunError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn test_unknown_field_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        "binary = \"true\"\nretries = 3\n",
    )?;

    assert!(matches!(
        load_and_validate(&path),
        Err(ShrunError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn test_bad_timeout_returns_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        "binary = \"true\"\ntimeout = \"soon\"\n",
    )?;

    match load_and_validate(&path) {
        Err(ShrunError::ConfigError(msg)) => assert!(msg.contains("invalid `timeout`")),
        other => panic!("expected ConfigError, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_zero_timeout_returns_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        "binary = \"true\"\ntimeout = \"0s\"\n",
    )?;

    assert!(matches!(
        load_and_validate(&path),
        Err(ShrunError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn test_bad_environment_name_returns_config_error() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        "binary = \"true\"\n[environment]\n\"A=B\" = \"x\"\n",
    )?;

    match load_and_validate(&path) {
        Err(ShrunError::ConfigError(msg)) => assert!(msg.contains("A=B")),
        other => panic!("expected ConfigError, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_missing_file_returns_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/cmd.toml"),
        Err(ShrunError::IoError(_))
    ));
}

#[tokio::test]
async fn test_command_file_runs() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    std::fs::write(dir.path().join("in.txt"), "from file")?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        r#"
binary = "/bin/sh"
args = ["-c", "printf '%s|' \"$GREETING\"; cat"]
input_file = "in.txt"

[environment]
GREETING = "hi"
"#,
    )?;

    let file = load_and_validate(&path)?;
    let out = file.to_builder().build().run().await?;

    assert_eq!(out.output_str(), "hi|from file");
    Ok(())
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert_eq!(parse_duration("5S"), Ok(Duration::from_secs(5)));
}

#[test]
fn test_parse_duration_rejects_garbage() {
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("10d").is_err());
    assert!(parse_duration("99999999999999999999h").is_err());
}
