use std::time::Duration;

use clap::Parser;
use shrun::cli::CliArgs;
use shrun::errors::ShrunError;
use shrun::{exit_code_for, resolve_command, run};
use shrun_test_utils::builders::write_command_file;
use shrun_test_utils::init_tracing;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(args).expect("valid arguments")
}

#[test]
fn test_trailing_command_keeps_its_flags() {
    let args = parse(&["shrun", "--timeout", "5s", "--env", "A=1", "sh", "-c", "exit 3"]);

    assert_eq!(args.command, vec!["sh", "-c", "exit 3"]);
    assert_eq!(args.timeout.as_deref(), Some("5s"));
    assert_eq!(args.env, vec![("A".to_string(), "1".to_string())]);
}

#[test]
fn test_negative_expected_code() {
    let args = parse(&["shrun", "--expect", "-1", "--", "true"]);
    assert_eq!(args.expect, Some(-1));
    assert_eq!(args.command, vec!["true"]);
}

#[test]
fn test_malformed_env_is_rejected() {
    assert!(CliArgs::try_parse_from(["shrun", "--env", "NOEQUALS", "true"]).is_err());
    assert!(CliArgs::try_parse_from(["shrun", "--env", "=x", "true"]).is_err());
}

#[test]
fn test_resolve_requires_a_command() {
    let args = parse(&["shrun"]);
    assert!(matches!(
        resolve_command(&args),
        Err(ShrunError::ConfigError(_))
    ));
}

#[test]
fn test_cli_overrides_command_file() -> TestResult {
    let dir = tempdir()?;
    let path = write_command_file(
        dir.path(),
        "cmd.toml",
        "binary = \"make\"\nexpected_return_code = 1\n[environment]\nA = \"file\"\n",
    )?;
    let path = path.to_str().unwrap();

    let args = parse(&[
        "shrun", "--config", path, "--expect", "2", "--timeout", "1m", "--env", "B=cli",
    ]);
    let file = resolve_command(&args)?;

    assert_eq!(file.binary, "make");
    assert_eq!(file.expected_return_code, 2);
    assert_eq!(file.timeout, Some(Duration::from_secs(60)));
    let env = file.environment.unwrap();
    assert_eq!(env.get("A").map(String::as_str), Some("file"));
    assert_eq!(env.get("B").map(String::as_str), Some("cli"));
    Ok(())
}

#[test]
fn test_bad_cli_timeout_is_config_error() {
    let args = parse(&["shrun", "--timeout", "0ms", "true"]);
    assert!(matches!(
        resolve_command(&args),
        Err(ShrunError::ConfigError(_))
    ));
}

#[tokio::test]
async fn test_run_reports_command_exit_code() -> TestResult {
    init_tracing();

    let code = run(parse(&["shrun", "/bin/sh", "-c", "exit 3"])).await?;
    assert_eq!(code, 3);

    let code = run(parse(&["shrun", "--expect", "3", "/bin/sh", "-c", "exit 3"])).await?;
    assert_eq!(code, 0);

    let code = run(parse(&["shrun", "--expect", "3", "/bin/sh", "-c", "exit 0"])).await?;
    assert_eq!(code, 1);
    Ok(())
}

#[tokio::test]
async fn test_run_reports_spawn_failure_and_timeout_as_one() -> TestResult {
    init_tracing();

    let code = run(parse(&["shrun", "shrun-definitely-not-a-real-binary"])).await?;
    assert_eq!(code, 1);

    let code = run(parse(&["shrun", "--timeout", "100ms", "sleep", "10"])).await?;
    assert_eq!(code, 1);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_does_not_execute() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let marker = dir.path().join("ran");
    let script = format!("touch {}", marker.display());

    let code = run(parse(&["shrun", "--dry-run", "/bin/sh", "-c", script.as_str()])).await?;

    assert_eq!(code, 0);
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn test_exit_code_for_prefers_real_code() {
    init_tracing();

    let err = shrun::Command::builder("/bin/sh")
        .args(["-c", "exit 7"])
        .build()
        .run()
        .await
        .unwrap_err();
    assert_eq!(exit_code_for(&err), 7);
}
