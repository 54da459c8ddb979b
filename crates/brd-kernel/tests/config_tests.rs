//! Config loading and CLI-facing library paths

use brd_core::ConfigError;
use brd_kernel::{load_config, run_scenario, KernelError, Scenario};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn no_path_gives_defaults() {
    let config = load_config(None).unwrap();
    assert_eq!(config.comment_limit_per_user_type, 5);
    assert_eq!(config.max_comment_length, 4000);
}

#[test]
fn file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "comment_limit_per_user_type = 2").unwrap();
    writeln!(file, "bulk_reassign_concurrency = 3").unwrap();

    let config = load_config(Some(file.path())).unwrap();
    assert_eq!(config.comment_limit_per_user_type, 2);
    assert_eq!(config.bulk_reassign_concurrency, 3);
    assert_eq!(config.max_comment_length, 4000);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, KernelError::Io { path: p, .. } if p == path));
}

#[test]
fn zero_limit_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "comment_limit_per_user_type = 0").unwrap();
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Config(ConfigError::Zero("comment_limit_per_user_type"))
    ));
}

#[test]
fn malformed_toml_is_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "comment_limit_per_user_type = \"many\"").unwrap();
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, KernelError::Config(ConfigError::Parse(_))));
}

#[tokio::test]
async fn configured_limit_reaches_scenario_d() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "comment_limit_per_user_type = 5").unwrap();
    let config = load_config(Some(file.path())).unwrap();
    let report = run_scenario(Scenario::D, config).await.unwrap();
    assert!(report.passed, "{}", report.generate_text());
}
