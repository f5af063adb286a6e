//! End-to-end tests for resolution, assembly and the `devenv` binary.

use devenv::layout::Layout;
use devenv::orchestrator::{handoff, PlanRecorder};
use devenv::session::Session;
use devenv::ResourceDeclaration;
use envconf::{safe_local, EnvironmentSnapshot};
use std::path::Path;
use std::process::{Command, Output};

fn session(pairs: &[(&str, &str)]) -> Session {
    let mut pairs = pairs.to_vec();
    pairs.push(("GIT_SHA", "0123abc"));
    Session::new(
        EnvironmentSnapshot::from_pairs(pairs.into_iter()),
        Layout::default(),
    )
}

fn devenv(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_devenv"))
        .args(args)
        .current_dir(dir)
        .env_clear()
        .env("GIT_SHA", "0123abc")
        .envs(env.iter().copied())
        .output()
        .expect("failed to run devenv binary")
}

#[test]
fn test_app_env_from_environment() {
    let session = session(&[("APP_ENV", "staging")]);
    assert_eq!(session.config().get("APP_ENV"), Some("staging"));
    let config = session.plan().config_objects().next().unwrap().clone();
    assert_eq!(config.data["APP_ENV"], "staging");
}

#[test]
fn test_credentials_fall_back_to_literal_default() {
    let plan = session(&[]).plan();
    let secret = plan.secret_objects().next().unwrap();
    assert_eq!(secret.data["S3_ACCESS_KEY"], "admin");
}

#[test]
fn test_empty_log_level_is_kept() {
    let session = session(&[("LOG_LEVEL", "")]);
    assert_eq!(session.config().get("LOG_LEVEL"), Some(""));
    assert_eq!(session.config().empty_overrides(), vec!["LOG_LEVEL"]);
    assert!(session.settings().is_err());
}

#[test]
fn test_failing_shell_helper_returns_default() {
    assert_eq!(safe_local("exit 1", "untouched"), "untouched");
}

#[test]
fn test_identical_environments_give_identical_plans() {
    let env = [("APP_ENV", "staging"), ("MINIO_ROOT_USER", "minio")];
    let first = session(&env).plan();
    let second = session(&env).plan();
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.to_yaml().unwrap(), second.to_yaml().unwrap());
}

#[test]
fn test_handoff_preserves_plan() {
    let plan = session(&[("DEBUGPY_ENABLED", "true")]).validated_plan().unwrap();
    let mut recorder = PlanRecorder::new();
    handoff(&plan, &mut recorder).unwrap();
    let names: Vec<_> = recorder.declarations().iter().map(|d| d.name()).collect();
    assert_eq!(
        names,
        vec![
            "octowalrus-config",
            "octowalrus-secrets",
            "octowalrus-minio-credentials",
            "octowalrus",
            "octowalrus-minio",
            "octowalrus",
        ]
    );
    assert!(matches!(
        recorder.declarations()[5],
        ResourceDeclaration::ExposureDescriptor(ref e) if e.port_forwards.len() == 2
    ));
}

#[test]
fn test_cli_plan_outputs_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = devenv(dir.path(), &["plan"], &[("APP_ENV", "staging")]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["chart"]["environment"], "staging");
    assert_eq!(plan["declarations"][0]["kind"], "config_object");
    assert_eq!(plan["declarations"][3]["build_args"]["GIT_SHA"], "0123abc");
}

#[test]
fn test_cli_reads_env_file_and_layout() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "APP_ENV=from-dotenv\nS3_BUCKET=dotenv-bucket\n").unwrap();
    std::fs::write(dir.path().join("devenv.toml"), "[chart]\nnamespace = \"octowalrus-dev\"\n").unwrap();

    let output = devenv(dir.path(), &["plan"], &[("S3_BUCKET", "process-bucket")]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["chart"]["environment"], "from-dotenv");
    assert_eq!(plan["chart"]["namespace"], "octowalrus-dev");
    assert_eq!(
        plan["declarations"][0]["data"]["S3_BUCKET"],
        "process-bucket"
    );
}

#[test]
fn test_cli_start_up_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "S3_SECRET_KEY=from-dotenv-secret\n").unwrap();
    std::fs::write(dir.path().join("devenv.toml"), "[chart]\nnamespace = \"dev\"\n").unwrap();

    let output = devenv(dir.path(), &["resolve"], &[("RUST_LOG", "debug")]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("captured process environment"), "{}", stderr);
    assert!(stderr.contains("layered env file under process environment"));
    assert!(stderr.contains("loaded layout"));
    assert!(!stderr.contains("from-dotenv-secret"));
}

#[test]
fn test_cli_resolve_redacts_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let output = devenv(dir.path(), &["resolve"], &[("S3_SECRET_KEY", "super-secret-value")]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("S3_SECRET_KEY"));
    assert!(stdout.contains("<redacted>"));
    assert!(!stdout.contains("super-secret-value"));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("super-secret-value"));
}

#[test]
fn test_cli_manifests() {
    let dir = tempfile::tempdir().unwrap();
    let output = devenv(dir.path(), &["manifests"], &[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches("kind: ConfigMap").count(), 1);
    assert_eq!(stdout.matches("kind: Secret").count(), 2);
}

#[test]
fn test_cli_check_fails_on_bad_settings() {
    let dir = tempfile::tempdir().unwrap();
    let output = devenv(dir.path(), &["check"], &[("LOG_LEVEL", "")]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("LOG_LEVEL is set to an empty string"));
    assert!(stdout.contains("Settings invalid"));
    assert!(stdout.contains("✓ Plan valid"));
}

#[test]
fn test_cli_plan_refuses_invalid_layout() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("devenv.toml"), "[object_store]\nlocal_api_port = 8000\n").unwrap();

    let output = devenv(dir.path(), &["plan"], &[]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already forwarded"));
}
