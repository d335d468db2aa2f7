use std::io::Write;
use std::time::Duration;

use deploydag::config::{ConfigFile, config_file_pattern, load_and_validate};
use deploydag::errors::DeployError;
use deploydag::types::{CyclePolicy, FailurePolicy};
use deploydag_test_utils::builders::ConfigFileBuilder;
use globset::Glob;
use tempfile::{NamedTempFile, TempDir};

fn load(contents: &str) -> Result<ConfigFile, DeployError> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    load_and_validate(file.path())
}

#[test]
fn empty_file_uses_defaults() {
    let cfg = load("").unwrap();
    assert_eq!(cfg.config.environments, vec!["dev", "uat", "prod"]);
    assert_eq!(cfg.config.artifacts_root, "wsartifacts");
    assert_eq!(cfg.config.tracking_dir, ".deployment_tracking");
    assert_eq!(cfg.config.cycle_policy, CyclePolicy::Abort);
    assert_eq!(cfg.config.failure_policy, FailurePolicy::Continue);
    assert_eq!(cfg.deploy_timeout, Duration::from_secs(600));
    assert_eq!(cfg.deploy.cmd, None);
    assert_eq!(
        cfg.config_paths_for("uat"),
        vec!["config/uat.json", "config/common.json"]
    );
}

#[test]
fn full_file_is_parsed() {
    let cfg = load(
        r#"
[config]
environments = ["test", "live"]
artifacts_root = "deploy/ws"
cycle_policy = "priority-fallback"
failure_policy = "abort"

[changes]
config_paths = ["settings/{env}.toml"]

[deploy]
cmd = "./deploy.sh {environment} {kind} {name}"
timeout = "90s"
created_on_stdout = "^CREATED"
"#,
    )
    .unwrap();

    assert_eq!(cfg.config.cycle_policy, CyclePolicy::PriorityFallback);
    assert_eq!(cfg.config.failure_policy, FailurePolicy::Abort);
    assert_eq!(cfg.deploy_timeout, Duration::from_secs(90));
    assert_eq!(cfg.config_paths_for("live"), vec!["settings/live.toml"]);
    assert!(cfg.ensure_environment("live").is_ok());
}

#[test]
fn unknown_environment_is_rejected() {
    let cfg = ConfigFileBuilder::new().with_environments(&["dev"]).build();
    match cfg.ensure_environment("prod") {
        Err(DeployError::UnknownEnvironment { name, known }) => {
            assert_eq!(name, "prod");
            assert_eq!(known, vec!["dev"]);
        }
        other => panic!("expected UnknownEnvironment, got {other:?}"),
    }
}

#[test]
fn invalid_values_are_config_errors() {
    let cases = [
        "[config]\nenvironments = []\n",
        "[config]\nartifacts_root = \"  \"\n",
        "[deploy]\ntimeout = \"soon\"\n",
        "[deploy]\ntimeout = \"0s\"\n",
        "[deploy]\ncmd = \"   \"\n",
        "[deploy]\nunchanged_on_stdout = \"(unclosed\"\n",
        "[changes]\nconfig_paths = [\"config/[\"]\n",
    ];
    for case in cases {
        match load(case) {
            Err(DeployError::ConfigError(_)) => {}
            other => panic!("expected ConfigError for {case:?}, got {other:?}"),
        }
    }
}

#[test]
fn unknown_keys_and_bad_toml_are_toml_errors() {
    assert!(matches!(
        load("[config]\nqueue_length = 3\n"),
        Err(DeployError::TomlError(_))
    ));
    assert!(matches!(
        load("[config]\ncycle_policy = \"sometimes\"\n"),
        Err(DeployError::TomlError(_))
    ));
    assert!(matches!(load("[config\n"), Err(DeployError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Deploydag.toml"),
        Err(DeployError::IoError(_))
    ));
}

#[test]
fn config_file_pattern_is_relative_to_the_root() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("deploy");
    std::fs::create_dir_all(&nested).unwrap();
    let config = nested.join("Deploydag.toml");
    std::fs::write(&config, "").unwrap();

    assert_eq!(
        config_file_pattern(&config, dir.path()).as_deref(),
        Some("deploy/Deploydag.toml")
    );
    assert_eq!(config_file_pattern(&config, &nested).as_deref(), Some("Deploydag.toml"));

    let elsewhere = TempDir::new().unwrap();
    assert_eq!(config_file_pattern(&config, elsewhere.path()), None);
}

#[test]
fn config_file_pattern_matches_glob_characters_literally() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("Deploydag[prod].toml");
    std::fs::write(&config, "").unwrap();

    let pattern = config_file_pattern(&config, dir.path()).unwrap();
    let matcher = Glob::new(&pattern).unwrap().compile_matcher();
    assert!(matcher.is_match("Deploydag[prod].toml"));
    assert!(!matcher.is_match("Deploydagp.toml"));
}
