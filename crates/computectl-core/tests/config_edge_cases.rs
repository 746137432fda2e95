use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use computectl_core::config::{Config, ConfigError, Profile};
use computectl_core::{ApiVersionKind, StatusMethod};
use tempfile::TempDir;

/// Returns true if running as root (euid == 0). Used to skip permission tests.
#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

// ---------------------------------------------------------------------------
// Missing and empty files
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/computectl-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("missing file is not an error");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let (_dir, path) = write_config("");

    let config = Config::load_from_path(&path).expect("empty file should parse as default");

    assert_eq!(config, Config::default());
}

// ---------------------------------------------------------------------------
// Malformed content
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let (_dir, path) = write_config("[[[broken");

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)), "got {err:?}");
}

#[test]
fn load_profile_without_project_returns_error() {
    let (_dir, path) = write_config(
        r#"
[profiles.broken]
zone = "us-central1-a"
"#,
    );

    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn load_profile_with_unknown_api_version_returns_error() {
    let (_dir, path) = write_config(
        r#"
[profiles.dev]
project = "p"
api_version = "gamma"
"#,
    );

    assert!(Config::load_from_path(&path).is_err());
}

#[test]
fn load_config_with_unknown_fields_ignores_them() {
    let (_dir, path) = write_config(
        r#"
unknown_top_level_key = "hello"

[profiles.dev]
project = "dev-project"
totally_unknown_field = true
"#,
    );

    let config = Config::load_from_path(&path).expect("unknown fields should be ignored");
    assert!(config.profiles.contains_key("dev"));
}

// ---------------------------------------------------------------------------
// Full profiles
// ---------------------------------------------------------------------------

#[test]
fn load_full_profile_with_resilience() {
    let (_dir, path) = write_config(
        r#"
default_profile = "prod"

[profiles.prod]
project = "prod-project"
endpoint = "http://localhost:9090"
api_version = "alpha"
zone = "us-central1-a"
region = "us-central1"

[profiles.prod.resilience.retry]
max_attempts = 5
max_elapsed_secs = 300

[profiles.prod.resilience.poll]
interval_ms = 250
timeout_secs = 900
method = "get"
"#,
    );

    let config = Config::load_from_path(&path).unwrap();
    let (name, prod) = config.active_profile(None).unwrap();

    assert_eq!(name, "prod");
    assert_eq!(prod.api_version, ApiVersionKind::Alpha);
    assert_eq!(prod.endpoint, "http://localhost:9090");

    let resilience = prod.resilience();
    assert_eq!(resilience.retry.max_attempts, 5);
    assert!(resilience.retry.enabled);
    assert_eq!(resilience.poll.method, StatusMethod::Get);
    assert_eq!(resilience.poll.deadline(), Some(Duration::from_secs(900)));
    assert_eq!(resilience.poll.policy().next_delay(0), Duration::from_millis(250));
}

#[test]
#[serial_test::serial]
fn load_expands_environment_variables() {
    unsafe {
        std::env::set_var("COMPUTECTL_TEST_PROJECT", "from-env");
        std::env::remove_var("COMPUTECTL_TEST_ENDPOINT");
    }

    let (_dir, path) = write_config(
        r#"
[profiles.env]
project = "${COMPUTECTL_TEST_PROJECT}"
endpoint = "${COMPUTECTL_TEST_ENDPOINT:-http://emulator:8080}"
"#,
    );

    let config = Config::load_from_path(&path).unwrap();
    let profile = config.profile("env").unwrap();
    assert_eq!(profile.project, "from-env");
    assert_eq!(profile.endpoint, "http://emulator:8080");

    unsafe {
        std::env::remove_var("COMPUTECTL_TEST_PROJECT");
    }
}

#[test]
fn save_then_load_preserves_profiles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    let mut staging = Profile::new("staging-project");
    staging.region = Some("europe-west1".to_string());
    config.set_profile("staging".to_string(), staging);
    config.default_profile = Some("staging".to_string());

    config.save_to_path(&path).unwrap();
    let loaded = Config::load_from_path(&path).unwrap();

    assert_eq!(loaded, config);
}

// ---------------------------------------------------------------------------
// Permission errors (unix only)
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn load_unreadable_file_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let (_dir, path) = write_config("# valid toml");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError { .. }), "got {err:?}");

    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn save_to_readonly_directory_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let readonly_dir = dir.path().join("readonly");
    fs::create_dir(&readonly_dir).unwrap();
    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o444)).unwrap();

    let err = Config::default()
        .save_to_path(&readonly_dir.join("config.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::SaveError { .. }), "got {err:?}");

    fs::set_permissions(&readonly_dir, fs::Permissions::from_mode(0o755)).unwrap();
}
