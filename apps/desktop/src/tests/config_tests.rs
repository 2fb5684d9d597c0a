use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::default();
    assert_eq!(settings.database_url, "sqlite://./data/session.db");
    assert_eq!(settings.backend_program, "python");
    assert_eq!(
        settings.verification_policy(),
        VerificationPolicy {
            interval: Duration::from_secs(2),
            max_attempts: 150,
        }
    );
}

#[test]
fn file_values_accept_strings_and_numbers() {
    let mut settings = Settings::default();
    settings
        .apply_file(
            r#"
api_key = "abc"
backend_dir = "/srv/backend"
verification_poll_ms = 500
verification_max_attempts = "20"
"#,
        )
        .expect("parse");

    assert_eq!(settings.api_key, "abc");
    assert_eq!(settings.backend_dir, PathBuf::from("/srv/backend"));
    assert_eq!(settings.verification_poll_ms, 500);
    assert_eq!(settings.verification_max_attempts, 20);
}

#[test]
fn invalid_toml_is_an_error() {
    let mut settings = Settings::default();
    assert!(settings.apply_file("api_key = ").is_err());
}

#[test]
fn malformed_numbers_keep_previous_value() {
    let mut settings = Settings::default();
    settings.apply_env(env_of(&[
        ("APP__VERIFICATION_POLL_MS", "soon"),
        ("APP__VERIFICATION_MAX_ATTEMPTS", "-3"),
    ]));
    assert_eq!(settings.verification_poll_ms, 2_000);
    assert_eq!(settings.verification_max_attempts, 150);
}

#[test]
fn layers_apply_in_order() {
    let mut settings = Settings::default();
    settings
        .apply_file("database_url = \"sqlite://file.db\"\napi_key = \"from-file\"")
        .expect("parse");
    settings.apply_env(env_of(&[
        ("APP__API_KEY", "from-env"),
        ("APP__DOWNLOAD_DIR", "/tmp/env-downloads"),
    ]));
    settings.apply_overrides(&SettingsOverrides {
        download_dir: Some(PathBuf::from("/tmp/flag-downloads")),
        ..SettingsOverrides::default()
    });

    assert_eq!(settings.database_url, "sqlite://file.db");
    assert_eq!(settings.api_key, "from-env");
    assert_eq!(settings.download_dir, PathBuf::from("/tmp/flag-downloads"));
}

#[test]
fn explicit_config_file_must_exist() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let missing = env::temp_dir().join(format!("securedoc_missing_{suffix}.toml"));
    let err = load_settings(&SettingsOverrides {
        config: Some(missing),
        ..SettingsOverrides::default()
    })
    .expect_err("missing file");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn explicit_config_file_is_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("custom.toml");
    fs::write(&path, "backend_program = \"python3\"\n").expect("write");

    let settings = load_settings(&SettingsOverrides {
        config: Some(path),
        ..SettingsOverrides::default()
    })
    .expect("settings");
    assert_eq!(settings.backend_program, "python3");
}

#[test]
fn zero_interval_is_clamped() {
    let settings = Settings {
        verification_poll_ms: 0,
        verification_max_attempts: 0,
        ..Settings::default()
    };
    let policy = settings.verification_policy();
    assert_eq!(policy.interval, Duration::from_millis(1));
    assert_eq!(policy.max_attempts, 1);
}
