use crate::config::{
    SessionConfig, ENV_OBJECT_TIMEOUT_MS, ENV_POLL_INTERVAL_MS, ENV_STARTUP_GRACE_MS,
};
use std::collections::HashMap;
use std::time::Duration;

#[test]
fn test_defaults() {
    let config = SessionConfig::default();
    assert_eq!(config.object_timeout(), Duration::from_secs(20));
    assert_eq!(config.wait_timeout_ms, 20_000);
    assert_eq!(config.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.program, "qtcreator");
    assert!(config.validate().is_ok());
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> =
        HashMap::from([(ENV_OBJECT_TIMEOUT_MS, "500"), (ENV_POLL_INTERVAL_MS, " 20 ")]);
    let mut config = SessionConfig::default();
    config
        .apply_env(|key| env.get(key).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(config.object_timeout_ms, 500);
    assert_eq!(config.poll_interval_ms, 20);
    assert_eq!(config.wait_timeout_ms, 20_000);

    let wait = config.wait(None);
    assert_eq!(wait.timeout(), Duration::from_secs(20));
    assert_eq!(wait.poll_interval(), Duration::from_millis(20));
    assert_eq!(config.wait(Some(5)).timeout(), Duration::from_millis(5));
}

#[test]
fn test_bad_env_values() {
    let mut config = SessionConfig::default();
    assert!(config
        .apply_env(|key| (key == ENV_OBJECT_TIMEOUT_MS).then(|| "soon".to_string()))
        .is_err());
    assert!(config
        .apply_env(|key| (key == ENV_POLL_INTERVAL_MS).then(|| "0".to_string()))
        .is_err());
}

#[test]
fn test_from_file_keeps_missing_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scout.json");
    std::fs::write(&path, r#"{"object_timeout_ms": 1500, "program_args": ["-noload", "Welcome"]}"#)
        .unwrap();
    let config = SessionConfig::from_file(&path).unwrap();
    assert_eq!(config.object_timeout_ms, 1500);
    assert_eq!(config.poll_interval_ms, 100);
    assert_eq!(config.program_args, vec!["-noload", "Welcome"]);

    std::fs::write(&path, "{not json").unwrap();
    assert!(SessionConfig::from_file(&path).is_err());
}

#[test]
fn test_from_env_reads_process_environment() {
    // no other test touches the real environment
    std::env::set_var(ENV_STARTUP_GRACE_MS, "750");
    let config = SessionConfig::from_env();
    std::env::remove_var(ENV_STARTUP_GRACE_MS);

    let config = config.unwrap();
    assert_eq!(config.startup_grace_ms, 750);
    assert_eq!(config.program, "qtcreator");
}
