//! Integration tests for logging configuration and initialization

use custodia::config::LoggingConfig;
use custodia::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert_eq!(config.log_level, "info");
    assert!(!config.file_enabled);
    assert_eq!(config.file_rotation, "daily");
    assert!(config.json_format);
}

#[test]
fn test_invalid_log_level_rejected() {
    let config = LoggingConfig {
        log_level: "verbose".to_string(),
        ..LoggingConfig::default()
    };
    assert!(init_logging(&config).is_err());
}

#[test]
fn test_file_logging_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        file_enabled: true,
        file_dir: log_path.to_string_lossy().to_string(),
        ..LoggingConfig::default()
    };

    // tracing_subscriber can only install one global subscriber per
    // process, so this is the single test that initializes it.
    let guard = init_logging(&config).unwrap();
    assert!(log_path.exists());
    drop(guard);
}
