//! Layered configuration loading

use molar_core::config::{ConfigManager, ConfigurationError, LogFormat};
use molar_core::MolarConfig;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn no_env() -> Option<HashMap<String, String>> {
    Some(HashMap::new())
}

fn write(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

#[test]
fn test_missing_files_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let manager =
        ConfigManager::load_with_overrides(Some(dir.path().to_path_buf()), "test", no_env())
            .unwrap();

    assert_eq!(manager.config(), &MolarConfig::default());
    assert_eq!(manager.environment(), "test");
    assert_eq!(manager.config_directory(), dir.path());
}

#[test]
fn test_environment_file_overrides_base_file() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "molar.toml",
        r#"
        [database]
        host = "db.internal"
        max_connections = 4

        [query]
        default_limit = 25
        "#,
    );
    write(
        &dir,
        "molar.test.toml",
        r#"
        [database]
        max_connections = 2

        [logging]
        level = "molar_core=debug"
        format = "json"
        "#,
    );

    let manager =
        ConfigManager::load_with_overrides(Some(dir.path().to_path_buf()), "test", no_env())
            .unwrap();
    let config = manager.config();

    assert_eq!(config.database.host, "db.internal");
    assert_eq!(config.database.max_connections, 2);
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.query.default_limit, 25);
    assert_eq!(config.query.max_limit, 10_000);
    assert_eq!(config.logging.level.as_deref(), Some("molar_core=debug"));
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_environment_variables_take_precedence() {
    let dir = TempDir::new().unwrap();
    write(&dir, "molar.toml", "[query]\ndefault_limit = 25\n");

    let vars = HashMap::from([
        ("MOLAR__QUERY__DEFAULT_LIMIT".to_string(), "50".to_string()),
        ("MOLAR__DATABASE__SCHEMAS".to_string(), "public,chem".to_string()),
        ("MOLAR__EVENTSTORE__TABLE".to_string(), "journal".to_string()),
    ]);
    let manager =
        ConfigManager::load_with_overrides(Some(dir.path().to_path_buf()), "test", Some(vars))
            .unwrap();
    let config = manager.config();

    assert_eq!(config.query.default_limit, 50);
    assert_eq!(config.database.schemas, vec!["public", "chem"]);
    assert_eq!(config.eventstore.qualified_table(), "\"sourcing\".\"journal\"");
}

#[test]
fn test_inconsistent_limits_fail_validation() {
    let dir = TempDir::new().unwrap();
    write(&dir, "molar.toml", "[query]\ndefault_limit = 100\nmax_limit = 50\n");

    let err = ConfigManager::load_with_overrides(Some(dir.path().to_path_buf()), "test", no_env())
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::InvalidValue { ref field, .. } if field == "query.max_limit"
    ));
}

#[test]
fn test_malformed_values_are_reported() {
    let dir = TempDir::new().unwrap();
    write(&dir, "molar.toml", "[database]\nport = \"not-a-port\"\n");

    let err = ConfigManager::load_with_overrides(Some(dir.path().to_path_buf()), "test", no_env())
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::DeserializeError { .. }));

    write(&dir, "molar.toml", "[database\nport = 1\n");
    let err = ConfigManager::load_with_overrides(Some(dir.path().to_path_buf()), "test", no_env())
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::LoadError { .. }));
}
