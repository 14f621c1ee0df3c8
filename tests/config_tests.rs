use std::fs;
use std::path::PathBuf;

use blockfall::config::{
    config_file_path, load_config, load_config_from, save_config_to, Config, ConfigError,
    CONFIG_ENV_VAR,
};
use blockfall::game::Surface;
use serial_test::serial;
use tempfile::TempDir;

#[test]
fn defaults_match_classic_surface() {
    let config = Config::default();
    assert_eq!(config.surface(), Surface::new(20, 20));
    assert_eq!(config.tick_ms, 90);
    assert_eq!(config.seed, None);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let config = Config::from_toml("width = 30\nseed = 7\n").unwrap();
    assert_eq!(config.width, 30);
    assert_eq!(config.height, 20);
    assert_eq!(config.seed, Some(7));
    assert_eq!(config.log_level, "info");
}

#[test]
fn tiny_surface_is_rejected() {
    let err = Config::from_toml("width = 6").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidSurface { width: 6, height: 20, .. }
    ));
}

#[test]
fn oversized_surface_is_rejected() {
    let err = Config::from_toml("width = 30000\nheight = 30000").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidSurface { width: 30000, height: 30000, .. }
    ));

    let err = Config::from_toml("height = 257").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSurface { height: 257, .. }));

    assert!(Config::from_toml("width = 256\nheight = 256").is_ok());
}

#[test]
fn zero_tick_is_rejected() {
    let err = Config::from_toml("tick_ms = 0").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidTick));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = Config::from_toml("width = \"wide\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn loads_file_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "height = 24\ntick_ms = 120\nlog_file = \"game.log\"\n").unwrap();

    let config = load_config_from(&path).unwrap();

    assert_eq!(config.height, 24);
    assert_eq!(config.tick_ms, 120);
    assert_eq!(config.log_file, PathBuf::from("game.log"));
}

#[test]
fn saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config {
        width: 24,
        seed: Some(3),
        ..Config::default()
    };

    save_config_to(&path, &config).unwrap();

    assert!(path.exists());
    assert_eq!(load_config_from(&path).unwrap(), config);
}

#[test]
fn default_config_serializes_without_seed() {
    let text = Config::default().to_toml().unwrap();
    assert!(text.contains("width = 20"));
    assert!(text.contains("tick_ms = 90"));
    assert!(!text.contains("seed"));
}

#[test]
#[serial]
fn env_var_overrides_config_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "width = 12\nheight = 12\n").unwrap();

    std::env::set_var(CONFIG_ENV_VAR, &path);
    let resolved = config_file_path();
    let config = load_config();
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, path);
    assert_eq!(config.unwrap().surface(), Surface::new(12, 12));
}

#[test]
#[serial]
fn default_path_without_env_var() {
    std::env::remove_var(CONFIG_ENV_VAR);
    let path = config_file_path();
    assert!(path.ends_with("config.toml") || path.ends_with("blockfall.toml"));
}
