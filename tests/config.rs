use perfwatch::cli::Cli;
use perfwatch::config::Config;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_load_full_valid_config() {
    let file = config_file(
        r#"
        log_file = "/var/log/perf.log"
        interval_seconds = 30
        log_level = "perfwatch=debug"
        compensate_measurement_window = true
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_file, PathBuf::from("/var/log/perf.log"));
    assert_eq!(config.interval_seconds, 30);
    assert_eq!(config.log_level, "perfwatch=debug");
    assert!(config.compensate_measurement_window);
}

#[test]
fn test_load_default_values() {
    let file = config_file("");

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let file = config_file("interval_seconds = 2");

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config.interval_seconds, 2);
    assert_eq!(config.log_file, PathBuf::from("system_performance.log"));
}

#[test]
fn test_cli_overrides_file() {
    let file = config_file(
        r#"
        interval_seconds = 30
        log_file = "from-file.log"
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        interval: Some(7),
        compensate_drift: true,
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config.interval_seconds, 7);
    assert_eq!(config.log_file, PathBuf::from("from-file.log"));
    assert!(config.compensate_measurement_window);
}

#[test]
fn test_invalid_value_type() {
    let file = config_file(r#"interval_seconds = "five""#);

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    assert!(Config::load(&cli).is_err());
}

#[test]
fn test_zero_interval_rejected() {
    let file = config_file("interval_seconds = 0");

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let err = Config::load(&cli).unwrap_err();
    assert!(err.to_string().contains("interval_seconds"));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cli = Cli {
        config: Some(dir.path().join("absent.toml")),
        ..Default::default()
    };

    assert!(Config::load(&cli).is_err());
}
