//! Loading `SpatialConfig` from TOML and JSON files.
//!
//! Run:
//!   cargo test -p spatial-core --features config --test config_files

use spatial_core::{ConfigError, SpatialConfig};

#[test]
fn partial_toml_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spatial.toml");
    std::fs::write(
        &path,
        r#"
[gesture]
translation_threshold = 0.1

[gesture.free_rotation_pulse]
duration_ms = 60
intensity = 0.5

[scroll]
projected_update_interval_ms = 100
"#,
    )
    .unwrap();

    let config = SpatialConfig::from_toml_file(&path).unwrap();
    let defaults = SpatialConfig::default();

    assert_eq!(config.gesture.translation_threshold, 0.1);
    assert_eq!(config.gesture.free_rotation_pulse.duration_ms, 60);
    assert_eq!(config.scroll.projected_update_interval_ms, 100);
    assert_eq!(
        config.gesture.rotation_threshold_degrees,
        defaults.gesture.rotation_threshold_degrees
    );
    assert_eq!(config.scroll.activation_distance, defaults.scroll.activation_distance);
}

#[test]
fn json_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spatial.json");
    let mut config = SpatialConfig::default();
    config.scroll.grace_ticks = 4;
    config.gesture.velocity.saturation_degrees_per_sec = 180.0;
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    assert_eq!(SpatialConfig::from_json_file(&path).unwrap(), config);
}

#[test]
fn invalid_values_are_reported_together() {
    let err = SpatialConfig::from_toml_str(
        r#"
[gesture]
rotation_threshold_degrees = 0.0

[scroll]
grace_ticks = 0
"#,
    )
    .unwrap_err();

    let ConfigError::Validation(errors) = err else {
        panic!("expected validation error, got {err}");
    };
    assert_eq!(errors.len(), 2, "{errors:?}");
}

#[test]
fn malformed_input_is_a_parse_error() {
    assert!(matches!(
        SpatialConfig::from_toml_str("[gesture"),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!(
        SpatialConfig::from_json_str("{"),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SpatialConfig::from_toml_file(dir.path().join("absent.toml")),
        Err(ConfigError::Io(_))
    ));
}
