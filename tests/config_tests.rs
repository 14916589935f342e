// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use smartcam::{Config, Facing, FilterMode};
use std::path::PathBuf;
use std::time::Duration;

fn temp_config_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("smartcam-config-{}", uuid::Uuid::new_v4()))
        .join("config.json")
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.facing, Facing::Back);
    assert!(!config.detection_enabled, "Detection should start disabled");
    assert_eq!(config.filter_mode, FilterMode::Normal);
    assert_eq!(config.long_press_threshold(), Duration::from_millis(350));
    assert_eq!(config.filter_tick_interval(), Duration::from_millis(120));
    assert_eq!(config.result_display(), Duration::from_millis(3000));
    assert_eq!(config.filter_label_display(), Duration::from_millis(1500));
}

#[test]
fn test_config_save_and_load() {
    let path = temp_config_path();
    let config = Config {
        facing: Facing::Front,
        detection_enabled: true,
        filter_mode: FilterMode::Sepia,
        ..Default::default()
    };

    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path), config);

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_missing_fields_use_defaults() {
    let path = temp_config_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "detection_enabled": true }"#).unwrap();

    let config = Config::load_from(&path);
    assert!(config.detection_enabled);
    assert_eq!(config.long_press_ms, 350);
    assert_eq!(config.analyzer_drain_timeout(), Duration::from_secs(2));

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let path = temp_config_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();

    assert_eq!(Config::load_from(&path), Config::default());

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[test]
fn test_binding_config_never_lights_front_camera() {
    let config = Config {
        facing: Facing::Front,
        torch_enabled: true,
        ..Default::default()
    };
    let binding = config.binding_config();
    assert_eq!(binding.facing, Facing::Front);
    assert!(!binding.torch_enabled);
    assert!(binding.recording_supported);
}

#[test]
fn test_output_directories_use_app_folder() {
    let config = Config::default();
    assert!(config.photo_directory().ends_with("SmartCamera"));
    assert!(config.video_directory().ends_with("SmartCamera"));

    let custom = Config {
        photo_dir: Some(PathBuf::from("/tmp/shots")),
        ..Default::default()
    };
    assert_eq!(custom.photo_directory(), PathBuf::from("/tmp/shots"));
}
