use rust_wallcover::config::{Configuration, SettingKey};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_snake_case_config() {
    let yaml = r#"
image_filepath: "file:///sdcard/Pictures/beach.jpg"
enable_multi: false
enable_per_screen: true
multi_rotation_time: "60"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.source_path(), PathBuf::from("/sdcard/Pictures/beach.jpg"));
    assert!(!cfg.enable_multi);
    assert!(cfg.enable_per_screen);
    assert_eq!(cfg.multi_rotation_time, Duration::from_secs(60));
    assert_eq!(cfg.screen_count, 5);
}

#[test]
fn parse_rotation_time_forms() {
    for (raw, secs) in [("30", 30), ("\"45\"", 45), ("\"2m\"", 120), ("\"1h 30s\"", 3630)] {
        let yaml = format!("multi_rotation_time: {raw}\n");
        let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(cfg.multi_rotation_time, Duration::from_secs(secs), "{raw}");
    }
}

#[test]
fn reject_negative_rotation_time() {
    let err = serde_yaml::from_str::<Configuration>("multi_rotation_time: -5\n").unwrap_err();
    assert!(err.to_string().contains("negative"), "{err}");
}

#[test]
fn validated_rejects_zero_interval() {
    let cfg: Configuration = serde_yaml::from_str("multi_rotation_time: 0\n").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn load_from_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("wallcover.yaml");
    std::fs::write(
        &path,
        "image_filepath: /photos/a.jpg\nscreen_count: 3\nbackground_color: [10, 20, 30]\n",
    )
    .unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap().validated().unwrap();
    assert_eq!(cfg.screen_count, 3);
    assert_eq!(cfg.background_color, [10, 20, 30]);
    assert!(Configuration::from_yaml_file(tmp.path().join("missing.yaml")).is_err());
}

#[test]
fn setting_keys_name_yaml_fields() {
    // Setting each key's field in YAML must be reported as that key changing.
    for (key, value) in [
        (SettingKey::ImageFilepath, "/photos/b.jpg"),
        (SettingKey::EnableMulti, "false"),
        (SettingKey::EnablePerScreen, "false"),
        (SettingKey::MultiRotationTime, "5"),
        (SettingKey::ScreenCount, "3"),
    ] {
        let yaml = format!("{}: {value}\n", key.as_str());
        let cfg: Configuration = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            Configuration::changed_keys(&Configuration::default(), &cfg),
            vec![key],
            "{yaml}"
        );
    }
}
