use std::io::Write;

use tempfile::NamedTempFile;

use scrubcam::ScrubcamConfig;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(json.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_complete_config_file() {
    let file = write_config(
        r#"{
            "RECORD": true,
            "RECORD_CONF_THRESHOLD": 0.6,
            "CAMERA_RESOLUTION": [1280, 720],
            "CAMERA_ROTATION": 180,
            "FILTER_CLASSES": ["deer", "fox"],
            "HEADLESS": true,
            "CONNECT_REMOTE_SERVER": true,
            "LORA_ON": true,
            "CAMERA_DEVICE": "stub://scene",
            "DETECTOR_BACKEND": "stub",
            "RECORD_DIR": "/var/lib/scrubcam/records",
            "REMOTE_SERVER_ADDR": "collector.example:8800",
            "LORA_DEVICE": "/dev/ttyS0"
        }"#,
    );

    let cfg = ScrubcamConfig::load(file.path()).expect("load config");

    assert!(cfg.record);
    assert!((cfg.record_conf_threshold - 0.6).abs() < f32::EPSILON);
    assert_eq!(cfg.camera_resolution, (1280, 720));
    assert_eq!(cfg.camera_rotation, 180);
    assert!(cfg.filter_classes.contains("deer"));
    assert!(cfg.filter_classes.contains("fox"));
    assert_eq!(cfg.filter_classes.len(), 2);
    assert!(cfg.headless);
    assert!(cfg.connect_remote_server);
    assert!(cfg.lora_on);
    assert_eq!(cfg.camera_device, "stub://scene");
    assert_eq!(cfg.detector_backend, "stub");
    assert_eq!(
        cfg.remote_server_addr.as_deref(),
        Some("collector.example:8800")
    );
}

#[test]
fn missing_required_field_is_rejected() {
    // No RECORD key.
    let file = write_config(
        r#"{
            "RECORD_CONF_THRESHOLD": 0.6,
            "CAMERA_RESOLUTION": [1280, 720],
            "CAMERA_ROTATION": 0,
            "FILTER_CLASSES": [],
            "HEADLESS": true,
            "CONNECT_REMOTE_SERVER": false,
            "LORA_ON": false,
            "CAMERA_DEVICE": "stub://scene",
            "DETECTOR_BACKEND": "stub",
            "RECORD_DIR": "records"
        }"#,
    );

    let err = ScrubcamConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn malformed_json_is_rejected() {
    let file = write_config("RECORD: true");
    assert!(ScrubcamConfig::load(file.path()).is_err());
}

#[test]
fn cross_field_validation_runs_on_load() {
    // CONNECT_REMOTE_SERVER without REMOTE_SERVER_ADDR.
    let file = write_config(
        r#"{
            "RECORD": true,
            "RECORD_CONF_THRESHOLD": 0.6,
            "CAMERA_RESOLUTION": [1280, 720],
            "CAMERA_ROTATION": 0,
            "FILTER_CLASSES": ["deer"],
            "HEADLESS": true,
            "CONNECT_REMOTE_SERVER": true,
            "LORA_ON": false,
            "CAMERA_DEVICE": "stub://scene",
            "DETECTOR_BACKEND": "stub",
            "RECORD_DIR": "records"
        }"#,
    );

    let err = ScrubcamConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("REMOTE_SERVER_ADDR"));
}

#[test]
fn missing_file_is_a_readable_error() {
    let err = ScrubcamConfig::load(std::path::Path::new("/nonexistent/scrubcam.json"))
        .unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}
