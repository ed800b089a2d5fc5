use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const VALID_ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// Raw on-disk configuration as written by the device operator.
///
/// Every field is required; the core applies no defaults. Keys are the
/// upper-case names the deployment tooling has always used.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ConfigFile {
    record: bool,
    record_conf_threshold: f32,
    camera_resolution: (u32, u32),
    camera_rotation: u16,
    filter_classes: Vec<String>,
    headless: bool,
    connect_remote_server: bool,
    lora_on: bool,
    camera_device: String,
    detector_backend: String,
    record_dir: PathBuf,
    remote_server_addr: Option<String>,
    lora_device: Option<PathBuf>,
}

/// Validated operational parameters, immutable for the process lifetime.
///
/// Constructed once in `main` and passed into the dispatcher; nothing else
/// in the crate reads configuration from the environment.
#[derive(Debug, Clone)]
pub struct ScrubcamConfig {
    /// Global recording toggle.
    pub record: bool,
    /// Recording gate; the top detection must be strictly above this.
    pub record_conf_threshold: f32,
    pub camera_resolution: (u32, u32),
    /// Sensor rotation in degrees, one of 0/90/180/270.
    pub camera_rotation: u16,
    /// Class allow-list for transmission/persistence/alerting.
    /// Matching is case-sensitive exact string comparison.
    pub filter_classes: HashSet<String>,
    pub headless: bool,
    pub connect_remote_server: bool,
    pub lora_on: bool,
    /// Capture device URL: `stub://...` or a local device node.
    pub camera_device: String,
    /// Detector backend name, resolved through the backend registry.
    pub detector_backend: String,
    /// Directory where qualifying frames are persisted.
    pub record_dir: PathBuf,
    /// Collector address; required when `connect_remote_server` is set.
    pub remote_server_addr: Option<String>,
    /// Serial device of the LoRa modem; required when `lora_on` is set.
    pub lora_device: Option<PathBuf>,
}

impl ScrubcamConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
        let file: ConfigFile = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ConfigFile) -> Self {
        Self {
            record: file.record,
            record_conf_threshold: file.record_conf_threshold,
            camera_resolution: file.camera_resolution,
            camera_rotation: file.camera_rotation,
            filter_classes: file.filter_classes.into_iter().collect(),
            headless: file.headless,
            connect_remote_server: file.connect_remote_server,
            lora_on: file.lora_on,
            camera_device: file.camera_device,
            detector_backend: file.detector_backend,
            record_dir: file.record_dir,
            remote_server_addr: file.remote_server_addr,
            lora_device: file.lora_device,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.record_conf_threshold) {
            return Err(anyhow!(
                "RECORD_CONF_THRESHOLD must be within [0, 1], got {}",
                self.record_conf_threshold
            ));
        }
        if !VALID_ROTATIONS.contains(&self.camera_rotation) {
            return Err(anyhow!(
                "CAMERA_ROTATION must be one of {:?}, got {}",
                VALID_ROTATIONS,
                self.camera_rotation
            ));
        }
        let (width, height) = self.camera_resolution;
        if width == 0 || height == 0 {
            return Err(anyhow!(
                "CAMERA_RESOLUTION must be non-zero, got [{}, {}]",
                width,
                height
            ));
        }
        if self.camera_device.trim().is_empty() {
            return Err(anyhow!("CAMERA_DEVICE must not be empty"));
        }
        if self.detector_backend.trim().is_empty() {
            return Err(anyhow!("DETECTOR_BACKEND must not be empty"));
        }
        if self.connect_remote_server
            && self
                .remote_server_addr
                .as_deref()
                .map_or(true, |addr| addr.trim().is_empty())
        {
            return Err(anyhow!(
                "REMOTE_SERVER_ADDR is required when CONNECT_REMOTE_SERVER is true"
            ));
        }
        if self.lora_on && self.lora_device.is_none() {
            return Err(anyhow!("LORA_DEVICE is required when LORA_ON is true"));
        }
        Ok(())
    }
}
