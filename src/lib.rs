//! ScrubCam field camera daemon.
//!
//! Control loop of an unattended field camera: capture a frame, run object
//! detection, and decide - from confidence, a class allow-list, and a
//! global recording toggle - whether to persist, transmit, and radio-alert
//! on the result, while keeping an optional heartbeat toward a remote
//! collector.
//!
//! # Module Structure
//!
//! - `config`: validated immutable configuration, loaded once at startup
//! - `frame`: reusable encoded-frame buffer
//! - `capture`: camera frame sources (synthetic `stub://`, V4L2)
//! - `detect`: detector backends, detection results, frame persistence
//! - `policy`: the pure per-cycle decision policy
//! - `remote`: collector link and heartbeat timer
//! - `display`: optional local detection preview
//! - `lora`: optional radio alerts
//! - `sighting`: append-only sighting log
//! - `dispatch`: the loop that ties all of it together

pub mod capture;
pub mod config;
pub mod detect;
pub mod dispatch;
pub mod display;
pub mod frame;
pub mod lora;
pub mod policy;
pub mod remote;
pub mod sighting;

pub use capture::{Camera, CameraSettings, CaptureStats};
pub use config::ScrubcamConfig;
pub use detect::{BackendRegistry, BoundingBox, Detection, DetectorBackend, ObjectDetector, StubBackend};
pub use dispatch::{CancelToken, Dispatcher};
pub use display::Display;
pub use frame::FrameBuffer;
pub use lora::LoRaSender;
pub use policy::{decide, Verdict};
pub use remote::{read_message, HeartbeatClock, RemoteClient, WireMessage, HEARTBEAT_INTERVAL};
pub use sighting::SightingLog;
