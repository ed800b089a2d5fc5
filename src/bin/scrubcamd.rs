//! scrubcamd - ScrubCam field camera daemon
//!
//! This daemon:
//! 1. Loads the device configuration from the file named on the command line
//! 2. Opens the capture device and the detector backend
//! 3. Connects optional collaborators (collector link, preview, LoRa radio)
//! 4. Runs the capture→infer→decide→dispatch loop until interrupted

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use scrubcam::{
    Camera, CameraSettings, CancelToken, Dispatcher, Display, LoRaSender, ObjectDetector,
    RemoteClient, ScrubcamConfig, SightingLog,
};

const SIGHTING_LOG_PATH: &str = "what_was_seen.log";

#[derive(Parser, Debug)]
#[command(author, version, about = "ScrubCam field camera daemon")]
struct Args {
    /// Path to the device configuration file.
    config_file: PathBuf,

    /// Continue a previous recording session on the remote collector.
    #[arg(short = 'c', long = "continue")]
    continue_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ScrubcamConfig::load(&args.config_file)?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel()).expect("error setting Ctrl-C handler");
    }

    let mut camera = Camera::new(CameraSettings::from_config(&config))?;
    camera.connect()?;

    let detector = ObjectDetector::from_config(&config)?;

    let remote = if config.connect_remote_server {
        let addr = config
            .remote_server_addr
            .as_deref()
            .ok_or_else(|| anyhow!("REMOTE_SERVER_ADDR missing"))?;
        let mut client = RemoteClient::connect(addr)?;
        client.send_host_configs(&config.filter_classes, args.continue_run)?;
        Some(client)
    } else {
        log::info!("remote collector disabled");
        None
    };

    let display = if config.headless {
        None
    } else {
        Some(Display::new())
    };

    let lora = if config.lora_on {
        let device = config
            .lora_device
            .clone()
            .ok_or_else(|| anyhow!("LORA_DEVICE missing"))?;
        Some(LoRaSender::new(device))
    } else {
        log::info!("LoRa alerting disabled");
        None
    };

    let sightings = SightingLog::new(SIGHTING_LOG_PATH);

    log::info!(
        "scrubcamd running. device={} backend={} record={}",
        config.camera_device,
        config.detector_backend,
        config.record
    );

    let mut dispatcher = Dispatcher::new(config, camera, detector, sightings, cancel)
        .with_remote(remote)
        .with_display(display)
        .with_lora(lora);
    dispatcher.run()
}
