use super::types::*;
use crate::capture::types::CaptureSettings;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments.
///
/// Every option is optional: an unset option leaves the value from the
/// configuration file (or the built-in default) untouched.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use pktwatch::configuration::config::{CliArgs, Config};
///
/// let args = CliArgs::parse();
/// let config = Config::load(&args).expect("invalid configuration");
/// println!("Capturing on {}", config.capture.device);
/// ```
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pktwatch")]
#[command(version)]
#[command(about = "Live packet capture with a real-time web view")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    ///
    /// # Command Line
    /// Use `--config <FILE>` or the `PKTWATCH_CONFIG` environment variable
    #[arg(short, long, env = "PKTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to capture on
    #[arg(short, long, env = "PKTWATCH_DEVICE")]
    pub device: Option<String>,

    /// Maximum number of bytes captured per frame
    #[arg(long)]
    pub snaplen: Option<i32>,

    /// Also capture frames not addressed to this host
    ///
    /// This is a boolean flag that doesn't take a value, its presence enables
    /// promiscuous mode
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub promiscuous: bool,

    /// Turn promiscuous mode off even if the configuration file enables it
    #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "promiscuous")]
    pub no_promiscuous: bool,

    /// Upper bound in milliseconds on how long a single read may block
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Replay a pcap savefile instead of capturing live
    #[arg(short, long)]
    pub read_file: Option<PathBuf>,

    /// Address the web interface binds to
    #[arg(long)]
    pub bind_address: Option<IpAddr>,

    /// Port of the web interface
    #[arg(short, long, env = "PKTWATCH_PORT")]
    pub port: Option<u16>,

    /// Do not start the web interface
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_web: bool,

    /// Number of frames kept in memory, 0 keeps all of them
    #[arg(long)]
    pub max_frames: Option<usize>,

    /// Print the interfaces available for capture and exit
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub list_devices: bool,
}

/// Application configuration.
///
/// Built from three layers, later ones winning: built-in defaults, the
/// optional TOML file, then command-line arguments and environment variables.
///
/// # Fields Overview
///
/// - `capture`: interface, snapshot length, promiscuous mode, read timeout,
///   optional savefile to replay
/// - `web`: whether to serve the HTTP/WebSocket interface, and where
/// - `retention`: how many frames the packet store keeps
/// - `broadcast`: per-subscriber backlog before a slow client is dropped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub capture: CaptureConfig,
    pub web: WebConfig,
    pub retention: RetentionConfig,
    pub broadcast: BroadcastConfig,
}

impl Config {
    /// Reads a configuration file. Missing sections and keys take their defaults.
    ///
    /// # Errors
    ///
    /// * `ConfigError::IoError` if the file cannot be read
    /// * `ConfigError::TomlError` if it is not valid TOML or has unknown keys
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Builds the effective configuration for `args` and validates it.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_args(&mut self, args: &CliArgs) {
        if let Some(device) = &args.device {
            self.capture.device = device.clone();
        }
        if let Some(snaplen) = args.snaplen {
            self.capture.snapshot_len = snaplen;
        }
        if args.promiscuous {
            self.capture.promiscuous = true;
        }
        if args.no_promiscuous {
            self.capture.promiscuous = false;
        }
        if let Some(timeout) = args.timeout_ms {
            self.capture.read_timeout_ms = timeout;
        }
        if let Some(path) = &args.read_file {
            self.capture.read_file = Some(path.clone());
        }
        if let Some(addr) = args.bind_address {
            self.web.bind_address = addr;
        }
        if let Some(port) = args.port {
            self.web.port = port;
        }
        if args.no_web {
            self.web.enabled = false;
        }
        if let Some(max) = args.max_frames {
            self.retention.max_frames = max;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.device.trim().is_empty() && self.capture.read_file.is_none() {
            return Err(ConfigError::EmptyDevice);
        }
        if self.capture.snapshot_len <= 0 {
            return Err(ConfigError::InvalidSnapshotLength(self.capture.snapshot_len));
        }
        if self.capture.read_timeout_ms == 0 {
            return Err(ConfigError::InvalidReadTimeout);
        }
        if self.broadcast.subscriber_backlog == 0 {
            return Err(ConfigError::InvalidBacklog);
        }
        Ok(())
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            device: self.capture.device.clone(),
            snapshot_len: self.capture.snapshot_len,
            promiscuous: self.capture.promiscuous,
            read_timeout: Duration::from_millis(self.capture.read_timeout_ms),
        }
    }
}
