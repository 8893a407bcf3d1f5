use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[capture]` section.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub device: String,
    pub snapshot_len: i32,
    pub promiscuous: bool,
    pub read_timeout_ms: u64,
    /// Replay a pcap savefile instead of capturing live.
    pub read_file: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: String::from("enp3s0"),
            snapshot_len: 1024,
            promiscuous: false,
            read_timeout_ms: 2000,
            read_file: None,
        }
    }
}

/// `[web]` section.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    pub enabled: bool,
    pub bind_address: IpAddr,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
        }
    }
}

/// `[retention]` section.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    /// Oldest frames are evicted past this count. `0` keeps everything.
    pub max_frames: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { max_frames: 100_000 }
    }
}

/// `[broadcast]` section.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Messages a subscriber may fall behind before it is dropped.
    pub subscriber_backlog: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            subscriber_backlog: 256,
        }
    }
}
