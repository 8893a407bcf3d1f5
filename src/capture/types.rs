//! Common data types used across the capture subsystem.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outermost framing of a captured frame, as reported by the capture handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkType {
    /// DLT_EN10MB, frames start with an Ethernet II header.
    Ethernet,
    /// DLT_RAW / LINKTYPE_RAW, frames start directly with the IP header.
    RawIp,
    /// Any other data link type, kept as its numeric value.
    Other(i32),
}

impl LinkType {
    /// Maps a libpcap data link type number to a `LinkType`.
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            1 => LinkType::Ethernet,
            12 | 14 | 101 => LinkType::RawIp,
            n => LinkType::Other(n),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Ethernet => write!(f, "Ethernet"),
            LinkType::RawIp => write!(f, "Raw IP"),
            LinkType::Other(n) => write!(f, "DLT {}", n),
        }
    }
}

/// One frame exactly as read from the capture source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
    /// Length on the wire; larger than `data.len()` when the snapshot length truncated the frame.
    pub original_len: u32,
}

impl RawFrame {
    pub fn new(data: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        let original_len = data.len() as u32;
        Self {
            data,
            captured_at,
            original_len,
        }
    }
}

/// Result of a single blocking read on a [`FrameSource`](super::FrameSource).
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Frame(RawFrame),
    /// The read timeout elapsed without a frame. Not an error.
    TimedOut,
    EndOfCapture,
}

/// Parameters of a live capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub device: String,
    pub snapshot_len: i32,
    pub promiscuous: bool,
    /// Upper bound on how long one read may block. Liveness bound, not a per-packet deadline.
    pub read_timeout: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            device: "enp3s0".to_string(),
            snapshot_len: 1024,
            promiscuous: false,
            read_timeout: Duration::from_secs(2),
        }
    }
}

/// A capture-capable interface as reported by libpcap.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub description: Option<String>,
    pub addresses: Vec<IpAddr>,
}
