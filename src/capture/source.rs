//! Frame sources backed by libpcap.
//!
//! [`FrameSource`] is the seam between the capture loop and the operating
//! system: the loop only ever asks for the next frame. [`PcapSource`] owns the
//! pcap handle for its whole lifetime; dropping the source closes the handle.

use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use pcap::{Activated, Capture, Device};

use crate::error_handling::types::CaptureError;

use super::types::{CaptureSettings, DeviceInfo, LinkType, RawFrame, ReadOutcome};

/// Produces raw frames, one blocking read at a time.
pub trait FrameSource: Send {
    /// Framing of every frame this source yields.
    fn link_type(&self) -> LinkType;

    /// Blocks until a frame arrives, the read timeout elapses, or the source is exhausted.
    fn next_frame(&mut self) -> Result<ReadOutcome, CaptureError>;
}

pub struct PcapSource {
    label: String,
    capture: Capture<dyn Activated>,
    link_type: LinkType,
}

impl PcapSource {
    /// Opens a live capture session on `settings.device`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Open`] when the interface does not exist, the
    /// process lacks the privileges to capture, or the device is busy.
    pub fn open_live(settings: &CaptureSettings) -> Result<Self, CaptureError> {
        let open_err = |e: pcap::Error| CaptureError::Open {
            device: settings.device.clone(),
            reason: e.to_string(),
        };

        let timeout_ms = i32::try_from(settings.read_timeout.as_millis()).unwrap_or(i32::MAX);
        let capture = Capture::from_device(settings.device.as_str())
            .map_err(open_err)?
            .promisc(settings.promiscuous)
            .snaplen(settings.snapshot_len)
            .timeout(timeout_ms)
            .open()
            .map_err(open_err)?;

        let link_type = LinkType::from_dlt(capture.get_datalink().0);
        info!(
            "Opened live capture on {} (snaplen {}, promiscuous {}, timeout {}ms, link type {})",
            settings.device, settings.snapshot_len, settings.promiscuous, timeout_ms, link_type
        );

        Ok(Self {
            label: settings.device.clone(),
            capture: capture.into(),
            link_type,
        })
    }

    /// Opens a pcap savefile and replays its frames in order.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let label = path.as_ref().display().to_string();
        let capture = Capture::from_file(path.as_ref()).map_err(|e| CaptureError::Open {
            device: label.clone(),
            reason: e.to_string(),
        })?;

        let link_type = LinkType::from_dlt(capture.get_datalink().0);
        info!("Opened capture file {} (link type {})", label, link_type);

        Ok(Self {
            label,
            capture: capture.into(),
            link_type,
        })
    }
}

impl FrameSource for PcapSource {
    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn next_frame(&mut self) -> Result<ReadOutcome, CaptureError> {
        match self.capture.next_packet() {
            Ok(packet) => {
                let secs = packet.header.ts.tv_sec as i64;
                let nanos = (packet.header.ts.tv_usec as u32).saturating_mul(1000);
                let captured_at = DateTime::<Utc>::from_timestamp(secs, nanos).unwrap_or_else(Utc::now);
                Ok(ReadOutcome::Frame(RawFrame {
                    data: packet.data.to_vec(),
                    captured_at,
                    original_len: packet.header.len,
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(ReadOutcome::TimedOut),
            Err(pcap::Error::NoMorePackets) => Ok(ReadOutcome::EndOfCapture),
            Err(e) => Err(CaptureError::FrameRead(e.to_string())),
        }
    }
}

impl Drop for PcapSource {
    fn drop(&mut self) {
        debug!("Releasing capture handle on {}", self.label);
    }
}

/// Lists the interfaces libpcap can capture on.
pub fn list_devices() -> Result<Vec<DeviceInfo>, CaptureError> {
    let devices = Device::list().map_err(|e| CaptureError::DeviceList(e.to_string()))?;
    Ok(devices
        .into_iter()
        .map(|d| DeviceInfo {
            name: d.name,
            description: d.desc,
            addresses: d.addresses.iter().map(|a| a.addr).collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_savefile;

    #[test]
    fn test_open_live_unknown_device_fails() {
        let settings = CaptureSettings {
            device: "pktwatch-no-such-if0".to_string(),
            ..Default::default()
        };

        match PcapSource::open_live(&settings) {
            Err(CaptureError::Open { device, .. }) => assert_eq!(device, "pktwatch-no-such-if0"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opening a nonexistent interface must fail"),
        }
    }

    #[test]
    fn test_open_file_replays_frames_then_ends() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("two.pcap");
        write_savefile(&path, &[&[0xaa; 60], &[0xbb; 42]]);

        let mut source = PcapSource::open_file(&path).unwrap();
        assert_eq!(source.link_type(), LinkType::Ethernet);

        match source.next_frame().unwrap() {
            ReadOutcome::Frame(frame) => {
                assert_eq!(frame.data, vec![0xaa; 60]);
                assert_eq!(frame.original_len, 60);
                assert_eq!(frame.captured_at.timestamp(), 1_700_000_000);
            }
            other => panic!("expected a frame, got {:?}", other),
        }
        match source.next_frame().unwrap() {
            ReadOutcome::Frame(frame) => assert_eq!(frame.data.len(), 42),
            other => panic!("expected a frame, got {:?}", other),
        }
        assert_eq!(source.next_frame().unwrap(), ReadOutcome::EndOfCapture);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.pcap");
        assert!(matches!(
            PcapSource::open_file(&path),
            Err(CaptureError::Open { .. })
        ));
    }
}
