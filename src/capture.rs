pub mod capture_loop;
pub mod source;
pub mod types;

pub use capture_loop::CaptureLoop;
pub use source::{list_devices, FrameSource, PcapSource};
pub use types::{CaptureSettings, DeviceInfo, LinkType, RawFrame, ReadOutcome};
