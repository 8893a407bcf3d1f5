//! The live capture loop.
//!
//! One blocking task reads frames from a [`FrameSource`] and feeds them to the
//! [`Pipeline`]. It is the only writer of the packet store. The loop ends when
//! the source is exhausted, a read fails, or the stop flag is raised; the flag
//! is checked before every read, so a stop request is honoured within one
//! read timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, trace};

use crate::error_handling::types::CaptureError;
use crate::pipeline::{CaptureStatus, Pipeline};

use super::source::FrameSource;
use super::types::ReadOutcome;

pub struct CaptureLoop {
    pipeline: Arc<Pipeline>,
    stop: Arc<AtomicBool>,
}

impl CaptureLoop {
    pub fn new(pipeline: Arc<Pipeline>, stop: Arc<AtomicBool>) -> Self {
        Self { pipeline, stop }
    }

    /// Runs until the source ends, a read fails, or a stop is requested.
    ///
    /// Takes ownership of `source` and drops it before returning, which
    /// releases the capture handle on every exit path.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` with the number of frames ingested
    /// * `Err(CaptureError::FrameRead)` when the source reports a read failure
    pub fn run(&self, mut source: Box<dyn FrameSource>) -> Result<u64, CaptureError> {
        let link_type = source.link_type();
        self.pipeline.set_status(CaptureStatus::Running);
        info!("Capture loop started (link type {})", link_type);

        let mut ingested = 0u64;
        let result = loop {
            if self.stop.load(Ordering::Relaxed) {
                info!("Capture stop requested");
                break Ok(ingested);
            }

            match source.next_frame() {
                Ok(ReadOutcome::Frame(frame)) => match self.pipeline.ingest(frame, link_type) {
                    Ok(id) => {
                        ingested += 1;
                        trace!("Ingested packet {}", id);
                    }
                    Err(e) => break Err(CaptureError::from(e)),
                },
                Ok(ReadOutcome::TimedOut) => continue,
                Ok(ReadOutcome::EndOfCapture) => {
                    info!("Capture source exhausted");
                    break Ok(ingested);
                }
                Err(e) => break Err(e),
            }
        };

        drop(source);

        match &result {
            Ok(n) => {
                info!("Capture loop stopped after {} frame(s)", n);
                self.pipeline.set_status(CaptureStatus::Stopped);
            }
            Err(e) => {
                error!("Capture loop terminated: {}", e);
                self.pipeline.set_status(CaptureStatus::Failed(e.to_string()));
            }
        }
        result
    }
}
