use std::future::pending;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};
use tokio::task::{JoinError, JoinHandle};

use crate::broadcast::SubscriberRegistry;
use crate::capture::{CaptureLoop, FrameSource, PcapSource};
use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::pipeline::{CaptureStatus, Pipeline};
use crate::storage::MemoryStore;
use crate::web_interface::WebServer;

/// Wires the capture source, the pipeline and the web interface together
/// and owns their lifetime.
pub struct Controller {
    pub config: Config,
}

enum Exit {
    CaptureEnded(Result<Result<u64, CaptureError>, JoinError>),
    WebStopped(Result<(), JoinError>),
    Interrupted,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Opens the savefile when one is configured, the live interface otherwise.
    pub fn open_source(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        match &self.config.capture.read_file {
            Some(path) => Ok(Box::new(PcapSource::open_file(path)?)),
            None => Ok(Box::new(PcapSource::open_live(
                &self.config.capture_settings(),
            )?)),
        }
    }

    pub fn build_pipeline(&self) -> Arc<Pipeline> {
        Arc::new(Pipeline::new(
            Arc::new(MemoryStore::new(self.config.retention.max_frames)),
            Arc::new(SubscriberRegistry::new(
                self.config.broadcast.subscriber_backlog,
            )),
        ))
    }

    /// Runs until the capture ends and, if the web interface is up, until
    /// Ctrl-C. A capture that cannot be opened is fatal.
    pub async fn run(&self) -> Result<(), ControllerError> {
        let pipeline = self.build_pipeline();

        let source = match self.open_source() {
            Ok(source) => source,
            Err(e) => {
                error!("{}", e);
                pipeline.set_status(CaptureStatus::Failed(e.to_string()));
                return Err(e.into());
            }
        };

        self.run_with_source(pipeline, source).await
    }

    /// Drives an already opened source through `pipeline`.
    pub async fn run_with_source(
        &self,
        pipeline: Arc<Pipeline>,
        source: Box<dyn FrameSource>,
    ) -> Result<(), ControllerError> {
        let stop = Arc::new(AtomicBool::new(false));
        let capture_loop = CaptureLoop::new(Arc::clone(&pipeline), Arc::clone(&stop));
        let mut capture_task = tokio::task::spawn_blocking(move || capture_loop.run(source));

        let mut web_task = self.spawn_web(&pipeline);

        let exit = tokio::select! {
            joined = &mut capture_task => Exit::CaptureEnded(joined),
            joined = wait_for(&mut web_task) => Exit::WebStopped(joined),
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("Unable to listen for Ctrl-C: {}", e);
                }
                Exit::Interrupted
            }
        };

        let captured = match exit {
            Exit::CaptureEnded(joined) => {
                let captured = capture_outcome(joined);
                if web_task.is_some() {
                    info!("Capture finished, web interface stays up until Ctrl-C");
                    let exit = tokio::select! {
                        web = wait_for(&mut web_task) => Exit::WebStopped(web),
                        _ = tokio::signal::ctrl_c() => Exit::Interrupted,
                    };
                    if let Exit::WebStopped(web) = exit {
                        if let Err(e) = captured {
                            warn!("Capture had already ended with: {}", e);
                        }
                        return Err(web_stopped(web).into());
                    }
                }
                captured
            }
            Exit::WebStopped(joined) => {
                stop.store(true, Ordering::Relaxed);
                if let Err(e) = capture_outcome(capture_task.await) {
                    warn!("Capture ended with: {}", e);
                }
                return Err(web_stopped(joined).into());
            }
            Exit::Interrupted => {
                info!("Shutting down");
                stop.store(true, Ordering::Relaxed);
                capture_outcome(capture_task.await)
            }
        };

        if let Some(task) = web_task.take() {
            task.abort();
        }

        let frames = captured?;
        info!("{} frame(s) captured", frames);
        Ok(())
    }

    fn spawn_web(&self, pipeline: &Arc<Pipeline>) -> Option<JoinHandle<()>> {
        if !self.config.web.enabled {
            info!("Web interface disabled");
            return None;
        }
        let addr = SocketAddr::new(self.config.web.bind_address, self.config.web.port);
        let server = WebServer::new(Arc::clone(pipeline));
        Some(tokio::spawn(async move { server.start(addr).await }))
    }
}

/// Flattens the capture task result, a panicked or cancelled task included.
fn capture_outcome(
    joined: Result<Result<u64, CaptureError>, JoinError>,
) -> Result<u64, ControllerError> {
    match joined {
        Ok(captured) => Ok(captured?),
        Err(e) => Err(ControllerError::TaskFailed(e.to_string())),
    }
}

/// Resolves when the task does, never when there is no task.
async fn wait_for<T>(task: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

fn web_stopped(joined: Result<(), JoinError>) -> WebError {
    let reason = match joined {
        Ok(()) => "server exited".to_string(),
        Err(e) => e.to_string(),
    };
    error!("Web interface stopped: {}", reason);
    WebError::ServerStopped(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{LinkType, RawFrame};
    use crate::test_utils::{tcp_frame, udp_frame, write_savefile};
    use chrono::Utc;
    use tempfile::TempDir;

    fn offline_config(path: std::path::PathBuf) -> Config {
        let mut config = Config::default();
        config.capture.read_file = Some(path);
        config.web.enabled = false;
        config
    }

    #[test]
    fn test_build_pipeline_uses_retention_and_backlog() {
        let mut config = Config::default();
        config.retention.max_frames = 1;
        config.broadcast.subscriber_backlog = 1;
        let pipeline = Controller::new(config).build_pipeline();

        let mut sub = pipeline.registry().register();
        for data in [tcp_frame(&[]), udp_frame(&[])] {
            pipeline
                .ingest(RawFrame::new(data, Utc::now()), LinkType::Ethernet)
                .unwrap();
        }

        // backlog of one: the second publish found the channel full
        assert!(sub.receiver.try_recv().is_ok());
        assert!(pipeline.registry().is_empty());

        // retention of one: packet 0 was evicted
        assert!(pipeline.query().describe(0).is_err());
        assert!(pipeline.query().describe(1).is_ok());
    }

    #[tokio::test]
    async fn test_capture_outcome_reports_every_ending() {
        assert_eq!(capture_outcome(Ok(Ok(3))).unwrap(), 3);

        match capture_outcome(Ok(Err(CaptureError::FrameRead("link down".into())))) {
            Err(ControllerError::CaptureError(CaptureError::FrameRead(reason))) => {
                assert_eq!(reason, "link down")
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let panicked = tokio::task::spawn_blocking(|| -> Result<u64, CaptureError> {
            panic!("capture thread died")
        })
        .await;
        assert!(matches!(
            capture_outcome(panicked),
            Err(ControllerError::TaskFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_savefile_is_fatal() {
        let dir = TempDir::new().unwrap();
        let controller = Controller::new(offline_config(dir.path().join("missing.pcap")));

        match controller.run().await {
            Err(ControllerError::CaptureError(CaptureError::Open { .. })) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_offline_replay_fills_the_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("replay.pcap");
        let tcp = tcp_frame(b"hello");
        let udp = udp_frame(&[]);
        write_savefile(&path, &[&tcp, &udp]);

        let controller = Controller::new(offline_config(path));
        let pipeline = controller.build_pipeline();
        let source = controller.open_source().unwrap();
        controller
            .run_with_source(Arc::clone(&pipeline), source)
            .await
            .unwrap();

        assert_eq!(pipeline.status(), CaptureStatus::Stopped);
        let stats = pipeline.stats().unwrap();
        assert_eq!(stats.next_id, 2);
        assert_eq!(
            pipeline.query().describe(1).unwrap().tags(),
            vec!["Ethernet", "IPv4", "UDP"]
        );
    }
}
