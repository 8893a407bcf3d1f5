use std::net::SocketAddr;
use std::sync::Arc;

use log::info;
use warp::{Filter, Rejection, Reply};

use super::routes::*;
use crate::pipeline::Pipeline;

/// Web server for the real-time stream, detail queries and dashboard
pub struct WebServer {
    pipeline: Arc<Pipeline>,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        dashboard_route()
            .or(assets_route())
            .or(websocket_route(Arc::clone(&self.pipeline)))
            .or(packet_layers_route(Arc::clone(&self.pipeline)))
            .or(packet_detail_route(Arc::clone(&self.pipeline)))
            .or(stats_route(Arc::clone(&self.pipeline)))
    }

    /// Serve until the future is dropped.
    pub async fn start(&self, addr: SocketAddr) {
        info!("Web interface listening on http://{}", addr);
        warp::serve(self.routes()).run(addr).await;
    }
}
