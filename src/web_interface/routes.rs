use std::sync::Arc;

use log::error;
use rust_embed::RustEmbed;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::ws::Ws;
use warp::{reply, Filter, Rejection, Reply};

use super::subscriber::serve_subscriber;
use super::types::ApiError;
use crate::error_handling::types::QueryError;
use crate::pipeline::Pipeline;
use crate::query::QueryService;
use futures::StreamExt;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/assets/"]
struct Assets;

fn json_error(message: &str, status: StatusCode) -> Response {
    reply::with_status(reply::json(&ApiError::new(message)), status).into_response()
}

pub(crate) fn asset_reply(name: &str) -> Response {
    match Assets::get(name) {
        Some(file) => {
            let mime = mime_guess::from_path(name).first_or_octet_stream();
            reply::with_header(file.data.into_owned(), "Content-Type", mime.to_string())
                .into_response()
        }
        None => json_error("Asset not found", StatusCode::NOT_FOUND),
    }
}

pub(crate) fn packet_detail_reply(query: &QueryService, raw_id: &str) -> Response {
    let id = match raw_id.parse::<u64>() {
        Ok(id) => id,
        Err(_) => return json_error("Invalid packet id", StatusCode::BAD_REQUEST),
    };

    match query.describe(id) {
        Ok(detail) => reply::with_status(detail.to_string(), StatusCode::OK).into_response(),
        Err(QueryError::NotFound(_)) => {
            reply::with_status("Packet does not exist.\n".to_string(), StatusCode::NOT_FOUND)
                .into_response()
        }
        Err(e) => {
            error!("Detail query for packet {} failed: {}", id, e);
            json_error("Failed to load packet", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub(crate) fn packet_layers_reply(query: &QueryService, raw_id: &str) -> Response {
    let id = match raw_id.parse::<u64>() {
        Ok(id) => id,
        Err(_) => return json_error("Invalid packet id", StatusCode::BAD_REQUEST),
    };

    match query.describe(id) {
        Ok(detail) => reply::with_status(reply::json(&detail), StatusCode::OK).into_response(),
        Err(QueryError::NotFound(_)) => json_error("Packet does not exist", StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Layer query for packet {} failed: {}", id, e);
            json_error("Failed to load packet", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub(crate) fn stats_reply(pipeline: &Pipeline) -> Response {
    match pipeline.stats() {
        Ok(stats) => reply::with_status(reply::json(&stats), StatusCode::OK).into_response(),
        Err(e) => {
            error!("Unable to collect stats: {}", e);
            json_error("Failed to collect stats", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| asset_reply("index.html"))
}

/// GET /assets/:name
pub fn assets_route() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("assets" / String)
        .and(warp::get())
        .map(|name: String| asset_reply(&name))
}

/// GET /api/ws
pub fn websocket_route(
    pipeline: Arc<Pipeline>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "ws")
        .and(warp::ws())
        .map(move |ws: Ws| {
            let registry = Arc::clone(pipeline.registry());
            ws.on_upgrade(move |socket| {
                let (tx, rx) = socket.split();
                serve_subscriber(registry, tx, rx)
            })
        })
}

/// GET /api/packet/:id
pub fn packet_detail_route(
    pipeline: Arc<Pipeline>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "packet" / String)
        .and(warp::get())
        .map(move |id: String| packet_detail_reply(pipeline.query(), &id))
}

/// GET /api/packet/:id/layers
pub fn packet_layers_route(
    pipeline: Arc<Pipeline>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "packet" / String / "layers")
        .and(warp::get())
        .map(move |id: String| packet_layers_reply(pipeline.query(), &id))
}

/// GET /api/stats
pub fn stats_route(
    pipeline: Arc<Pipeline>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "stats")
        .and(warp::get())
        .map(move || stats_reply(&pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::SubscriberRegistry;
    use crate::capture::types::{LinkType, RawFrame};
    use crate::storage::MemoryStore;
    use crate::test_utils::tcp_frame;
    use chrono::Utc;

    fn pipeline_with_one_frame() -> Pipeline {
        let pipeline = Pipeline::new(
            Arc::new(MemoryStore::unbounded()),
            Arc::new(SubscriberRegistry::new(4)),
        );
        pipeline
            .ingest(RawFrame::new(tcp_frame(&[]), Utc::now()), LinkType::Ethernet)
            .unwrap();
        pipeline
    }

    #[test]
    fn test_packet_detail_statuses() {
        let pipeline = pipeline_with_one_frame();
        assert_eq!(
            packet_detail_reply(pipeline.query(), "0").status(),
            StatusCode::OK
        );
        assert_eq!(
            packet_detail_reply(pipeline.query(), "1").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            packet_detail_reply(pipeline.query(), "-1").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            packet_detail_reply(pipeline.query(), "abc").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_packet_layers_statuses() {
        let pipeline = pipeline_with_one_frame();
        let res = packet_layers_reply(pipeline.query(), "0");
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(
            packet_layers_reply(pipeline.query(), "9").status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_stats_reply() {
        let pipeline = pipeline_with_one_frame();
        assert_eq!(stats_reply(&pipeline).status(), StatusCode::OK);
    }

    #[test]
    fn test_embedded_assets() {
        let index = asset_reply("index.html");
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(index.headers()["content-type"], "text/html");

        let script = asset_reply("app.js");
        assert_eq!(script.status(), StatusCode::OK);

        assert_eq!(asset_reply("missing.txt").status(), StatusCode::NOT_FOUND);
    }
}
