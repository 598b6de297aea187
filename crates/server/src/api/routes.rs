use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, pages, workflows};
use crate::state::AppState;

/// Multipart framing on top of the configured per-file limit.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state
        .config()
        .server
        .max_upload_bytes()
        .saturating_add(UPLOAD_OVERHEAD_BYTES);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Workflows
        .route("/workflows/{workflow}", get(workflows::get_workflow))
        .route(
            "/workflows/{workflow}/inputs/{slot}",
            put(workflows::select_input).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/workflows/{workflow}/convert", post(workflows::convert))
        .route("/workflows/{workflow}/download", get(workflows::download))
        .route("/workflows/{workflow}/preview", get(workflows::preview))
        .with_state(state.clone());

    // Pages
    let page_routes = Router::new()
        .route("/", get(pages::landing))
        .route("/ffmpeg", get(pages::image_to_video_page))
        .route("/ffmpeg/video-to-audio", get(pages::video_to_audio_page))
        .route("/redirects/videoTOaudio", get(pages::redirect_video_to_audio))
        .route("/redirects/audioTOvideo", get(pages::redirect_audio_to_video))
        .route("/assets/app.js", get(pages::app_js))
        .route("/assets/style.css", get(pages::style_css));

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(page_routes)
        .route("/metrics", get(handlers::metrics).with_state(state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
