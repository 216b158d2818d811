use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::{handlers, middleware::request_context, types::AppState};

// Transport ceiling sits above the 10MB application limit (multipart
// framing overhead included), so oversize uploads get the handler's 400
// rather than a 413 from the body-limit layer.
const BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/slc/predict", post(handlers::predict_file))
        .route("/slc/predict/url", post(handlers::predict_url))
        .route("/slc/predict/base64", post(handlers::predict_base64))
        .route("/slc/model/info", get(handlers::model_info))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context))
        .with_state(state)
}
