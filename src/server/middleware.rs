use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns every inbound request a correlation id and records it, together
/// with the route, on a span covering the whole request/response cycle.
/// Log lines emitted while the request is being handled carry both fields;
/// the id is echoed back in the `x-request-id` response header.
pub async fn request_context(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let route = request.uri().path().to_owned();
    let span = tracing::info_span!("request", request_id = %request_id, route = %route);

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
