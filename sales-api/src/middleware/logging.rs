use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tokio::time::Instant;

use crate::middleware::context::RequestContext;

/// One structured line per request, written after the handler returns.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = request
        .extensions()
        .get::<RequestContext>()
        .map(|context| context.started_at)
        .unwrap_or_else(Instant::now);

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = started_at.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::warn!(target: "request_logger", %method, %path, status = status.as_u16(), duration_ms, "request failed");
    } else {
        tracing::info!(target: "request_logger", %method, %path, status = status.as_u16(), duration_ms, "request completed");
    }

    response
}
