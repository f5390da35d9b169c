use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::IntegrityFault;
use crate::shutdown::Shutdown;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request values owned by the task serving that request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            started_at: Instant::now(),
        }
    }

    /// Keeps a caller-supplied request id when it is usable as a header value.
    pub fn from_request(request: &Request) -> Self {
        let mut context = Self::new();
        if let Some(id) = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty() && id.len() <= 128)
        {
            context.trace_id = id.to_string();
        }
        context
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// First stage: seeds the request context and span, and escalates integrity
/// faults to a process shutdown once the response is ready.
pub async fn seed_context(
    State(shutdown): State<Shutdown>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::from_request(&request);
    let span = tracing::info_span!(
        "request",
        trace_id = %context.trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let trace_id = context.trace_id.clone();
    request.extensions_mut().insert(context);

    let mut response = next.run(request).instrument(span).await;

    if response.extensions().get::<IntegrityFault>().is_some() {
        tracing::error!(
            %trace_id,
            "error returned from handler indicated integrity issue, shutting down service"
        );
        shutdown.signal_integrity_fault();
    }

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
