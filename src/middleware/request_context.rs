use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request data handed explicitly to handlers and the error mapper
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub trace_id: String,
    pub path: String,
    /// Cancelled when the client goes away before a response is produced
    pub cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(trace_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            path: path.into(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Cancels the request token and logs the abandonment when dropped while armed,
/// which happens when the server drops the request future after a disconnect.
struct DisconnectGuard {
    cancel: CancellationToken,
    trace_id: String,
    path: String,
    armed: bool,
}

impl DisconnectGuard {
    fn new(context: &RequestContext) -> Self {
        Self {
            cancel: context.cancel.clone(),
            trace_id: context.trace_id.clone(),
            path: context.path.clone(),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.cancel.cancel();
        tracing::info!(
            trace_id = %self.trace_id,
            path = %self.path,
            "Request canceled by the client"
        );
    }
}

fn incoming_trace_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
}

/// Attach a `RequestContext` to the request, run it inside a span carrying the
/// trace id, and echo the trace id back in `x-request-id`.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = incoming_trace_id(&request).unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    let context = RequestContext::new(trace_id.clone(), request.uri().path());

    let guard = DisconnectGuard::new(&context);

    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %context.path,
    );
    request.extensions_mut().insert(context);

    let mut response = next.run(request).instrument(span).await;
    guard.disarm();

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}
