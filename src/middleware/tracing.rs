use crate::propagation::extract_context;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::USER_AGENT;
use actix_web::middleware::Next;
use actix_web::{Error, HttpMessage};
use opentelemetry::trace::{TraceContextExt, TraceId};
use opentelemetry_semantic_conventions::trace::{
    CLIENT_ADDRESS, ERROR_TYPE, HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE,
    NETWORK_PROTOCOL_VERSION, URL_PATH, USER_AGENT_ORIGINAL,
};
use tracing::{field, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Handed to handlers through request extensions.
#[derive(Clone, Debug)]
pub struct TraceInfo {
    pub trace_id: TraceId,
    pub request_span: Span,
}

impl TraceInfo {
    pub fn new(trace_id: TraceId, request_span: Span) -> Self {
        Self {
            trace_id,
            request_span,
        }
    }
}

fn make_span(req: &ServiceRequest) -> Span {
    let empty = field::Empty;
    let span_name = format!(
        "{} {}",
        req.method(),
        req.match_pattern().unwrap_or_default()
    );
    let span = tracing::info_span!(
        "http_request",
        otel.name = span_name,
        otel.kind = "server",
        otel.status_code = empty,
        { URL_PATH } = empty,
        { HTTP_ROUTE } = empty,
        { HTTP_REQUEST_METHOD } = empty,
        { HTTP_RESPONSE_STATUS_CODE } = empty,
        { NETWORK_PROTOCOL_VERSION } = empty,
        { CLIENT_ADDRESS } = empty,
        { USER_AGENT_ORIGINAL } = empty,
        { ERROR_TYPE } = empty,
    );
    span.set_parent(extract_context(req.headers()));
    span
}

/// Opens the server span for a request, parented on the caller's trace
/// context, and keeps it entered while the handler runs so that every span
/// and outbound call below it joins the same trace.
pub async fn record_trace(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let span = make_span(&req);
    let trace_info = TraceInfo::new(
        span.context().span().span_context().trace_id(),
        span.clone(),
    );
    req.extensions_mut().insert(trace_info);

    let resp = next.call(req).instrument(span.clone()).await?;
    let (req, res) = resp.into_parts();

    span.record(URL_PATH, req.path());
    span.record(HTTP_ROUTE, req.match_pattern().unwrap_or_default());
    span.record(HTTP_REQUEST_METHOD, req.method().as_str());
    span.record(NETWORK_PROTOCOL_VERSION, field::debug(req.version()));
    span.record(
        CLIENT_ADDRESS,
        req.connection_info().peer_addr().unwrap_or_default(),
    );

    if let Some(user_agent) = req.headers().get(USER_AGENT) {
        span.record(USER_AGENT_ORIGINAL, user_agent.to_str().unwrap_or_default());
    }

    let status = res.status();
    span.record(HTTP_RESPONSE_STATUS_CODE, status.as_u16());
    if !status.is_success() {
        span.record(ERROR_TYPE, field::display(status));
    }
    if status.is_server_error() {
        span.record("otel.status_code", "ERROR");
    }

    Ok(ServiceResponse::new(req, res))
}
