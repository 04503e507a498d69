use crate::cep::CepRequest;
use crate::error::CepError;
use crate::middleware::tracing::TraceInfo;
use crate::ResolverContext;
use actix_web::{post, web, HttpResponse};
use tracing::{instrument, warn};

#[post("/cep")]
pub async fn cep(
    context: web::Data<ResolverContext>,
    body: web::Bytes,
    trace_info: web::ReqData<TraceInfo>,
) -> Result<HttpResponse, CepError> {
    handle_cep(&context, &body, trace_info.into_inner()).await
}

/// Validates again even when called by the gateway; the service is reachable
/// directly.
#[instrument(
    name = "resolver_cep",
    skip_all,
    parent = &trace_info.request_span,
    fields(trace_id = %trace_info.trace_id)
)]
async fn handle_cep(
    context: &ResolverContext,
    body: &[u8],
    trace_info: TraceInfo,
) -> Result<HttpResponse, CepError> {
    let code = CepRequest::parse(body).inspect_err(|err| warn!(error = %err, "rejected request"))?;
    let response = context.aggregator.lookup(&code).await?;
    Ok(HttpResponse::Ok().json(response))
}
