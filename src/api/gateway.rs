use crate::cep::CepRequest;
use crate::error::CepError;
use crate::middleware::tracing::TraceInfo;
use crate::GatewayContext;
use actix_web::{post, web, HttpResponse};
use tracing::{instrument, warn};

#[post("/cep")]
pub async fn cep(
    context: web::Data<GatewayContext>,
    body: web::Bytes,
    trace_info: web::ReqData<TraceInfo>,
) -> Result<HttpResponse, CepError> {
    handle_cep(&context, &body, trace_info.into_inner()).await
}

#[instrument(
    name = "gateway_cep",
    skip_all,
    parent = &trace_info.request_span,
    fields(trace_id = %trace_info.trace_id)
)]
async fn handle_cep(
    context: &GatewayContext,
    body: &[u8],
    trace_info: TraceInfo,
) -> Result<HttpResponse, CepError> {
    let code = CepRequest::parse(body).inspect_err(|err| warn!(error = %err, "rejected request"))?;
    let relayed = context.relay.forward(&code).await?;
    Ok(relayed.into_response())
}

#[cfg(test)]
mod tests {
    use crate::api::gateway_routes;
    use crate::config::GatewayConfig;
    use crate::middleware::tracing::record_trace;
    use crate::GatewayContext;
    use actix_web::middleware::from_fn;
    use actix_web::{test, web, App};
    use opentelemetry::global;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(resolver_url: &str) -> GatewayContext {
        let config = GatewayConfig {
            resolver_url: resolver_url.to_string(),
            ..GatewayConfig::default()
        };
        GatewayContext::new(&config, &Arc::new(global::meter("test"))).unwrap()
    }

    #[actix_web::test]
    async fn test_relays_success() {
        let resolver = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cep"))
            .and(body_json(serde_json::json!({ "cep": "01001000" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "São Paulo", "temp_C": 25.0, "temp_F": 77.0, "temp_K": 298.0
            })))
            .expect(1)
            .mount(&resolver)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(&resolver.uri())))
                .wrap(from_fn(record_trace))
                .configure(gateway_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/cep")
            .set_json(serde_json::json!({ "cep": "01001000" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["city"], "São Paulo");
        assert_eq!(body["temp_K"], 298.0);
    }

    #[actix_web::test]
    async fn test_invalid_code_is_not_forwarded() {
        let resolver = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&resolver)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(&resolver.uri())))
                .wrap(from_fn(record_trace))
                .configure(gateway_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/cep")
            .set_json(serde_json::json!({ "cep": "123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({ "error": "invalid zipcode" }));

        let req = test::TestRequest::post()
            .uri("/cep")
            .set_payload("cep=01001000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_downstream_status_and_body_pass_through() {
        let resolver = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_raw(r#"{"error":"can not find zipcode"}"#, "application/json"),
            )
            .mount(&resolver)
            .await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context(&resolver.uri())))
                .wrap(from_fn(record_trace))
                .configure(gateway_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/cep")
            .set_json(serde_json::json!({ "cep": "00000000" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 404);
        let body = test::read_body(resp).await;
        assert_eq!(&body[..], br#"{"error":"can not find zipcode"}"#);
    }

    #[actix_web::test]
    async fn test_unreachable_resolver_is_server_error() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(context("http://127.0.0.1:1")))
                .wrap(from_fn(record_trace))
                .configure(gateway_routes),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/cep")
            .set_json(serde_json::json!({ "cep": "01001000" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "failed to reach resolver service");
    }
}
