use crate::cep::{CepRequest, PostalCode};
use crate::error::CepError;
use crate::upstream::TracedClient;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use reqwest::Method;
use tracing::{debug, instrument, warn};

const UPSTREAM: &str = "resolver";

/// Status, content type and body of the resolver's answer, untouched.
#[derive(Debug)]
pub struct RelayedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: web::Bytes,
}

impl RelayedResponse {
    pub fn into_response(self) -> HttpResponse {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut builder = HttpResponse::build(status);
        if let Some(content_type) = self.content_type {
            builder.insert_header((CONTENT_TYPE, content_type));
        }
        builder.body(self.body)
    }
}

/// Front service's link to the resolver service.
#[derive(Clone, Debug)]
pub struct ResolverRelay {
    http: TracedClient,
    base_url: String,
}

impl ResolverRelay {
    pub fn new(http: TracedClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Any answer, 2xx or not, is returned as is. Only a failure to reach the
    /// resolver is an error.
    #[instrument(name = "forward_cep", skip(self), fields(cep = %cep))]
    pub async fn forward(&self, cep: &PostalCode) -> Result<RelayedResponse, CepError> {
        let url = format!("{}/cep", self.base_url);
        let request = self
            .http
            .request(Method::POST, &url)
            .json(&CepRequest::from(cep));

        let response = self.http.send(UPSTREAM, request).await.map_err(|err| {
            warn!(error = %err, "resolver service unreachable");
            CepError::DownstreamUnreachable(err)
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(|err| {
            warn!(error = %err, "resolver response body could not be read");
            CepError::DownstreamUnreachable(err)
        })?;

        debug!(status, "Resolver answered");
        Ok(RelayedResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use opentelemetry::global;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn relay(base_url: &str) -> ResolverRelay {
        let http = TracedClient::new(None, &Arc::new(global::meter("test"))).unwrap();
        ResolverRelay::new(http, base_url)
    }

    #[actix_web::test]
    async fn test_forwards_code_as_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cep"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({ "cep": "01001000" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "São Paulo", "temp_C": 25.0, "temp_F": 77.0, "temp_K": 298.0
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let relayed = relay(&mock_server.uri())
            .forward(&"01001000".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(relayed.status, 200);
        assert_eq!(relayed.content_type.as_deref(), Some("application/json"));
    }

    #[actix_web::test]
    async fn test_error_status_and_body_pass_through() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_raw(r#"{"error":"can not find zipcode"}"#, "application/json"),
            )
            .mount(&mock_server)
            .await;

        let resp = relay(&mock_server.uri())
            .forward(&"00000000".parse().unwrap())
            .await
            .unwrap()
            .into_response();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"can not find zipcode"}"#);
    }

    #[actix_web::test]
    async fn test_unreachable_resolver() {
        let result = relay("http://127.0.0.1:1")
            .forward(&"01001000".parse().unwrap())
            .await;

        assert!(matches!(result, Err(CepError::DownstreamUnreachable(_))));
    }
}
