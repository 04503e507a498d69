//! Outbound HTTP: the directory and weather APIs, and the resolver service.

pub mod directory;
pub mod metrics;
pub mod relay;
pub mod weather_api;

use crate::propagation::inject_context;
use metrics::ClientMetrics;
use opentelemetry::metrics::Meter;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Span;

/// HTTP client that stamps every request with the current trace context and
/// times it into [`ClientMetrics`].
#[derive(Clone, Debug)]
pub struct TracedClient {
    client: Client,
    metrics: ClientMetrics,
}

impl TracedClient {
    /// Without a timeout the client waits as long as the connection allows.
    pub fn new(timeout: Option<Duration>, meter: &Arc<Meter>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            metrics: ClientMetrics::new(meter),
        })
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Sends once. Transport failures, timeouts included, come back as `Err`.
    pub async fn send(&self, upstream: &'static str, request: RequestBuilder) -> reqwest::Result<Response> {
        let mut request = request.build()?;
        let method = request.method().clone();
        inject_context(&Span::current(), request.headers_mut());

        let timer = Instant::now();
        let result = self.client.execute(request).await;
        let status = result.as_ref().ok().map(|response| response.status().as_u16());
        self.metrics
            .record(upstream, method.as_str(), status, timer.elapsed());

        result
    }
}
