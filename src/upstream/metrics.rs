use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use opentelemetry_semantic_conventions::trace::{
    ERROR_TYPE, HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, SERVER_ADDRESS,
};
use std::sync::Arc;
use std::time::Duration;

const HTTP_CLIENT_DURATION: &str = "http.client.request.duration";
const HTTP_CLIENT_FAILURES: &str = "http.client.failures";

/// Outbound call instruments shared by every upstream client.
#[derive(Clone, Debug)]
pub struct ClientMetrics {
    http_client_duration: Histogram<f64>,
    http_client_failures: Counter<u64>,
}

impl ClientMetrics {
    pub fn new(meter: &Arc<Meter>) -> Self {
        let http_client_duration = meter
            .f64_histogram(HTTP_CLIENT_DURATION)
            .with_description("Measures the duration of outbound HTTP requests.")
            .with_unit("s")
            .init();

        let http_client_failures = meter
            .u64_counter(HTTP_CLIENT_FAILURES)
            .with_description("Counts outbound HTTP requests that never got a response.")
            .init();

        Self {
            http_client_duration,
            http_client_failures,
        }
    }

    /// `status` is `None` when the request failed before a response arrived.
    pub fn record(&self, upstream: &'static str, method: &str, status: Option<u16>, elapsed: Duration) {
        let mut attributes = vec![
            KeyValue::new(SERVER_ADDRESS, upstream),
            KeyValue::new(HTTP_REQUEST_METHOD, method.to_owned()),
        ];

        match status {
            Some(status) => {
                attributes.push(KeyValue::new(HTTP_RESPONSE_STATUS_CODE, status as i64))
            }
            None => {
                attributes.push(KeyValue::new(ERROR_TYPE, "transport"));
                self.http_client_failures.add(1, &attributes);
            }
        }

        self.http_client_duration
            .record(elapsed.as_secs_f64(), &attributes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
    use opentelemetry_sdk::runtime;
    use opentelemetry_sdk::testing::metrics::InMemoryMetricsExporter;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_records_duration_and_transport_failures() {
        let exporter = InMemoryMetricsExporter::default();
        let reader = PeriodicReader::builder(exporter.clone(), runtime::Tokio).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        let meter = Arc::new(provider.meter("client_metrics_test"));

        let metrics = ClientMetrics::new(&meter);
        metrics.record("directory", "GET", Some(200), Duration::from_millis(12));
        metrics.record("weather", "GET", None, Duration::from_millis(3));

        provider.force_flush().unwrap();
        let names: Vec<String> = exporter
            .get_finished_metrics()
            .unwrap()
            .iter()
            .flat_map(|resource| resource.scope_metrics.iter())
            .flat_map(|scope| scope.metrics.iter())
            .map(|metric| metric.name.to_string())
            .collect();

        assert!(names.contains(&HTTP_CLIENT_DURATION.to_string()));
        assert!(names.contains(&HTTP_CLIENT_FAILURES.to_string()));
    }
}
