//! Postal code (CEP) to current temperature, served by two cooperating
//! services: a front gateway that validates and relays, and a resolver that
//! looks up the city and then its weather.

use crate::aggregate::Aggregator;
use crate::upstream::directory::LocationResolver;
use crate::upstream::relay::ResolverRelay;
use crate::upstream::weather_api::WeatherResolver;
use crate::upstream::TracedClient;
use opentelemetry::metrics::Meter;
use std::sync::Arc;

pub mod aggregate;
pub mod api;
pub mod cep;
pub mod config;
pub mod error;
pub mod middleware;
pub mod propagation;
pub mod telemetry;
pub mod upstream;
pub mod weather;

pub use config::{AppConfig, GatewayConfig, OtelConfig, ResolverConfig};
pub use error::CepError;

/// Shared state of the gateway's workers.
#[derive(Clone, Debug)]
pub struct GatewayContext {
    pub relay: ResolverRelay,
}

impl GatewayContext {
    pub fn new(config: &GatewayConfig, meter: &Arc<Meter>) -> reqwest::Result<Self> {
        let http = TracedClient::new(config.timeout(), meter)?;
        Ok(Self {
            relay: ResolverRelay::new(http, &config.resolver_url),
        })
    }
}

/// Shared state of the resolver's workers.
#[derive(Clone, Debug)]
pub struct ResolverContext {
    pub aggregator: Aggregator,
}

impl ResolverContext {
    /// The weather API key is taken from `WEATHER_API_KEY`.
    pub fn new(config: &ResolverConfig, meter: &Arc<Meter>) -> reqwest::Result<Self> {
        let http = TracedClient::new(config.timeout(), meter)?;
        Ok(Self {
            aggregator: Aggregator::new(
                LocationResolver::new(http.clone(), &config.directory_url),
                WeatherResolver::from_env(http, &config.weather_url),
            ),
        })
    }

    pub fn with_aggregator(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }
}
