use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use cep_weather::api::resolver_routes;
use cep_weather::middleware::metrics::HttpMetrics;
use cep_weather::middleware::tracing::record_trace;
use cep_weather::telemetry::init_telemetry;
use cep_weather::upstream::weather_api::{api_key_from_env, WEATHER_API_KEY_VAR};
use cep_weather::{AppConfig, ResolverContext};
use opentelemetry::global;
use std::io;
use std::sync::Arc;

const SERVICE_NAME: &str = "cep-resolver";

#[actix_web::main]
async fn main() -> io::Result<()> {
    let app_config = AppConfig::load_default().map_err(io::Error::other)?;

    let telemetry = init_telemetry(SERVICE_NAME, &app_config.otel_config).map_err(io::Error::other)?;
    let meter = Arc::new(global::meter(SERVICE_NAME));
    let context =
        ResolverContext::new(&app_config.resolver, &meter).map_err(io::Error::other)?;

    if api_key_from_env().is_none() {
        tracing::warn!("{WEATHER_API_KEY_VAR} is not set; weather lookups will fail");
    }

    let bind = (app_config.resolver.host.clone(), app_config.resolver.port);
    tracing::info!(host = %bind.0, port = bind.1, "resolver listening");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(context.clone()))
            .wrap(Logger::default())
            .wrap(from_fn(record_trace))
            .wrap(HttpMetrics::new(meter.clone()))
            .configure(resolver_routes)
    })
    .bind(bind)?
    .run()
    .await?;

    tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;

    Ok(())
}
