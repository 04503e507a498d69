use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use cep_weather::api::gateway_routes;
use cep_weather::middleware::metrics::HttpMetrics;
use cep_weather::middleware::tracing::record_trace;
use cep_weather::telemetry::init_telemetry;
use cep_weather::{AppConfig, GatewayContext};
use opentelemetry::global;
use std::io;
use std::sync::Arc;

const SERVICE_NAME: &str = "cep-gateway";

#[actix_web::main]
async fn main() -> io::Result<()> {
    let app_config = AppConfig::load_default().map_err(io::Error::other)?;

    let telemetry = init_telemetry(SERVICE_NAME, &app_config.otel_config).map_err(io::Error::other)?;
    let meter = Arc::new(global::meter(SERVICE_NAME));
    let context =
        GatewayContext::new(&app_config.gateway, &meter).map_err(io::Error::other)?;

    let bind = (app_config.gateway.host.clone(), app_config.gateway.port);
    tracing::info!(
        host = %bind.0,
        port = bind.1,
        resolver_url = %app_config.gateway.resolver_url,
        "gateway listening"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(context.clone()))
            .wrap(Logger::default())
            .wrap(from_fn(record_trace))
            .wrap(HttpMetrics::new(meter.clone()))
            .configure(gateway_routes)
    })
    .bind(bind)?
    .run()
    .await?;

    tokio::task::spawn_blocking(move || telemetry.shutdown()).await?;

    Ok(())
}
