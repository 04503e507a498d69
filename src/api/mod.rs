use actix_web::web;

pub mod gateway;
pub mod resolver;

/// Front service: `POST /cep` validates and relays to the resolver.
pub fn gateway_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(gateway::cep);
}

/// Internal service: `POST /cep` validates and resolves city and weather.
pub fn resolver_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(resolver::cep);
}
