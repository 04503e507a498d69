use crate::cep::PostalCode;
use crate::error::CepError;
use crate::upstream::directory::LocationResolver;
use crate::upstream::weather_api::WeatherResolver;
use crate::weather::WeatherResponse;
use tracing::{info, instrument};

/// Runs the two dependent lookups behind the resolver service: postal code to
/// city, then city to temperature. Stops at the first failure and makes each
/// call at most once.
#[derive(Clone, Debug)]
pub struct Aggregator {
    location: LocationResolver,
    weather: WeatherResolver,
}

impl Aggregator {
    pub fn new(location: LocationResolver, weather: WeatherResolver) -> Self {
        Self { location, weather }
    }

    #[instrument(name = "aggregate_weather", skip(self), fields(cep = %cep))]
    pub async fn lookup(&self, cep: &PostalCode) -> Result<WeatherResponse, CepError> {
        let location = self.location.resolve(cep).await?;
        let reading = self.weather.current(&location).await?;

        let response = WeatherResponse::new(location, reading);
        info!(city = %response.city, temp_c = response.temp_c, "weather resolved");
        Ok(response)
    }
}
