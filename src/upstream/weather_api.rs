//! Current conditions client for weatherapi.com.

use crate::error::CepError;
use crate::upstream::TracedClient;
use crate::weather::{Location, TemperatureReading};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const WEATHER_API_BASE: &str = "http://api.weatherapi.com";
pub const WEATHER_API_KEY_VAR: &str = "WEATHER_API_KEY";

const UPSTREAM: &str = "weather";

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
}

/// `WEATHER_API_KEY`, treating an empty value as unset.
pub fn api_key_from_env() -> Option<String> {
    usable_key(std::env::var(WEATHER_API_KEY_VAR).ok())
}

fn usable_key(api_key: Option<String>) -> Option<String> {
    api_key.filter(|key| !key.is_empty())
}

#[derive(Clone)]
pub struct WeatherResolver {
    http: TracedClient,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for WeatherResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherResolver")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl WeatherResolver {
    /// A missing key is not an error here; each lookup fails instead.
    pub fn new(http: TracedClient, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: usable_key(api_key),
        }
    }

    /// Reads the key from `WEATHER_API_KEY`.
    pub fn from_env(http: TracedClient, base_url: &str) -> Self {
        Self::new(http, base_url, api_key_from_env())
    }

    /// Returns the reading in Celsius, unconverted.
    #[instrument(name = "resolve_weather", skip(self, location), fields(city = %location.city))]
    pub async fn current(&self, location: &Location) -> Result<TemperatureReading, CepError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("{WEATHER_API_KEY_VAR} is not set");
            return Err(CepError::weather_failed(
                None,
                format!("{WEATHER_API_KEY_VAR} is not set"),
            ));
        };

        // key stays out of the logs
        let url = format!(
            "{}/v1/current.json?key={}&q={}&aqi=no",
            self.base_url,
            urlencoding::encode(api_key),
            urlencoding::encode(&location.city)
        );
        debug!("Calling the weather API");

        let response = self
            .http
            .send(UPSTREAM, self.http.request(Method::GET, &url))
            .await
            .map_err(|err| {
                let err = err.without_url();
                warn!(error = %err, "weather request failed");
                CepError::weather_failed(None, err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "weather API returned an error status");
            return Err(CepError::weather_failed(
                Some(status.as_u16()),
                format!("weather API answered {status}"),
            ));
        }

        let body: CurrentResponse = response.json().await.map_err(|err| {
            warn!(error = %err.without_url(), "weather response is not the expected JSON");
            CepError::weather_failed(None, "malformed weather response")
        })?;

        debug!(temp_c = body.current.temp_c, "Resolved temperature");
        Ok(TemperatureReading {
            celsius: body.current.temp_c,
        })
    }
}
