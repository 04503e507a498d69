//! Postal code directory (ViaCEP) client.

use crate::cep::PostalCode;
use crate::error::CepError;
use crate::upstream::TracedClient;
use crate::weather::Location;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const DIRECTORY_API_BASE: &str = "https://viacep.com.br";

const UPSTREAM: &str = "directory";

/// Unknown codes come back as `200 {"erro": true}`, without `localidade`.
#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    localidade: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LocationResolver {
    http: TracedClient,
    base_url: String,
}

impl LocationResolver {
    pub fn new(http: TracedClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Every failure collapses to [`CepError::LocationNotFound`].
    #[instrument(name = "resolve_location", skip(self), fields(cep = %cep))]
    pub async fn resolve(&self, cep: &PostalCode) -> Result<Location, CepError> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep);
        debug!(%url, "Calling the directory API");

        let response = self
            .http
            .send(UPSTREAM, self.http.request(Method::GET, &url))
            .await
            .map_err(|err| {
                warn!(error = %err, "directory request failed");
                CepError::LocationNotFound
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "directory returned an error status");
            return Err(CepError::LocationNotFound);
        }

        let body: DirectoryResponse = response.json().await.map_err(|err| {
            warn!(error = %err, "directory response is not the expected JSON");
            CepError::LocationNotFound
        })?;

        let location = body
            .localidade
            .and_then(Location::from_name)
            .ok_or_else(|| {
                warn!("directory response has no locality");
                CepError::LocationNotFound
            })?;

        debug!(city = %location.city, "Resolved location");
        Ok(location)
    }
}
