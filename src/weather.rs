use serde::{Deserialize, Serialize};

/// City resolved from a postal code. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
}

impl Location {
    /// Returns `None` for an empty or whitespace-only name.
    pub fn from_name(name: impl Into<String>) -> Option<Self> {
        let city = name.into();
        if city.trim().is_empty() {
            None
        } else {
            Some(Self { city })
        }
    }
}

/// Current temperature in degrees Celsius, as reported upstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    pub celsius: f64,
}

/// Body returned to the client on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

impl WeatherResponse {
    pub fn new(location: Location, reading: TemperatureReading) -> Self {
        let celsius = reading.celsius;
        Self {
            city: location.city,
            temp_c: celsius,
            temp_f: celsius * 1.8 + 32.0,
            temp_k: celsius + 273.0,
        }
    }
}
