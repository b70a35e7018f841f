//! VIN decoding via the NHTSA vPIC public API.
//!
//! The VIN format is checked locally first, so malformed input never leaves the process.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub mod handlers;

const VIN_LENGTH: usize = 17;

#[derive(Debug, Error)]
pub enum VinError {
    #[error("VIN must be 17 characters (letters except I, O, Q and digits)")]
    InvalidFormat,

    #[error("No vehicle found for VIN {0}")]
    NotFound(String),

    #[error("VIN decode request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("VIN decode service returned status {0}")]
    Api(u16),
}

impl From<VinError> for AppError {
    fn from(e: VinError) -> Self {
        match e {
            VinError::InvalidFormat => AppError::BadRequest(e.to_string()),
            VinError::NotFound(_) => AppError::NotFound(e.to_string()),
            VinError::Http(_) | VinError::Api(_) => AppError::Upstream(e.to_string()),
        }
    }
}

/// Normalizes a VIN to uppercase and checks its format.
pub fn validate_vin(vin: &str) -> Result<String, VinError> {
    let vin = vin.trim().to_ascii_uppercase();
    let valid = vin.len() == VIN_LENGTH
        && vin
            .chars()
            .all(|c| c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q')));
    if valid {
        Ok(vin)
    } else {
        Err(VinError::InvalidFormat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedVehicle {
    pub vin: String,
    pub year: Option<u16>,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub engine: Option<String>,
    pub fuel_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DecodeResponse {
    #[serde(rename = "Results", default)]
    results: Vec<DecodeResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DecodeResult {
    #[serde(rename = "ModelYear")]
    model_year: Option<String>,
    #[serde(rename = "Make")]
    make: Option<String>,
    #[serde(rename = "Model")]
    model: Option<String>,
    #[serde(rename = "Trim")]
    trim: Option<String>,
    #[serde(rename = "DisplacementL")]
    displacement_l: Option<String>,
    #[serde(rename = "EngineCylinders")]
    engine_cylinders: Option<String>,
    #[serde(rename = "FuelTypePrimary")]
    fuel_type_primary: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Maps the first vPIC result to a `DecodedVehicle`; no make or model means no match.
fn vehicle_from_response(vin: &str, response: DecodeResponse) -> Result<DecodedVehicle, VinError> {
    let result = response.results.into_iter().next().unwrap_or_default();

    let (Some(make), Some(model)) = (non_empty(result.make), non_empty(result.model)) else {
        return Err(VinError::NotFound(vin.to_string()));
    };

    let displacement = non_empty(result.displacement_l)
        .and_then(|d| d.parse::<f64>().ok())
        .map(|d| format!("{d:.1}L"));
    let cylinders = non_empty(result.engine_cylinders).map(|c| format!("{c}-cyl"));
    let engine = match (displacement, cylinders) {
        (Some(d), Some(c)) => Some(format!("{d} {c}")),
        (d, c) => d.or(c),
    };

    Ok(DecodedVehicle {
        vin: vin.to_string(),
        year: non_empty(result.model_year).and_then(|y| y.parse().ok()),
        make,
        model,
        trim: non_empty(result.trim),
        engine,
        fuel_type: non_empty(result.fuel_type_primary),
    })
}

#[derive(Clone)]
pub struct VinClient {
    client: Client,
    base_url: String,
}

impl VinClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Validates `vin`, then decodes it.
    pub async fn decode(&self, vin: &str) -> Result<DecodedVehicle, VinError> {
        let vin = validate_vin(vin)?;
        let url = format!("{}/DecodeVinValues/{}?format=json", self.base_url, vin);
        debug!("Decoding VIN {vin}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VinError::Api(status.as_u16()));
        }
        let body: DecodeResponse = response.json().await?;
        vehicle_from_response(&vin, body)
    }
}
