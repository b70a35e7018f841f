//! Estimate generation: orchestrates one request end to end.
//!
//! Flow: validate → flat-rate match → text generation → normalize → price →
//!       persist customer and job → respond.
//!
//! Everything happens inside the request. A generation failure ends the request
//! before anything is written; a persistence failure leaves nothing to roll back.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::config::PricingDefaults;
use crate::errors::{AppError, FieldError};
use crate::estimate::flat_rate::{self, FlatRateMatch};
use crate::estimate::generator::EstimateGenerator;
use crate::estimate::normalizer::{normalize, NormalizeParams};
use crate::estimate::pricing::{price_with_tax_rate, PricedEstimate};
use crate::estimate::prompts::{ESTIMATE_PROMPT_TEMPLATE, ESTIMATE_SYSTEM};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NUMERIC_FIELDS_INSTRUCTION};
use crate::models::customer::{CustomerRow, NewCustomer};
use crate::models::job::{JobRow, NewJob};
use crate::store::JobStore;

const MAX_DESCRIPTION_CHARS: usize = 2000;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /api/generate-estimate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEstimateRequest {
    #[serde(default)]
    pub customer: NewCustomer,
    /// Free-form: `{year, make, model, ...}` or a plain string.
    #[serde(default)]
    pub vehicle: Option<Value>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labor_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEstimateResponse {
    pub ok: bool,
    pub estimate: PricedEstimate,
    pub saved_job: JobRow,
    pub customer: CustomerRow,
    pub flat_rate: Option<FlatRateMatch>,
}

/// Stages of one estimate request, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateStage {
    Received,
    MatchedFlatRate,
    TextGenerationCalled,
    Normalized,
    Priced,
    Persisted,
    Responded,
    TextGenerationFailed,
    PersistenceFailed,
}

impl fmt::Display for EstimateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EstimateStage::Received => "RECEIVED",
            EstimateStage::MatchedFlatRate => "MATCHED_FLAT_RATE",
            EstimateStage::TextGenerationCalled => "TEXT_GENERATION_CALLED",
            EstimateStage::Normalized => "NORMALIZED",
            EstimateStage::Priced => "PRICED",
            EstimateStage::Persisted => "PERSISTED",
            EstimateStage::Responded => "RESPONDED",
            EstimateStage::TextGenerationFailed => "TEXT_GENERATION_FAILED",
            EstimateStage::PersistenceFailed => "PERSISTENCE_FAILED",
        };
        f.write_str(name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the estimate pipeline for one request.
pub async fn generate_estimate(
    generator: &dyn EstimateGenerator,
    store: &dyn JobStore,
    pricing: &PricingDefaults,
    request: GenerateEstimateRequest,
) -> Result<GenerateEstimateResponse, AppError> {
    let description = request.description.trim().to_string();
    info!(stage = %EstimateStage::Received, "Estimate requested: {description:?}");
    validate_request(&request)?;

    let flat_rate = flat_rate::lookup(&description);
    if let Some(m) = &flat_rate {
        info!(
            stage = %EstimateStage::MatchedFlatRate,
            "Flat rate '{}' ({})",
            m.label,
            m.hours.describe()
        );
    }

    // The rate named in the prompt is the rate that gets priced.
    let effective_rate = request
        .labor_rate
        .filter(|r| *r > 0.0)
        .unwrap_or(pricing.default_labor_rate);
    let prompt = build_estimate_prompt(
        &description,
        request.vehicle.as_ref(),
        effective_rate,
        flat_rate.as_ref(),
    );
    let system = format!("{ESTIMATE_SYSTEM} {JSON_ONLY_SYSTEM}");

    info!(stage = %EstimateStage::TextGenerationCalled, "Requesting generated estimate");
    let raw = generator.generate(&prompt, &system).await.map_err(|e| {
        error!(stage = %EstimateStage::TextGenerationFailed, "Text generation failed: {e}");
        AppError::from(e)
    })?;

    let params = NormalizeParams::new(pricing.default_labor_rate)
        .caller_labor_rate(Some(effective_rate))
        .default_supplies_percent(pricing.shop_supplies_percent)
        .flat_rate(flat_rate.as_ref());
    let normalized = normalize(&raw, &params);
    info!(
        stage = %EstimateStage::Normalized,
        "{} h at ${}/h, {} parts",
        normalized.labor_hours,
        normalized.labor_rate,
        normalized.parts.len()
    );

    let priced = price_with_tax_rate(normalized, pricing.tax_rate_percent);
    info!(stage = %EstimateStage::Priced, "Subtotal ${:.2}", priced.subtotal);

    let (customer, saved_job) = persist(store, &request, &description, flat_rate.as_ref(), &priced)
        .await
        .map_err(|e| {
            error!(stage = %EstimateStage::PersistenceFailed, "Could not save estimate: {e}");
            AppError::Persistence(e)
        })?;
    info!(
        stage = %EstimateStage::Persisted,
        "Saved job {} for customer {}",
        saved_job.id,
        customer.id
    );

    info!(stage = %EstimateStage::Responded, "Estimate complete");
    Ok(GenerateEstimateResponse {
        ok: true,
        estimate: priced,
        saved_job,
        customer,
        flat_rate,
    })
}

async fn persist(
    store: &dyn JobStore,
    request: &GenerateEstimateRequest,
    description: &str,
    flat_rate: Option<&FlatRateMatch>,
    priced: &PricedEstimate,
) -> Result<(CustomerRow, JobRow), sqlx::Error> {
    let customer = store.upsert_customer(&request.customer.cleaned()).await?;
    let job = store
        .insert_job(&NewJob {
            customer_id: Some(customer.id),
            description: description.to_string(),
            vehicle: request.vehicle.clone(),
            flat_rate_label: flat_rate.map(|m| m.label.clone()),
            estimate: priced.clone(),
        })
        .await?;
    Ok((customer, job))
}

/// Collects every field-level problem with the request.
pub fn validate_request(request: &GenerateEstimateRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if request.customer.name.trim().is_empty() {
        errors.push(FieldError::new("customer.name", "is required"));
    }
    if let Some(email) = request.customer.email.as_deref().map(str::trim) {
        if !email.is_empty() && !email.contains('@') {
            errors.push(FieldError::new(
                "customer.email",
                "is not a valid email address",
            ));
        }
    }

    let description = request.description.trim();
    if description.is_empty() {
        errors.push(FieldError::new("description", "is required"));
    } else if description.chars().count() > MAX_DESCRIPTION_CHARS {
        errors.push(FieldError::new(
            "description",
            format!("must be at most {MAX_DESCRIPTION_CHARS} characters"),
        ));
    }

    if let Some(rate) = request.labor_rate {
        if !rate.is_finite() || rate < 0.0 {
            errors.push(FieldError::new("laborRate", "must be a non-negative number"));
        }
    }

    if let Some(vehicle) = &request.vehicle {
        if !matches!(vehicle, Value::Object(_) | Value::String(_) | Value::Null) {
            errors.push(FieldError::new("vehicle", "must be an object or a string"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Builds the generation prompt by filling the template.
fn build_estimate_prompt(
    description: &str,
    vehicle: Option<&Value>,
    labor_rate: f64,
    flat_rate: Option<&FlatRateMatch>,
) -> String {
    let flat_rate_hint = match flat_rate {
        Some(m) => format!(
            "Industry flat rate for \"{}\": {}. Keep laborHours consistent with it.",
            m.label,
            m.hours.describe()
        ),
        None => "No flat-rate entry matched; estimate hours from experience.".to_string(),
    };

    let vehicle = describe_vehicle(vehicle);
    let labor_rate = format!("{labor_rate:.2}");
    fill_template(
        ESTIMATE_PROMPT_TEMPLATE,
        &[
            ("numeric_instruction", NUMERIC_FIELDS_INSTRUCTION),
            ("vehicle", vehicle.as_str()),
            ("labor_rate", labor_rate.as_str()),
            ("flat_rate_hint", flat_rate_hint.as_str()),
            ("description", description),
        ],
    )
}

/// Replaces `{name}` placeholders in a single pass over `template`.
/// Substituted text is never rescanned, so braces in user input stay literal.
/// Unknown `{...}` sequences (the JSON schema example) are copied as-is.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let value = tail.find('}').and_then(|close| {
            values
                .iter()
                .find(|(name, _)| *name == &tail[..close])
                .map(|(_, value)| (close, *value))
        });
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn describe_vehicle(vehicle: Option<&Value>) -> String {
    let described = match vehicle {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Object(v)) => ["year", "make", "model", "trim", "engine"]
            .iter()
            .filter_map(|k| match v.get(*k) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };
    if described.is_empty() {
        "Not specified".to_string()
    } else {
        described
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
