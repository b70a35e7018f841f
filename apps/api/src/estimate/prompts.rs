// Prompt constants for estimate generation.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for estimate generation.
pub const ESTIMATE_SYSTEM: &str = "You are an experienced automotive service writer \
    producing repair estimates for an independent mechanic. \
    Estimate realistic labor hours and typical aftermarket part prices in US dollars.";

/// Estimate prompt template.
/// Replace: {numeric_instruction}, {description}, {vehicle}, {labor_rate}, {flat_rate_hint}
pub const ESTIMATE_PROMPT_TEMPLATE: &str = r#"Write a repair estimate for the job below.

JOB DESCRIPTION:
{description}

VEHICLE:
{vehicle}

LABOR RATE: ${labor_rate}/hour (use exactly this rate)

FLAT-RATE GUIDE:
{flat_rate_hint}

Return a JSON object with this EXACT schema:
{
  "jobType": "brakes",
  "description": "Replace front brake pads and rotors",
  "laborHours": 2.2,
  "laborRate": 65,
  "parts": [
    {"name": "Front brake pad set", "cost": 80},
    {"name": "Front rotor (x2)", "cost": 140}
  ],
  "shopSuppliesPercent": 7,
  "notes": "Short note for the customer",
  "tips": ["Advice for the mechanic"],
  "warnings": ["Safety or upsell warnings"],
  "workSteps": ["Step-by-step procedure"]
}

{numeric_instruction}"#;
