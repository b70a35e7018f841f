//! Estimate Normalizer: the decoder boundary between generated JSON and pricing.
//!
//! `normalize` is total over any `serde_json::Value`: every field that is missing or
//! cannot be coerced is replaced with its default, so the returned estimate is always
//! well-typed. Nothing here returns an error.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::estimate::flat_rate::{FlatRateHours, FlatRateMatch};

pub const DEFAULT_SUPPLIES_PERCENT: f64 = 7.0;
const DEFAULT_PART_NAME: &str = "Part";

// Upper bounds that keep every priced product and sum finite.
pub const MAX_LABOR_HOURS: f64 = 1_000.0;
pub const MAX_LABOR_RATE: f64 = 10_000.0;
pub const MAX_PART_COST: f64 = 10_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub name: String,
    /// Whole currency units, never negative.
    pub cost: f64,
}

/// A generated estimate after coercion. Field names serialize in camelCase so the
/// output can be fed back through `normalize` unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEstimate {
    pub job_type: String,
    pub description: String,
    pub labor_hours: f64,
    pub labor_rate: f64,
    pub parts: Vec<Part>,
    pub shop_supplies_percent: f64,
    pub notes: String,
    pub tips: Vec<String>,
    pub warnings: Vec<String>,
    pub work_steps: Vec<String>,
}

/// Caller-side inputs to normalization.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeParams<'a> {
    /// Rate chosen by the caller; wins over anything generated when > 0.
    pub caller_labor_rate: Option<f64>,
    pub default_rate: f64,
    pub default_supplies_percent: f64,
    pub flat_rate: Option<&'a FlatRateMatch>,
}

impl<'a> NormalizeParams<'a> {
    pub fn new(default_rate: f64) -> Self {
        Self {
            caller_labor_rate: None,
            default_rate,
            default_supplies_percent: DEFAULT_SUPPLIES_PERCENT,
            flat_rate: None,
        }
    }

    pub fn caller_labor_rate(mut self, rate: Option<f64>) -> Self {
        self.caller_labor_rate = rate;
        self
    }

    pub fn default_supplies_percent(mut self, percent: f64) -> Self {
        self.default_supplies_percent = percent;
        self
    }

    pub fn flat_rate(mut self, flat_rate: Option<&'a FlatRateMatch>) -> Self {
        self.flat_rate = flat_rate;
        self
    }
}

/// Coerces an untrusted generated estimate into a `NormalizedEstimate`.
///
/// Precedence:
/// 1. labor rate: caller rate (> 0), else generated rate (> 0), else the default
/// 2. labor hours: parsed generated hours (0 when unusable); a fixed flat rate
///    replaces them, a ranged flat rate only fills in its midpoint when they are 0
/// 3. shop supplies: generated percent when within 0..=100 (0 included), else the default
/// 4. parts: every entry kept, name defaults to "Part", cost clamped to
///    `0..=MAX_PART_COST` and rounded to whole units
///
/// Hours and rate are capped at `MAX_LABOR_HOURS` and `MAX_LABOR_RATE`.
/// 5. notes and advisory lists default to empty
pub fn normalize(raw: &Value, params: &NormalizeParams<'_>) -> NormalizedEstimate {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let labor_rate = params
        .caller_labor_rate
        .filter(|r| r.is_finite() && *r > 0.0)
        .or_else(|| {
            field(obj, &["laborRate", "labor_rate"])
                .and_then(parse_number)
                .filter(|r| *r > 0.0)
        })
        .unwrap_or(params.default_rate)
        .min(MAX_LABOR_RATE);

    let parsed_hours = field(obj, &["laborHours", "labor_hours", "hours"])
        .and_then(parse_number)
        .filter(|h| *h >= 0.0)
        .unwrap_or(0.0)
        .min(MAX_LABOR_HOURS);
    let labor_hours = match params.flat_rate.map(|m| m.hours) {
        Some(FlatRateHours::Fixed(hours)) => hours,
        Some(range @ FlatRateHours::Range { .. }) if parsed_hours == 0.0 => range.midpoint(),
        _ => parsed_hours,
    };

    let shop_supplies_percent = field(obj, &["shopSuppliesPercent", "shop_supplies_percent"])
        .and_then(parse_number)
        .filter(|p| (0.0..=100.0).contains(p))
        .unwrap_or(params.default_supplies_percent);

    let parts = match field(obj, &["parts"]) {
        Some(Value::Array(items)) => items.iter().map(normalize_part).collect(),
        _ => Vec::new(),
    };

    NormalizedEstimate {
        job_type: field(obj, &["jobType", "job_type", "category"])
            .and_then(text)
            .unwrap_or_default(),
        description: field(obj, &["description", "summary"])
            .and_then(text)
            .unwrap_or_default(),
        labor_hours,
        labor_rate,
        parts,
        shop_supplies_percent,
        notes: notes(field(obj, &["notes"])),
        tips: string_list(field(obj, &["tips"])),
        warnings: string_list(field(obj, &["warnings"])),
        work_steps: string_list(field(obj, &["workSteps", "work_steps"])),
    }
}

fn normalize_part(item: &Value) -> Part {
    let (name, cost) = match item {
        Value::Object(part) => (
            field(part, &["name", "partName", "part_name"]).and_then(text),
            field(part, &["cost", "price"]).and_then(parse_number),
        ),
        Value::String(_) => (text(item), None),
        Value::Number(_) => (None, parse_number(item)),
        _ => (None, None),
    };

    Part {
        name: name.unwrap_or_else(|| DEFAULT_PART_NAME.to_string()),
        cost: whole_units(cost.unwrap_or(0.0)),
    }
}

fn whole_units(cost: f64) -> f64 {
    if cost > 0.0 {
        cost.min(MAX_PART_COST).round()
    } else {
        0.0
    }
}

/// First non-null value stored under any of `keys`.
fn field<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Finite number from a JSON number or a numeric-looking string.
fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(&s.replace([',', '$'], "")),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Parses the longest numeric prefix of `s`, so "2.5 hours" reads as 2.5.
fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(text).collect(),
        Some(single) => text(single).into_iter().collect(),
        None => Vec::new(),
    }
}

fn notes(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(text)
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => text(other).unwrap_or_default(),
        None => String::new(),
    }
}
