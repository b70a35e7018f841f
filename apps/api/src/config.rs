use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which hosted chat-completions provider generates estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Groq,
}

impl LlmProvider {
    pub fn base_url(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmProvider::Groq => "https://api.groq.com/openai/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Groq => "llama-3.3-70b-versatile",
        }
    }

    fn api_key_var(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Groq => "GROQ_API_KEY",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "groq" => Ok(LlmProvider::Groq),
            other => bail!("LLM_PROVIDER must be 'openai' or 'groq', got '{other}'"),
        }
    }
}

/// Numbers the estimate pipeline falls back to when the request and the
/// generated estimate leave them open.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingDefaults {
    pub default_labor_rate: f64,
    pub shop_supplies_percent: f64,
    /// `None` disables the tax set-aside layer.
    pub tax_rate_percent: Option<f64>,
}

impl Default for PricingDefaults {
    fn default() -> Self {
        Self {
            default_labor_rate: 65.0,
            shop_supplies_percent: 7.0,
            tax_rate_percent: Some(28.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

/// Application configuration loaded from environment variables.
/// Built once at startup and handed to the router through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub llm: LlmSettings,
    pub pricing: PricingDefaults,
    pub vin_decode_url: String,
    pub vin_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider: LlmProvider = optional_env("LLM_PROVIDER")
            .unwrap_or_else(|| "openai".to_string())
            .parse()?;

        let llm = LlmSettings {
            provider,
            api_key: require_env(provider.api_key_var())?,
            model: optional_env("LLM_MODEL")
                .unwrap_or_else(|| provider.default_model().to_string()),
            timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 45)?),
            max_attempts: parse_env("LLM_MAX_ATTEMPTS", 3)?,
            initial_backoff: Duration::from_millis(parse_env("LLM_INITIAL_BACKOFF_MS", 1000)?),
        };

        let defaults = PricingDefaults::default();
        let pricing = PricingDefaults {
            default_labor_rate: parse_env("DEFAULT_LABOR_RATE", defaults.default_labor_rate)?,
            shop_supplies_percent: parse_env(
                "SHOP_SUPPLIES_PERCENT",
                defaults.shop_supplies_percent,
            )?,
            tax_rate_percent: parse_tax_rate(optional_env("TAX_SET_ASIDE_PERCENT").as_deref())?,
        };

        if !(pricing.default_labor_rate.is_finite() && pricing.default_labor_rate > 0.0) {
            bail!("DEFAULT_LABOR_RATE must be a positive number");
        }
        if !(0.0..=100.0).contains(&pricing.shop_supplies_percent) {
            bail!("SHOP_SUPPLIES_PERCENT must be between 0 and 100");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            llm,
            pricing,
            vin_decode_url: optional_env("VIN_DECODE_URL")
                .unwrap_or_else(|| "https://vpic.nhtsa.dot.gov/api/vehicles".to_string()),
            vin_timeout: Duration::from_secs(parse_env("VIN_TIMEOUT_SECS", 10)?),
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// Unset means the default 28%; "off", "none" or 0 disable the layer.
fn parse_tax_rate(raw: Option<&str>) -> Result<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(PricingDefaults::default().tax_rate_percent);
    };
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("off") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let rate: f64 = raw
        .parse()
        .with_context(|| format!("TAX_SET_ASIDE_PERCENT has an invalid value '{raw}'"))?;
    if !(0.0..=100.0).contains(&rate) {
        bail!("TAX_SET_ASIDE_PERCENT must be between 0 and 100");
    }
    Ok((rate > 0.0).then_some(rate))
}
