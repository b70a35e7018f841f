use std::sync::Arc;

use crate::config::PricingDefaults;
use crate::estimate::generator::EstimateGenerator;
use crate::store::JobStore;
use crate::vin::VinClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pricing: PricingDefaults,
    /// Customer and job persistence. Postgres in production.
    pub store: Arc<dyn JobStore>,
    /// Text generation behind the estimate pipeline. Default: `LlmClient`.
    pub generator: Arc<dyn EstimateGenerator>,
    pub vin: VinClient,
}
