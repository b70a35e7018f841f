use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::estimate::pricing::PricedEstimate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub description: String,
    pub vehicle: Option<Value>,
    pub flat_rate_label: Option<String>,
    pub labor_hours: f64,
    pub labor_rate: f64,
    pub labor_cost: f64,
    pub parts_cost: f64,
    pub shop_supplies_cost: f64,
    pub subtotal: f64,
    pub tax_set_aside: Option<f64>,
    pub net_after_tax: Option<f64>,
    /// Full priced estimate as returned to the caller.
    pub estimate: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A priced estimate ready to be written as a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub customer_id: Option<Uuid>,
    pub description: String,
    pub vehicle: Option<Value>,
    pub flat_rate_label: Option<String>,
    pub estimate: PricedEstimate,
}

impl NewJob {
    pub fn estimate_json(&self) -> Value {
        // PricedEstimate holds only strings, numbers and lists.
        serde_json::to_value(&self.estimate).unwrap_or(Value::Null)
    }
}
