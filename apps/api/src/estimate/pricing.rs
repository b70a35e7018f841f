//! Pricing Calculator: derives money figures from a normalized estimate.
//!
//! Every figure is rounded to cents on its own, and the subtotal sums the rounded terms.
//! That can differ by a cent from rounding the unrounded sum once; see the tests.

use serde::Serialize;

use crate::estimate::normalizer::NormalizedEstimate;

pub const DEFAULT_TAX_RATE_PERCENT: f64 = 28.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedEstimate {
    #[serde(flatten)]
    pub estimate: NormalizedEstimate,
    pub labor_cost: f64,
    pub parts_cost: f64,
    pub shop_supplies_cost: f64,
    pub subtotal: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_set_aside: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_after_tax: Option<f64>,
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Prices an estimate with the default 28% tax set-aside.
#[allow(dead_code)]
pub fn price(estimate: NormalizedEstimate) -> PricedEstimate {
    price_with_tax_rate(estimate, Some(DEFAULT_TAX_RATE_PERCENT))
}

/// Prices an estimate. `None` omits the tax set-aside and net figures.
pub fn price_with_tax_rate(
    estimate: NormalizedEstimate,
    tax_rate_percent: Option<f64>,
) -> PricedEstimate {
    let labor_cost = round2(estimate.labor_hours * estimate.labor_rate);
    // Part costs are already whole units.
    let parts_cost: f64 = estimate.parts.iter().map(|p| p.cost).sum();
    let shop_supplies_cost = round2(parts_cost * estimate.shop_supplies_percent / 100.0);
    let subtotal = round2(labor_cost + parts_cost + shop_supplies_cost);

    let tax_set_aside = tax_rate_percent.map(|rate| round2(subtotal * rate / 100.0));
    let net_after_tax = tax_set_aside.map(|tax| round2(subtotal - tax));

    PricedEstimate {
        estimate,
        labor_cost,
        parts_cost,
        shop_supplies_cost,
        subtotal,
        tax_set_aside,
        net_after_tax,
    }
}
