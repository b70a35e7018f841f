//! Flat-Rate Matcher: maps a free-text job description to a book labor-hour allowance.
//!
//! Matching is a plain substring scan over a priority-ordered table: the first entry
//! whose pattern occurs in the lower-cased description wins. There is no ranking and
//! no longest-match preference, so table order is part of the contract. A more specific
//! pattern must sit ABOVE any shorter pattern it contains, or it will never match.

use serde::{Deserialize, Serialize};

/// Book hours for a job: a single allowance or a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatRateHours {
    Fixed(f64),
    Range { min: f64, max: f64 },
}

impl FlatRateHours {
    pub fn midpoint(self) -> f64 {
        match self {
            FlatRateHours::Fixed(h) => h,
            FlatRateHours::Range { min, max } => (min + max) / 2.0,
        }
    }

    /// Human-readable form used in the generation prompt.
    pub fn describe(self) -> String {
        match self {
            FlatRateHours::Fixed(h) => format!("{h:.1} hours"),
            FlatRateHours::Range { min, max } => format!("{min:.1}-{max:.1} hours"),
        }
    }
}

/// One row of the flat-rate table. `pattern` is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlatRateEntry {
    pub pattern: &'static str,
    pub label: &'static str,
    pub hours: FlatRateHours,
}

const fn fixed(pattern: &'static str, label: &'static str, hours: f64) -> FlatRateEntry {
    FlatRateEntry {
        pattern,
        label,
        hours: FlatRateHours::Fixed(hours),
    }
}

const fn range(pattern: &'static str, label: &'static str, min: f64, max: f64) -> FlatRateEntry {
    FlatRateEntry {
        pattern,
        label,
        hours: FlatRateHours::Range { min, max },
    }
}

/// The matched allowance for a description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRateMatch {
    pub label: String,
    pub hours: FlatRateHours,
}

impl From<&FlatRateEntry> for FlatRateMatch {
    fn from(entry: &FlatRateEntry) -> Self {
        Self {
            label: entry.label.to_string(),
            hours: entry.hours,
        }
    }
}

/// Default table, in priority order. Do not sort.
pub static FLAT_RATE_TABLE: &[FlatRateEntry] = &[
    // Brakes: axle-specific pad+rotor jobs before pad-only jobs.
    range("front brake pads and rotors", "brake pads and rotors front", 2.0, 2.5),
    range("rear brake pads and rotors", "brake pads and rotors rear", 2.0, 2.5),
    range("brake pads and rotors", "brake pads and rotors (one axle)", 2.0, 2.5),
    fixed("front brake pads", "brake pads front", 1.5),
    fixed("rear brake pads", "brake pads rear", 1.5),
    fixed("brake pads", "brake pads (one axle)", 1.5),
    range("brake caliper", "brake caliper", 1.0, 1.5),
    fixed("brake fluid flush", "brake fluid flush", 1.0),
    // Maintenance
    fixed("oil change", "oil change", 0.5),
    fixed("tire rotation", "tire rotation", 0.5),
    fixed("cabin air filter", "cabin air filter", 0.3),
    fixed("air filter", "engine air filter", 0.3),
    fixed("wiper blades", "wiper blades", 0.2),
    fixed("headlight bulb", "headlight bulb", 0.5),
    fixed("coolant flush", "coolant flush", 1.0),
    fixed("transmission fluid", "transmission fluid service", 1.0),
    fixed("wheel alignment", "wheel alignment", 1.0),
    fixed("ac recharge", "a/c recharge", 1.0),
    // Electrical / starting
    fixed("battery", "battery replacement", 0.5),
    range("alternator", "alternator", 1.5, 3.0),
    range("starter", "starter motor", 1.5, 3.0),
    range("spark plugs", "spark plugs", 1.0, 2.5),
    range("ignition coil", "ignition coil", 0.5, 1.5),
    // Engine
    fixed("serpentine belt", "serpentine belt", 0.5),
    range("timing belt", "timing belt", 3.5, 6.0),
    range("water pump", "water pump", 2.0, 4.0),
    range("thermostat", "thermostat", 1.0, 2.0),
    range("radiator", "radiator", 2.0, 3.0),
    range("fuel pump", "fuel pump", 2.0, 4.0),
    range("o2 sensor", "oxygen sensor", 0.5, 1.0),
    range("oxygen sensor", "oxygen sensor", 0.5, 1.0),
    range("catalytic converter", "catalytic converter", 1.5, 2.5),
    // Suspension / steering
    range("front struts", "struts front", 2.5, 3.5),
    range("shocks", "shocks", 1.5, 2.5),
    range("wheel bearing", "wheel bearing", 1.5, 2.5),
    range("cv axle", "cv axle", 1.5, 2.0),
    range("tie rod", "tie rod end", 1.0, 1.5),
    range("control arm", "control arm", 1.5, 2.5),
    // Diagnosis
    fixed("check engine light", "check engine diagnosis", 1.0),
    fixed("diagnostic", "diagnostic", 1.0),
];

/// Returns the first entry of `table` whose pattern occurs in `description`.
/// Total over any input; an empty description never matches.
pub fn match_description(table: &[FlatRateEntry], description: &str) -> Option<FlatRateMatch> {
    let needle = description.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|entry| needle.contains(entry.pattern))
        .map(FlatRateMatch::from)
}

/// Matches against [`FLAT_RATE_TABLE`].
pub fn lookup(description: &str) -> Option<FlatRateMatch> {
    match_description(FLAT_RATE_TABLE, description)
}
