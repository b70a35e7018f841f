// Estimate pipeline: flat-rate match → text generation → normalize → price → persist.
// All text-generation calls go through llm_client via the EstimateGenerator trait.

pub mod flat_rate;
pub mod generator;
pub mod handlers;
pub mod normalizer;
pub mod pipeline;
pub mod pricing;
pub mod prompts;
