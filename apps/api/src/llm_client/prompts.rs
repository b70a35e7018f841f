// Shared prompt fragments. Feature modules keep their own prompts.rs
// alongside the code that sends them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Reminder that numeric fields must be plain numbers.
pub const NUMERIC_FIELDS_INSTRUCTION: &str = "\
    All hours, rates, costs and percentages must be plain JSON numbers \
    (no currency symbols, units or ranges).";
