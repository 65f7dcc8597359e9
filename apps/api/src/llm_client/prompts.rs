// Cross-cutting prompt fragments shared by the recognition prompts.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps every judgement tied to logged activity.
pub const EVIDENCE_INSTRUCTION: &str = "\
    CRITICAL: Base every statement on the activities and nominations provided. \
    Do NOT infer, interpolate, or invent accomplishments. \
    If the data does not support a claim, leave it out.";

/// The shared 1-4 performance scale used by both rubrics.
pub const RATING_SCALE: &str = "\
    Use the 1-4 rating scale defined in the rubrics: \
    1 = Needs Improvement, 2 = Meets Expectations, \
    3 = Exceeds Expectations, 4 = Outstanding.";
