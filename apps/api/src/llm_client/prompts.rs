// Prompt fragments shared by every LLM-backed feature.
// Feature-specific templates live in a prompts.rs next to the feature.

/// System prompt that forces a bare JSON answer.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt that edits resume content.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the text you are given. \
    Do NOT invent employers, numbers, percentages, tools or outcomes. \
    If a bullet has no measurable result, mark where one belongs with [LOW_METRICS] \
    instead of making one up. \
    Only work a missing keyword into a bullet when that bullet already describes related work.";
