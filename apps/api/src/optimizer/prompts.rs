// Prompts for bullet rewrites.
// Shared fragments come from llm_client::prompts.

/// Rewrite prompt template. Replace `{no_invention_instruction}`, `{tone}`,
/// `{verbs_json}`, `{keywords_json}` and `{bullets_json}` before sending.
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite the following resume bullets so they read stronger for a specific job posting.

{no_invention_instruction}

TARGET TONE: {tone}
Prefer opening bullets with one of these verbs when it is accurate: {verbs_json}

KEYWORDS THE POSTING ASKS FOR THAT THE RESUME DOES NOT MENTION:
{keywords_json}

BULLETS (index, text):
{bullets_json}

Rules:
- Keep each rewrite to one line, at most 30 words.
- Lead with a concrete action verb.
- Keep every number, tool and result that the original bullet states.
- Never add a number that is not in the original. Use [LOW_METRICS] where a metric belongs.
- Return one entry per input bullet, using the same index.

Return a JSON object with this EXACT schema (no extra fields):
{
  "rewrites": [
    {"index": 0, "rewritten": "Led migration of ... [LOW_METRICS]", "keywords_used": ["Kubernetes"]}
  ]
}"#;
