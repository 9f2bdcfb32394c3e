//! LLM bullet rewrites. The model output is checked before it reaches the
//! caller: rewrites that add numbers the original bullet never had are dropped.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::jobs::jd_parser::JobTone;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::optimizer::prompts::REWRITE_PROMPT_TEMPLATE;
use crate::optimizer::tone::tone_guidance;

/// Upper bound on bullets sent in one request.
pub const MAX_REWRITE_BULLETS: usize = 10;

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulletRewrite {
    pub original: String,
    pub rewritten: String,
    pub keywords_used: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RewriteResponse {
    rewrites: Vec<RawRewrite>,
}

#[derive(Debug, Deserialize)]
struct RawRewrite {
    index: usize,
    rewritten: String,
    #[serde(default)]
    keywords_used: Vec<String>,
}

pub fn build_rewrite_prompt(
    bullets: &[String],
    keywords: &[String],
    tone: JobTone,
) -> Result<String, AppError> {
    let verbs_json = serde_json::to_string(tone_guidance(tone).strong_verbs)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize verbs: {e}")))?;
    let keywords_json = serde_json::to_string(keywords)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize keywords: {e}")))?;
    let bullets_json = serde_json::to_string_pretty(
        &bullets
            .iter()
            .enumerate()
            .map(|(index, text)| serde_json::json!({ "index": index, "text": text }))
            .collect::<Vec<_>>(),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize bullets: {e}")))?;

    Ok(REWRITE_PROMPT_TEMPLATE
        .replace("{no_invention_instruction}", NO_INVENTION_INSTRUCTION)
        .replace("{tone}", &format!("{tone:?}"))
        .replace("{verbs_json}", &verbs_json)
        .replace("{keywords_json}", &keywords_json)
        .replace("{bullets_json}", &bullets_json))
}

/// Sends up to `MAX_REWRITE_BULLETS` bullets to the LLM and returns the rewrites that pass validation.
pub async fn rewrite_bullets(
    llm: &LlmClient,
    bullets: &[String],
    keywords: &[String],
    tone: JobTone,
) -> Result<Vec<BulletRewrite>, AppError> {
    let bullets = &bullets[..bullets.len().min(MAX_REWRITE_BULLETS)];
    if bullets.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_rewrite_prompt(bullets, keywords, tone)?;
    let response: RewriteResponse = llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?;

    let rewrites = validate_rewrites(bullets, keywords, response);
    info!("LLM rewrote {}/{} bullets", rewrites.len(), bullets.len());
    Ok(rewrites)
}

fn validate_rewrites(
    bullets: &[String],
    keywords: &[String],
    response: RewriteResponse,
) -> Vec<BulletRewrite> {
    let mut seen = HashSet::new();
    let mut rewrites = Vec::new();

    for raw in response.rewrites {
        let Some(original) = bullets.get(raw.index) else {
            warn!("Dropping rewrite with unknown index {}", raw.index);
            continue;
        };
        let rewritten = raw.rewritten.trim();
        if rewritten.is_empty() || !seen.insert(raw.index) {
            continue;
        }
        if let Some(number) = invented_number(original, rewritten) {
            warn!("Dropping rewrite of bullet {}: adds number {number}", raw.index);
            continue;
        }

        let rewritten_lower = rewritten.to_lowercase();
        let keywords_used = raw
            .keywords_used
            .into_iter()
            .filter(|k| {
                keywords.iter().any(|known| known.eq_ignore_ascii_case(k))
                    && rewritten_lower.contains(&k.to_lowercase())
            })
            .collect();

        rewrites.push(BulletRewrite {
            original: original.clone(),
            rewritten: rewritten.to_string(),
            keywords_used,
        });
    }

    rewrites.sort_by_key(|r| bullets.iter().position(|b| *b == r.original));
    rewrites
}

/// First number in `rewritten` that does not appear in `original`.
fn invented_number<'a>(original: &str, rewritten: &'a str) -> Option<&'a str> {
    let known: HashSet<&str> = NUMBER.find_iter(original).map(|m| m.as_str()).collect();
    NUMBER
        .find_iter(rewritten)
        .map(|m| m.as_str())
        .find(|n| !known.contains(n))
}
