//! Fit Scoring: pluggable, trait-based scorer that measures a resume against a parsed JD.
//!
//! Default: `KeywordFitScorer` (pure-Rust, fast, deterministic, fully testable).
//!
//! `AppState` holds an `Arc<dyn FitScorer>`, so other backends can be swapped in
//! at startup without touching handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::jd_parser::ParsedJobDescription;
use crate::lexicon::{self, Skill};
use crate::resume::models::ParsedResume;

// ────────────────────────────────────────────────────────────────────────────
// Input: what the scorer knows about the candidate
// ────────────────────────────────────────────────────────────────────────────

/// The parts of a resume a scorer looks at.
#[derive(Debug, Clone, Default)]
pub struct CandidateProfile {
    /// Skills as listed on the resume.
    pub skills: Vec<String>,
    /// Full extracted resume text.
    pub text: String,
}

impl CandidateProfile {
    pub fn from_resume(parsed: &ParsedResume, raw_text: &str) -> Self {
        Self {
            skills: parsed.skills.clone(),
            text: raw_text.to_string(),
        }
    }

    fn lists_skill(&self, keyword: &str, skill: Option<&Skill>) -> bool {
        self.skills.iter().any(|listed| {
            listed.eq_ignore_ascii_case(keyword)
                || matches!(
                    (skill, lexicon::canonicalize(listed)),
                    (Some(a), Some(b)) if a.canonical == b.canonical
                )
        })
    }

    fn mentions(&self, keyword: &str, skill: Option<&Skill>) -> bool {
        match skill {
            Some(skill) => lexicon::count_occurrences(&self.text, skill) > 0,
            None => lexicon::contains_term(&self.text, keyword),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output data models (shared across all scorer backends)
// ────────────────────────────────────────────────────────────────────────────

/// A single matched dimension between the resume and a JD keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitMatch {
    pub dimension: String,
    pub resume_evidence: String, // where on the resume it was found
    pub jd_requirement: String,
    pub strength: f32, // 0.0 – 1.0
}

/// A JD keyword the resume does not cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub keyword: String,
    pub jd_frequency: u32,
    pub weighted_score: f32,
    pub suggestion: Option<String>, // closest listed skill, if any
}

/// Full fit report returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub overall_score: u32,             // 0 – 100
    pub strong_matches: Vec<FitMatch>,  // strength ≥ 0.8
    pub partial_matches: Vec<FitMatch>, // 0.4 – 0.79
    pub gaps: Vec<Gap>,                 // strength < 0.4, highest JD weight first
    pub recommendation: String,
    pub scorer_backend: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The fit scorer trait. Implement this to swap backends without touching
/// the endpoint, handler, or caller code.
///
/// Carried in `AppState` as `Arc<dyn FitScorer>`.
#[async_trait]
pub trait FitScorer: Send + Sync {
    async fn score(
        &self,
        profile: &CandidateProfile,
        parsed_jd: &ParsedJobDescription,
    ) -> Result<FitReport, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordFitScorer (default)
// ────────────────────────────────────────────────────────────────────────────

/// Pure-Rust keyword-based fit scorer. Fast, deterministic, no LLM call.
///
/// Algorithm:
/// 1. For each keyword in `keyword_inventory`:
///    - listed in the resume's skills → strength 1.0
///    - whole-term match in the resume text → strength 0.6
///    - no match → strength 0.0
/// 2. overall_score = Σ(strength × weighted_score) / Σ(weighted_score) × 100
/// 3. Classify: strong (≥0.8), partial (0.4–0.79), gap (<0.4)
pub struct KeywordFitScorer;

#[async_trait]
impl FitScorer for KeywordFitScorer {
    async fn score(
        &self,
        profile: &CandidateProfile,
        parsed_jd: &ParsedJobDescription,
    ) -> Result<FitReport, AppError> {
        Ok(compute_keyword_fit(profile, parsed_jd))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core keyword fit algorithm
// ────────────────────────────────────────────────────────────────────────────

pub fn compute_keyword_fit(
    profile: &CandidateProfile,
    parsed_jd: &ParsedJobDescription,
) -> FitReport {
    let keywords = &parsed_jd.keyword_inventory;

    if keywords.is_empty() {
        return FitReport {
            overall_score: 0,
            strong_matches: vec![],
            partial_matches: vec![],
            gaps: vec![],
            recommendation: "No recognizable skills found in the job description, so fit cannot be scored."
                .to_string(),
            scorer_backend: "keyword".to_string(),
        };
    }

    let mut strong_matches = Vec::new();
    let mut partial_matches = Vec::new();
    let mut gaps = Vec::new();

    let mut total_weighted = 0.0_f32;
    let mut total_score = 0.0_f32;

    for kw_entry in keywords {
        total_weighted += kw_entry.weighted_score;
        let skill = lexicon::canonicalize(&kw_entry.keyword);

        let (strength, evidence) = if profile.lists_skill(&kw_entry.keyword, skill) {
            (1.0, "skills section")
        } else if profile.mentions(&kw_entry.keyword, skill) {
            (0.6, "resume text")
        } else {
            (0.0, "")
        };

        total_score += strength * kw_entry.weighted_score;

        let fit_match = FitMatch {
            dimension: kw_entry.keyword.clone(),
            resume_evidence: evidence.to_string(),
            jd_requirement: kw_entry.keyword.clone(),
            strength,
        };

        if strength >= 0.8 {
            strong_matches.push(fit_match);
        } else if strength >= 0.4 {
            partial_matches.push(fit_match);
        } else {
            gaps.push(Gap {
                keyword: kw_entry.keyword.clone(),
                jd_frequency: kw_entry.frequency,
                weighted_score: kw_entry.weighted_score,
                suggestion: find_related_skill(&profile.skills, &kw_entry.keyword, skill)
                    .map(|related| format!("You list {related}; show how it relates to {}", kw_entry.keyword)),
            });
        }
    }

    let overall_score = if total_weighted > 0.0 {
        ((total_score / total_weighted) * 100.0).round().clamp(0.0, 100.0) as u32
    } else {
        0
    };

    let recommendation = build_recommendation(overall_score, &gaps, &partial_matches);

    FitReport {
        overall_score,
        strong_matches,
        partial_matches,
        gaps,
        recommendation,
        scorer_backend: "keyword".to_string(),
    }
}

/// A listed skill that overlaps the missing keyword by name or shares its lexicon category.
fn find_related_skill<'a>(
    listed: &'a [String],
    keyword: &str,
    skill: Option<&Skill>,
) -> Option<&'a str> {
    let keyword_lower = keyword.to_lowercase();
    listed
        .iter()
        .find(|s| {
            let lower = s.to_lowercase();
            lower.contains(&keyword_lower) || keyword_lower.contains(&lower)
        })
        .or_else(|| {
            let category = skill?.category;
            listed.iter().find(|s| {
                lexicon::canonicalize(s).is_some_and(|other| other.category == category)
            })
        })
        .map(String::as_str)
}

/// Builds a human-readable recommendation string from score and gaps.
fn build_recommendation(score: u32, gaps: &[Gap], partials: &[FitMatch]) -> String {
    let mut focus: Vec<&str> = gaps.iter().take(3).map(|g| g.keyword.as_str()).collect();
    if focus.is_empty() {
        focus = partials.iter().take(3).map(|m| m.dimension.as_str()).collect();
    }

    if score >= 80 {
        "Strong fit. Your resume directly covers the key requirements of this role.".to_string()
    } else if score >= 60 {
        format!(
            "Moderate fit ({score}/100). Consider highlighting: {}.",
            focus.join(", ")
        )
    } else {
        format!(
            "Low fit ({score}/100). Significant gaps: {}. Tailor your resume before applying.",
            focus.join(", ")
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
