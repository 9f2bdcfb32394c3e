use serde::Serialize;

use crate::jobs::jd_parser::{JobTone, ParsedJobDescription};
use crate::matching::fit_scoring::FitReport;
use crate::optimizer::rewrite::BulletRewrite;
use crate::optimizer::tone::{find_discouraged_verbs, tone_guidance, DiscouragedVerb};
use crate::resume::completeness::{compute_completeness_report, SectionStatus};
use crate::resume::impact::{check_impact, ImpactCheck};
use crate::resume::models::ParsedResume;

pub const MAX_MISSING_KEYWORDS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct MissingKeyword {
    pub keyword: String,
    pub weighted_score: f32,
    pub required: bool,
    pub advice: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub fit_score: u32,
    pub missing_keywords: Vec<MissingKeyword>,
    pub bullet_feedback: Vec<ImpactCheck>,
    pub tone: JobTone,
    pub recommended_verbs: Vec<String>,
    pub discouraged_verbs_found: Vec<DiscouragedVerb>,
    pub section_suggestions: Vec<String>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrites: Option<Vec<BulletRewrite>>,
}

impl OptimizationReport {
    /// Bullets that failed the impact check, in resume order.
    pub fn weak_bullets(&self) -> Vec<String> {
        self.bullet_feedback
            .iter()
            .filter(|c| !c.quantified)
            .map(|c| c.bullet.clone())
            .collect()
    }

    pub fn missing_keyword_names(&self) -> Vec<String> {
        self.missing_keywords.iter().map(|k| k.keyword.clone()).collect()
    }
}

/// Builds suggestions for tailoring `resume` to the job, given an already computed fit report.
pub fn optimize(
    resume: &ParsedResume,
    job: &ParsedJobDescription,
    fit: &FitReport,
) -> OptimizationReport {
    // fit.gaps is already ordered by JD weight
    let missing_keywords: Vec<MissingKeyword> = fit
        .gaps
        .iter()
        .take(MAX_MISSING_KEYWORDS)
        .map(|gap| {
            let required = job.is_required_keyword(&gap.keyword);
            let mut advice = if required {
                format!(
                    "Listed as a requirement. If you have {} experience, add it to your skills and show it in a bullet.",
                    gap.keyword
                )
            } else {
                format!(
                    "Mentioned in the posting. Add {} if it honestly applies to your work.",
                    gap.keyword
                )
            };
            if let Some(suggestion) = &gap.suggestion {
                advice.push(' ');
                advice.push_str(suggestion);
                advice.push('.');
            }
            MissingKeyword {
                keyword: gap.keyword.clone(),
                weighted_score: gap.weighted_score,
                required,
                advice,
            }
        })
        .collect();

    let bullet_feedback: Vec<ImpactCheck> = resume.bullets().map(check_impact).collect();

    let tone = job.detected_tone;
    let recommended_verbs = tone_guidance(tone)
        .strong_verbs
        .iter()
        .map(|v| v.to_string())
        .collect();
    let discouraged_verbs_found = find_discouraged_verbs(resume.bullets(), tone);

    let section_suggestions = section_suggestions(resume);

    let required_missing = missing_keywords.iter().filter(|k| k.required).count();
    let weak = bullet_feedback.iter().filter(|c| !c.quantified).count();
    let summary = format!(
        "Fit {}/100. {} missing keywords ({} required); {} of {} bullets lack a measurable outcome; {} section suggestions.",
        fit.overall_score,
        missing_keywords.len(),
        required_missing,
        weak,
        bullet_feedback.len(),
        section_suggestions.len()
    );

    OptimizationReport {
        fit_score: fit.overall_score,
        missing_keywords,
        bullet_feedback,
        tone,
        recommended_verbs,
        discouraged_verbs_found,
        section_suggestions,
        summary,
        rewrites: None,
    }
}

fn section_suggestions(resume: &ParsedResume) -> Vec<String> {
    let completeness = compute_completeness_report(resume);
    let mut suggestions: Vec<String> = completeness
        .sections
        .into_iter()
        .filter(|s| s.status != SectionStatus::Strong)
        .flat_map(|s| s.recommendations)
        .collect();

    for (missing, text) in [
        (resume.contact.email.is_none(), "Add an email address"),
        (resume.contact.phone.is_none(), "Add a phone number"),
    ] {
        if missing && !suggestions.iter().any(|s| s == text) {
            suggestions.push(text.to_string());
        }
    }
    suggestions
}
