//! Tone calibration: maps the detected JD tone to verbs worth leading bullets
//! with, and verbs that read wrong for that kind of employer.

use serde::Serialize;

use crate::jobs::jd_parser::JobTone;

/// Verb sets calibrated to a specific JD tone.
#[derive(Debug, Clone)]
pub struct ToneGuidance {
    pub strong_verbs: &'static [&'static str],
    /// Lower-case; matched against the start of resume bullets.
    pub avoid_verbs: &'static [&'static str],
}

/// A resume bullet that opens with a verb the target tone discourages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscouragedVerb {
    pub verb: String,
    pub bullet: String,
}

pub fn tone_guidance(tone: JobTone) -> ToneGuidance {
    match tone {
        JobTone::AggressiveStartup => ToneGuidance {
            strong_verbs: &[
                "Architected",
                "Spearheaded",
                "Owned",
                "Drove",
                "Built",
                "Shipped",
                "Launched",
                "Led",
            ],
            avoid_verbs: &["assisted", "helped", "supported", "participated in", "was involved in"],
        },
        JobTone::CollaborativeEnterprise => ToneGuidance {
            strong_verbs: &[
                "Contributed to",
                "Partnered with",
                "Supported",
                "Enabled",
                "Collaborated on",
                "Facilitated",
            ],
            avoid_verbs: &["spearheaded", "solely built", "owned end-to-end", "disrupted"],
        },
        JobTone::ResearchOriented => ToneGuidance {
            strong_verbs: &[
                "Investigated",
                "Designed and evaluated",
                "Published",
                "Proposed",
                "Analyzed",
                "Studied",
            ],
            avoid_verbs: &["shipped", "launched", "moved fast", "disrupted", "hustled"],
        },
        JobTone::ProductOriented => ToneGuidance {
            strong_verbs: &[
                "Shipped",
                "Delivered",
                "Launched",
                "Improved",
                "Reduced friction for",
                "Enabled",
            ],
            avoid_verbs: &["investigated", "researched", "studied", "theorized"],
        },
    }
}

/// Bullets whose first words are one of the tone's avoid-list verbs.
pub fn find_discouraged_verbs<'a>(
    bullets: impl IntoIterator<Item = &'a str>,
    tone: JobTone,
) -> Vec<DiscouragedVerb> {
    let guidance = tone_guidance(tone);
    bullets
        .into_iter()
        .filter_map(|bullet| {
            let lower = bullet.trim().to_lowercase();
            guidance
                .avoid_verbs
                .iter()
                .find(|verb| {
                    lower.strip_prefix(**verb).is_some_and(|rest| {
                        rest.chars().next().map_or(true, |c| !c.is_alphanumeric())
                    })
                })
                .map(|verb| DiscouragedVerb {
                    verb: verb.to_string(),
                    bullet: bullet.to_string(),
                })
        })
        .collect()
}
