use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactIssue {
    VagueVerb,
    VagueScale,
    NoMetric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactGap {
    pub issue: ImpactIssue,
    pub reason: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactCheck {
    pub bullet: String,
    pub quantified: bool,
    pub gaps: Vec<ImpactGap>,
}

const VAGUE_VERBS: &[&str] = &[
    "improved",
    "enhanced",
    "helped",
    "worked on",
    "assisted",
    "supported",
    "participated",
    "involved",
    "responsible for",
];

const VAGUE_SCALE_WORDS: &[&str] = &[
    "significant",
    "major",
    "large",
    "huge",
    "massive",
    "substantial",
    "considerable",
    "great",
    "many",
    "numerous",
    "various",
    "several",
];

/// A bullet counts as quantified when it carries any concrete measure:
/// a digit, `%`, a currency sign or the `[LOW_METRICS]` marker.
pub fn is_quantified(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        || text.contains("[LOW_METRICS]")
        || text.contains('%')
        || text.contains(['$', '€', '£', '₹'])
}

/// Checks one resume bullet for measurable impact.
///
/// Quantified bullets pass without further checks. Otherwise the first vague
/// verb and the first vague scale word are reported; with neither, a generic
/// "no metric" gap is reported.
pub fn check_impact(text: &str) -> ImpactCheck {
    if is_quantified(text) {
        return ImpactCheck {
            bullet: text.to_string(),
            quantified: true,
            gaps: vec![],
        };
    }

    let lower = text.to_lowercase();
    let mut gaps = Vec::new();

    if let Some(verb) = VAGUE_VERBS.iter().find(|v| contains_word(&lower, v)) {
        gaps.push(ImpactGap {
            issue: ImpactIssue::VagueVerb,
            reason: format!("Uses vague verb '{verb}' without a measurable outcome"),
            suggestion: format!(
                "Say how much: '{verb}' X by N%, saving Y hours, or tag with [LOW_METRICS]"
            ),
        });
    }

    if let Some(word) = VAGUE_SCALE_WORDS.iter().find(|w| contains_word(&lower, w)) {
        gaps.push(ImpactGap {
            issue: ImpactIssue::VagueScale,
            reason: format!("Uses vague scale word '{word}' without a number"),
            suggestion: format!("Replace '{word}' with a specific number: e.g. '5x', '40%', '3 weeks'"),
        });
    }

    if gaps.is_empty() {
        gaps.push(ImpactGap {
            issue: ImpactIssue::NoMetric,
            reason: "No quantified outcome found".to_string(),
            suggestion: "Add a number, percentage, time saved or team size. If no data exists, append [LOW_METRICS]".to_string(),
        });
    }

    ImpactCheck {
        bullet: text.to_string(),
        quantified: false,
        gaps,
    }
}

fn contains_word(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        before.map_or(true, |c| !c.is_alphanumeric()) && after.map_or(true, |c| !c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_with_percentage() {
        assert!(check_impact("Reduced latency by 40% through caching").quantified);
    }

    #[test]
    fn test_pass_with_currency() {
        assert!(check_impact("Saved $50,000 annually by optimizing queries").quantified);
        assert!(check_impact("Generated €200k in new revenue").quantified);
    }

    #[test]
    fn test_pass_with_count() {
        assert!(check_impact("Trained 15 engineers on the new deployment process").quantified);
    }

    #[test]
    fn test_pass_with_low_metrics_marker() {
        assert!(check_impact("Improved system performance [LOW_METRICS]").quantified);
    }

    #[test]
    fn test_fail_vague_verb() {
        let check = check_impact("Improved the user experience");
        assert!(!check.quantified);
        assert_eq!(check.gaps[0].issue, ImpactIssue::VagueVerb);
        assert!(check.gaps[0].reason.contains("improved"));
    }

    #[test]
    fn test_fail_vague_scale_word() {
        let check = check_impact("Achieved significant performance gains");
        assert!(!check.quantified);
        assert_eq!(check.gaps.len(), 1);
        assert_eq!(check.gaps[0].issue, ImpactIssue::VagueScale);
    }

    #[test]
    fn test_fail_vague_verb_and_scale() {
        let check = check_impact("Worked on various internal tools");
        let issues: Vec<_> = check.gaps.iter().map(|g| g.issue.clone()).collect();
        assert_eq!(issues, vec![ImpactIssue::VagueVerb, ImpactIssue::VagueScale]);
    }

    #[test]
    fn test_fail_no_metric() {
        let check = check_impact("Architected the authentication system");
        assert!(!check.quantified);
        assert_eq!(check.gaps[0].issue, ImpactIssue::NoMetric);
    }

    #[test]
    fn test_vague_words_match_whole_words_only() {
        // "largely" is not the scale word "large"
        let check = check_impact("Rewrote the largely manual release flow");
        assert_eq!(check.gaps[0].issue, ImpactIssue::NoMetric);
    }
}
