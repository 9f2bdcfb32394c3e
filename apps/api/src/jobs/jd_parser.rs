//! JD Parser: extracts structured requirements, keywords, and tone from a raw job description.
//!
//! Fully deterministic: sections are found from headings, keywords come from the
//! skill lexicon, and tone is a cue-word vote.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon;

/// Detected tone of a job description. Drives verb selection in the optimizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobTone {
    AggressiveStartup,
    #[default]
    CollaborativeEnterprise,
    ResearchOriented,
    ProductOriented,
}

/// A single requirement extracted from the JD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub text: String,
    pub is_required: bool,
}

/// High-level signals about the role shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSignals {
    pub is_startup: bool,
    pub is_ic_focused: bool,
    pub is_research: bool,
    pub seniority: String,
}

/// A single keyword from the JD, weighted by position and frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub frequency: u32,
    /// title=1.0, requirements=0.8, responsibilities=0.6, about=0.3
    pub position_weight: f32,
    /// frequency * position_weight
    pub weighted_score: f32,
}

/// Full structured output of JD parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedJobDescription {
    pub hard_requirements: Vec<Requirement>,
    pub soft_signals: Vec<String>,
    pub role_signals: RoleSignals,
    pub keyword_inventory: Vec<KeywordEntry>,
    pub detected_tone: JobTone,
}

impl ParsedJobDescription {
    /// True when a required (not preferred) requirement names the keyword.
    pub fn is_required_keyword(&self, keyword: &str) -> bool {
        let skill = lexicon::canonicalize(keyword);
        self.hard_requirements
            .iter()
            .filter(|r| r.is_required)
            .any(|r| match skill {
                Some(skill) => lexicon::count_occurrences(&r.text, skill) > 0,
                None => lexicon::contains_term(&r.text, keyword),
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JdSection {
    Intro,
    Requirements,
    Preferred,
    Responsibilities,
    About,
}

impl JdSection {
    fn weight(self) -> f32 {
        match self {
            JdSection::Intro => 0.5,
            JdSection::Requirements | JdSection::Preferred => 0.8,
            JdSection::Responsibilities => 0.6,
            JdSection::About => 0.3,
        }
    }
}

const TITLE_WEIGHT: f32 = 1.0;

/// Checked in order: "preferred qualifications" must land in Preferred, not Requirements.
const SECTION_HEADINGS: &[(JdSection, &[&str])] = &[
    (
        JdSection::Preferred,
        &["preferred", "nice to have", "nice-to-have", "bonus", "bonus points", "pluses"],
    ),
    (
        JdSection::Requirements,
        &[
            "requirements",
            "qualifications",
            "must have",
            "must-have",
            "what you need",
            "what you'll bring",
            "what you will bring",
            "required",
            "you have",
        ],
    ),
    (
        JdSection::Responsibilities,
        &[
            "responsibilities",
            "what you'll do",
            "what you will do",
            "you will",
            "the role",
            "duties",
        ],
    ),
    (
        JdSection::About,
        &["about us", "about", "who we are", "benefits", "perks", "company"],
    ),
];

const MAX_HEADING_WORDS: usize = 5;

const PREFERRED_MARKERS: &[&str] = &["preferred", "nice to have", "nice-to-have", "bonus", "a plus"];
const REQUIRED_MARKERS: &[&str] = &["required", "must have", "must-have", "minimum", "at least"];

static PLUS_YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d{1,2}\s*\+\s*(?:years?|yrs)\b").unwrap());
static YEARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*\+?\s*(?:years?|yrs)\b").unwrap());
static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.;]\s+").unwrap());

// ────────────────────────────────────────────────────────────────────────────
// Role signal and tone cues
// ────────────────────────────────────────────────────────────────────────────

const STARTUP_CUES: &[&str] = &[
    "startup",
    "start-up",
    "early-stage",
    "early stage",
    "seed",
    "series a",
    "series b",
    "series c",
    "founding",
    "fast-paced",
];

const RESEARCH_CUES: &[&str] = &[
    "research",
    "publish",
    "publications",
    "phd",
    "papers",
    "novel",
    "neurips",
    "icml",
    "state of the art",
];

const MANAGEMENT_CUES: &[&str] = &[
    "direct reports",
    "people management",
    "manage a team",
    "managing a team",
    "lead a team",
    "hire and grow",
    "performance reviews",
    "engineering manager",
];

const MANAGER_TITLE_WORDS: &[&str] = &["manager", "director", "head", "vp"];

const TONE_CUES: &[(JobTone, &[&str])] = &[
    (
        JobTone::AggressiveStartup,
        &[
            "own",
            "ownership",
            "drive",
            "move fast",
            "spearhead",
            "disrupt",
            "disrupting",
            "fast-paced",
            "scrappy",
        ],
    ),
    (
        JobTone::CollaborativeEnterprise,
        &[
            "partner",
            "collaborate",
            "collaborative",
            "contribute",
            "support",
            "cross-functional",
            "stakeholders",
        ],
    ),
    (
        JobTone::ResearchOriented,
        &["investigate", "publish", "evaluate", "propose", "research", "novel"],
    ),
    (
        JobTone::ProductOriented,
        &["ship", "launch", "deliver", "user experience", "customer", "customers"],
    ),
];

// ────────────────────────────────────────────────────────────────────────────
// Parsing
// ────────────────────────────────────────────────────────────────────────────

struct Segment {
    section: JdSection,
    text: String,
}

/// Parses a job posting into requirements, weighted keywords, role signals and tone.
pub fn parse_job_description(title: &str, description: &str) -> ParsedJobDescription {
    let segments = segment_description(description);

    let mut hard_requirements = Vec::new();
    let mut soft_signals = Vec::new();
    for segment in &segments {
        let lower = segment.text.to_lowercase();
        let preferred = segment.section == JdSection::Preferred
            || PREFERRED_MARKERS.iter().any(|m| contains_phrase(&lower, m));
        let required = segment.section == JdSection::Requirements
            || REQUIRED_MARKERS.iter().any(|m| contains_phrase(&lower, m))
            || PLUS_YEARS.is_match(&segment.text);

        if preferred {
            soft_signals.push(segment.text.clone());
            hard_requirements.push(Requirement {
                text: segment.text.clone(),
                is_required: false,
            });
        } else if required {
            hard_requirements.push(Requirement {
                text: segment.text.clone(),
                is_required: true,
            });
        }
    }

    let required_years = hard_requirements
        .iter()
        .filter(|r| r.is_required)
        .flat_map(|r| YEARS.captures_iter(&r.text))
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max();

    let full_lower = format!("{title}\n{description}").to_lowercase();

    ParsedJobDescription {
        hard_requirements,
        soft_signals,
        role_signals: detect_role_signals(title, &full_lower, required_years),
        keyword_inventory: build_keyword_inventory(title, &segments),
        detected_tone: detect_tone(&full_lower),
    }
}

/// Splits the description into sentence-sized segments tagged with the section they sit in.
/// Heading-only lines change the section and produce no segment.
fn segment_description(description: &str) -> Vec<Segment> {
    let mut section = JdSection::Intro;
    let mut segments = Vec::new();

    for line in description.lines() {
        let line = line.trim().trim_start_matches(['•', '-', '*', '·', '#']).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(heading) = whole_line_heading(line) {
            section = heading;
            continue;
        }

        // "Required: Java, SQL. Preferred: Kubernetes" switches section mid-line.
        for sentence in SENTENCE_BREAK.split(line) {
            let content = match sentence.split_once(':') {
                Some((prefix, rest)) => match prefix_heading(prefix) {
                    Some(heading) => {
                        section = heading;
                        rest
                    }
                    None => sentence,
                },
                None => sentence,
            };

            let text = content.trim().trim_end_matches(['.', ';', ',']).trim();
            if !text.is_empty() {
                segments.push(Segment {
                    section,
                    text: text.to_string(),
                });
            }
        }
    }

    segments
}

fn normalize_heading(text: &str) -> String {
    text.trim()
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’')
        .replace('’', "'")
        .to_lowercase()
}

fn whole_line_heading(line: &str) -> Option<JdSection> {
    let normalized = normalize_heading(line);
    if normalized.split_whitespace().count() > MAX_HEADING_WORDS {
        return None;
    }
    SECTION_HEADINGS
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| *k == normalized))
        .map(|(section, _)| *section)
}

fn prefix_heading(prefix: &str) -> Option<JdSection> {
    let normalized = normalize_heading(prefix);
    if normalized.is_empty() || normalized.split_whitespace().count() > MAX_HEADING_WORDS {
        return None;
    }
    SECTION_HEADINGS
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| contains_phrase(&normalized, k)))
        .map(|(section, _)| *section)
}

fn build_keyword_inventory(title: &str, segments: &[Segment]) -> Vec<KeywordEntry> {
    // canonical -> (frequency, max position weight); Vec keeps first-seen order stable
    let mut order: Vec<&'static str> = Vec::new();
    let mut tallies: HashMap<&'static str, (u32, f32)> = HashMap::new();

    let sources = std::iter::once((title, TITLE_WEIGHT))
        .chain(segments.iter().map(|s| (s.text.as_str(), s.section.weight())));

    for (text, weight) in sources {
        for skill in lexicon::find_skills(text) {
            let count = lexicon::count_occurrences(text, skill);
            if count == 0 {
                continue;
            }
            let tally = tallies.entry(skill.canonical).or_insert_with(|| {
                order.push(skill.canonical);
                (0, 0.0)
            });
            tally.0 += count;
            tally.1 = tally.1.max(weight);
        }
    }

    let mut inventory: Vec<KeywordEntry> = order
        .into_iter()
        .filter_map(|keyword| {
            tallies.get(keyword).map(|&(frequency, position_weight)| KeywordEntry {
                keyword: keyword.to_string(),
                frequency,
                position_weight,
                weighted_score: frequency as f32 * position_weight,
            })
        })
        .collect();

    inventory.sort_by(|a, b| {
        b.weighted_score
            .total_cmp(&a.weighted_score)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    inventory
}

fn detect_role_signals(title: &str, full_lower: &str, required_years: Option<u32>) -> RoleSignals {
    let title_words: Vec<String> = title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    let title_has = |words: &[&str]| title_words.iter().any(|w| words.contains(&w.as_str()));

    let is_startup = STARTUP_CUES.iter().any(|c| contains_phrase(full_lower, c));

    let research_hits = RESEARCH_CUES
        .iter()
        .filter(|c| contains_phrase(full_lower, c))
        .count();
    let is_research = title_has(&["research", "researcher", "scientist"]) || research_hits >= 2;

    let manages_people = MANAGEMENT_CUES.iter().any(|c| contains_phrase(full_lower, c))
        || title_has(MANAGER_TITLE_WORDS);

    let seniority = if title_has(&["principal", "staff"]) {
        "staff"
    } else if title_has(&["senior", "sr", "lead"]) {
        "senior"
    } else if title_has(&["junior", "jr", "entry", "graduate", "intern"]) {
        "junior"
    } else if required_years.is_some_and(|y| y >= 5) {
        "senior"
    } else {
        "mid"
    };

    RoleSignals {
        is_startup,
        is_ic_focused: !manages_people,
        is_research,
        seniority: seniority.to_string(),
    }
}

/// Highest cue count wins; ties and zero counts fall back to the default tone.
fn detect_tone(full_lower: &str) -> JobTone {
    let counts: Vec<(JobTone, usize)> = TONE_CUES
        .iter()
        .map(|(tone, cues)| {
            let count = cues.iter().map(|c| count_phrase(full_lower, c)).sum();
            (*tone, count)
        })
        .collect();

    let best = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let leaders: Vec<JobTone> = counts
        .iter()
        .filter(|(_, c)| *c == best)
        .map(|(t, _)| *t)
        .collect();

    match leaders.as_slice() {
        [single] if best > 0 => *single,
        _ => JobTone::default(),
    }
}

fn count_phrase(haystack: &str, phrase: &str) -> usize {
    haystack
        .match_indices(phrase)
        .filter(|(start, _)| {
            let end = start + phrase.len();
            let before = haystack[..*start].chars().next_back();
            let after = haystack[end..].chars().next();
            before.map_or(true, |c| !c.is_alphanumeric())
                && after.map_or(true, |c| !c.is_alphanumeric())
        })
        .count()
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    count_phrase(haystack, phrase) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    // JD fixture: Aggressive startup
    const STARTUP_JD: &str = r#"
        Senior Rust Engineer — Core Infrastructure
        We move fast and own everything end-to-end. You will architect distributed systems,
        spearhead performance initiatives, and drive reliability from zero to production.
        Requirements: 5+ years Rust required, systems programming required, distributed systems expertise required.
        Nice to have: Kubernetes, Kafka experience a plus.
        About Us: Fast-paced Series B startup disrupting fintech infrastructure.
    "#;

    // JD fixture: Collaborative enterprise
    const ENTERPRISE_JD: &str = r#"
        Software Engineer — Platform Team
        Join our collaborative team to contribute to our microservices platform.
        You will partner with product managers and support reliability goals.
        Required: Java, Spring Boot, SQL. Preferred: Kubernetes, CI/CD experience.
        About: Global enterprise with 50,000 employees focused on financial services.
    "#;

    // JD fixture: Research role
    const RESEARCH_JD: &str = r#"
        Research Scientist — ML Systems
        Investigate novel approaches to large language model training efficiency.
        Publish findings in top venues (NeurIPS, ICML). Evaluate proposed architectures.
        Required: PhD in CS/ML, experience with PyTorch. Preferred: Publications at top venues.
        About: Research lab at the frontier of AI.
    "#;

    const PRODUCT_JD: &str = "\
The Role
You will ship features customers love and launch new flows every quarter.
We deliver a great user experience to every customer.

What you'll bring
- 3+ years with TypeScript and React
- Experience with PostgreSQL
";

    fn keyword<'a>(parsed: &'a ParsedJobDescription, name: &str) -> &'a KeywordEntry {
        parsed
            .keyword_inventory
            .iter()
            .find(|k| k.keyword == name)
            .unwrap_or_else(|| panic!("keyword {name} missing"))
    }

    #[test]
    fn test_detects_aggressive_startup_tone() {
        let parsed = parse_job_description("Senior Rust Engineer", STARTUP_JD);
        assert_eq!(parsed.detected_tone, JobTone::AggressiveStartup);
        assert!(parsed.role_signals.is_startup);
        assert!(parsed.role_signals.is_ic_focused);
        assert!(!parsed.role_signals.is_research);
        assert_eq!(parsed.role_signals.seniority, "senior");
    }

    #[test]
    fn test_detects_collaborative_enterprise_tone() {
        let parsed = parse_job_description("Software Engineer", ENTERPRISE_JD);
        assert_eq!(parsed.detected_tone, JobTone::CollaborativeEnterprise);
        assert!(!parsed.role_signals.is_startup);
        assert_eq!(parsed.role_signals.seniority, "mid");
    }

    #[test]
    fn test_detects_research_tone_and_role() {
        let parsed = parse_job_description("Research Scientist", RESEARCH_JD);
        assert_eq!(parsed.detected_tone, JobTone::ResearchOriented);
        assert!(parsed.role_signals.is_research);
    }

    #[test]
    fn test_detects_product_tone() {
        let parsed = parse_job_description("Frontend Engineer", PRODUCT_JD);
        assert_eq!(parsed.detected_tone, JobTone::ProductOriented);
    }

    #[test]
    fn test_no_cues_defaults_to_collaborative() {
        let parsed = parse_job_description("Engineer", "Rust and SQL.");
        assert_eq!(parsed.detected_tone, JobTone::CollaborativeEnterprise);
    }

    #[test]
    fn test_tone_tie_defaults_to_collaborative() {
        // one startup cue, one product cue
        let parsed = parse_job_description("Engineer", "Drive the roadmap and ship it.");
        assert_eq!(parsed.detected_tone, JobTone::CollaborativeEnterprise);
    }

    #[test]
    fn test_requirements_and_soft_signals() {
        let parsed = parse_job_description("Senior Rust Engineer", STARTUP_JD);
        let required: Vec<_> = parsed
            .hard_requirements
            .iter()
            .filter(|r| r.is_required)
            .map(|r| r.text.as_str())
            .collect();
        assert!(required.iter().any(|t| t.starts_with("5+ years Rust required")));
        assert_eq!(parsed.soft_signals, vec!["Kubernetes, Kafka experience a plus"]);
        assert!(parsed
            .hard_requirements
            .iter()
            .any(|r| !r.is_required && r.text.contains("Kafka")));
    }

    #[test]
    fn test_inline_headings_switch_sections() {
        let parsed = parse_job_description("Software Engineer", ENTERPRISE_JD);
        assert!(parsed
            .hard_requirements
            .iter()
            .any(|r| r.is_required && r.text == "Java, Spring Boot, SQL"));
        assert!(parsed.soft_signals.iter().any(|s| s == "Kubernetes, CI/CD experience"));
        assert!(parsed.is_required_keyword("Spring Boot"));
        assert!(parsed.is_required_keyword("java"));
        assert!(!parsed.is_required_keyword("Kubernetes"));
    }

    #[test]
    fn test_keyword_weights_and_frequency() {
        let parsed = parse_job_description("Senior Rust Engineer", STARTUP_JD);

        let rust = keyword(&parsed, "Rust");
        assert_eq!(rust.frequency, 3);
        assert!((rust.position_weight - 1.0).abs() < f32::EPSILON);

        let distributed = keyword(&parsed, "Distributed Systems");
        assert_eq!(distributed.frequency, 2);
        assert!((distributed.position_weight - 0.8).abs() < f32::EPSILON);

        let kafka = keyword(&parsed, "Kafka");
        assert!((kafka.position_weight - 0.8).abs() < f32::EPSILON);

        assert_eq!(parsed.keyword_inventory[0].keyword, "Rust");
    }

    #[test]
    fn test_keyword_inventory_invariants() {
        for (title, jd) in [
            ("Senior Rust Engineer", STARTUP_JD),
            ("Software Engineer", ENTERPRISE_JD),
            ("Research Scientist", RESEARCH_JD),
            ("Frontend Engineer", PRODUCT_JD),
        ] {
            let parsed = parse_job_description(title, jd);
            for entry in &parsed.keyword_inventory {
                let expected = entry.frequency as f32 * entry.position_weight;
                assert!((entry.weighted_score - expected).abs() < f32::EPSILON);
            }
            for pair in parsed.keyword_inventory.windows(2) {
                assert!(pair[0].weighted_score >= pair[1].weighted_score);
            }
        }
    }

    #[test]
    fn test_heading_lines_set_section_weight() {
        let parsed = parse_job_description("Frontend Engineer", PRODUCT_JD);
        let react = keyword(&parsed, "React");
        assert!((react.position_weight - 0.8).abs() < f32::EPSILON);
        assert!(parsed
            .hard_requirements
            .iter()
            .any(|r| r.is_required && r.text.contains("PostgreSQL")));
    }

    #[test]
    fn test_seniority_from_title_and_years() {
        let staff = parse_job_description("Staff Engineer", "Build things.");
        assert_eq!(staff.role_signals.seniority, "staff");

        let junior = parse_job_description("Junior Developer", "Build things.");
        assert_eq!(junior.role_signals.seniority, "junior");

        let by_years = parse_job_description("Backend Engineer", "Requirements: 7+ years of Go");
        assert_eq!(by_years.role_signals.seniority, "senior");
    }

    #[test]
    fn test_people_management_is_not_ic() {
        let parsed = parse_job_description(
            "Engineering Manager",
            "You will manage a team of 8 engineers with direct reports.",
        );
        assert!(!parsed.role_signals.is_ic_focused);
    }

    #[test]
    fn test_jd_tone_serde_names() {
        let tone: JobTone = serde_json::from_str(r#""AggressiveStartup""#).unwrap();
        assert_eq!(tone, JobTone::AggressiveStartup);
        assert_eq!(
            serde_json::to_string(&JobTone::ProductOriented).unwrap(),
            r#""ProductOriented""#
        );
    }

    #[test]
    fn test_parsed_jd_full_deserializes_correctly() {
        let json = r#"{
            "hard_requirements": [
                {"text": "5+ years Rust", "is_required": true},
                {"text": "Systems programming", "is_required": true}
            ],
            "soft_signals": ["Kubernetes experience", "Kafka"],
            "role_signals": {
                "is_startup": true,
                "is_ic_focused": true,
                "is_research": false,
                "seniority": "senior"
            },
            "keyword_inventory": [
                {
                    "keyword": "Rust",
                    "frequency": 5,
                    "position_weight": 0.8,
                    "weighted_score": 4.0
                }
            ],
            "detected_tone": "AggressiveStartup"
        }"#;

        let parsed: ParsedJobDescription = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.detected_tone, JobTone::AggressiveStartup);
        assert_eq!(parsed.hard_requirements.len(), 2);
        assert!(parsed.role_signals.is_startup);
        assert_eq!(parsed.role_signals.seniority, "senior");
    }
}
