use serde::{Deserialize, Serialize};

use crate::resume::impact::is_quantified;
use crate::resume::models::ParsedResume;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionHealth {
    pub section: String,
    pub score: f64,
    pub item_count: usize,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub overall_score: f64,
    pub sections: Vec<SectionHealth>,
    pub missing_sections: Vec<String>,
}

const SECTION_WEIGHTS: &[(&str, f64)] = &[
    ("experience", 0.35),
    ("education", 0.15),
    ("skills", 0.15),
    ("projects", 0.10),
    ("summary", 0.10),
    ("contact", 0.10),
    ("certifications", 0.05),
];

/// Target skill count for a full skills score.
const SKILLS_TARGET: f64 = 8.0;
const PROJECTS_TARGET: f64 = 2.0;
const SUMMARY_MIN_WORDS: usize = 15;

/// Scores how complete each part of a parsed resume is.
pub fn compute_completeness_report(resume: &ParsedResume) -> CompletenessReport {
    let mut sections = Vec::with_capacity(SECTION_WEIGHTS.len());
    let mut missing_sections = Vec::new();
    let mut weighted_sum = 0.0;

    for (section, weight) in SECTION_WEIGHTS {
        let (score, item_count, recommendations) = score_section(section, resume);
        let score = score.clamp(0.0, 1.0);

        let status = if item_count == 0 {
            SectionStatus::Missing
        } else {
            match score {
                s if s >= 0.8 => SectionStatus::Strong,
                s if s >= 0.5 => SectionStatus::Moderate,
                s if s >= 0.2 => SectionStatus::Weak,
                _ => SectionStatus::Missing,
            }
        };
        if status == SectionStatus::Missing {
            missing_sections.push(section.to_string());
        }

        weighted_sum += score * weight;
        sections.push(SectionHealth {
            section: section.to_string(),
            score,
            item_count,
            status,
            recommendations,
        });
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();

    CompletenessReport {
        overall_score: (weighted_sum / total_weight).clamp(0.0, 1.0),
        sections,
        missing_sections,
    }
}

fn score_section(section: &str, resume: &ParsedResume) -> (f64, usize, Vec<String>) {
    let mut recs = Vec::new();
    match section {
        "experience" => {
            let n = resume.experience.len();
            if n == 0 {
                recs.push("Add your work experience with titles, companies and dates".to_string());
                return (0.0, 0, recs);
            }
            let mut unquantified = 0usize;
            let total: f64 = resume
                .experience
                .iter()
                .map(|record| {
                    let structure = [
                        record.title.is_some(),
                        record.company.is_some(),
                        !record.dates.is_empty(),
                    ]
                    .iter()
                    .filter(|present| **present)
                    .count() as f64
                        / 3.0;
                    let impact = if record.description.is_empty() {
                        0.0
                    } else {
                        let quantified =
                            record.description.iter().filter(|b| is_quantified(b)).count();
                        unquantified += record.description.len() - quantified;
                        quantified as f64 / record.description.len() as f64
                    };
                    0.5 * structure + 0.5 * impact
                })
                .sum();
            if unquantified > 0 {
                recs.push(format!(
                    "{unquantified} experience bullets lack numbers; add metrics or [LOW_METRICS]"
                ));
            }
            if resume.experience.iter().any(|r| r.description.is_empty()) {
                recs.push("Describe what you achieved in every role".to_string());
            }
            (total / n as f64, n, recs)
        }
        "education" => {
            let n = resume.education.len();
            if n == 0 {
                recs.push("Add your degree and institution".to_string());
                return (0.0, 0, recs);
            }
            let total: f64 = resume
                .education
                .iter()
                .map(|e| {
                    0.5 * f64::from(u8::from(e.degree.is_some()))
                        + 0.3 * f64::from(u8::from(e.institution.is_some()))
                        + 0.2 * f64::from(u8::from(e.graduation_date.is_some()))
                })
                .sum();
            if resume.education.iter().any(|e| e.graduation_date.is_none()) {
                recs.push("Add graduation dates to your education".to_string());
            }
            (total / n as f64, n, recs)
        }
        "skills" => {
            let n = resume.skills.len();
            if n < SKILLS_TARGET as usize {
                recs.push(format!(
                    "List more relevant skills ({n} found, aim for at least {SKILLS_TARGET})"
                ));
            }
            (n as f64 / SKILLS_TARGET, n, recs)
        }
        "projects" => {
            let n = resume.projects.len();
            if n == 0 {
                recs.push("Add projects that show what you can build".to_string());
            }
            (n as f64 / PROJECTS_TARGET, n, recs)
        }
        "summary" => match resume.summary.as_deref() {
            Some(summary) if summary.split_whitespace().count() >= SUMMARY_MIN_WORDS => {
                (1.0, 1, recs)
            }
            Some(_) => {
                recs.push("Expand your summary to two or three sentences".to_string());
                (0.6, 1, recs)
            }
            None => {
                recs.push("Add a short professional summary at the top".to_string());
                (0.0, 0, recs)
            }
        },
        "contact" => {
            let c = &resume.contact;
            let score = 0.4 * f64::from(u8::from(c.email.is_some()))
                + 0.3 * f64::from(u8::from(c.phone.is_some()))
                + 0.2 * f64::from(u8::from(c.linkedin.is_some() || c.github.is_some()))
                + 0.1 * f64::from(u8::from(c.location.is_some()));
            if c.email.is_none() {
                recs.push("Add an email address".to_string());
            }
            if c.phone.is_none() {
                recs.push("Add a phone number".to_string());
            }
            if c.linkedin.is_none() && c.github.is_none() {
                recs.push("Link your LinkedIn or GitHub profile".to_string());
            }
            let count = [&c.email, &c.phone, &c.linkedin, &c.github, &c.location]
                .iter()
                .filter(|f| f.is_some())
                .count();
            (score, count, recs)
        }
        "certifications" => {
            let n = resume.certifications.len();
            (if n > 0 { 1.0 } else { 0.0 }, n, recs)
        }
        _ => (0.0, 0, recs),
    }
}
