use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobPostingRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateType {
    SameUrl,
    SameTitleAndCompany,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSeverity {
    /// Ingest is rejected.
    Blocking,
    Advisory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateWarning {
    pub duplicate_type: DuplicateType,
    pub existing_job_id: Uuid,
    pub description: String,
    pub severity: DuplicateSeverity,
}

/// The fields of an incoming posting that duplicate detection looks at.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePosting<'a> {
    pub title: &'a str,
    pub company: &'a str,
    pub source_platform: &'a str,
    pub url: Option<&'a str>,
}

/// Checks an incoming posting against existing ones.
/// A URL already ingested from the same platform blocks; a matching title and company is advisory.
pub fn check_for_duplicates(
    existing: &[JobPostingRow],
    candidate: &CandidatePosting<'_>,
) -> Vec<DuplicateWarning> {
    let mut warnings = Vec::new();
    let candidate_url = candidate.url.map(normalize_url).filter(|u| !u.is_empty());
    let candidate_title = normalize_text(candidate.title);
    let candidate_company = normalize_text(candidate.company);

    for job in existing {
        let same_url = match (&candidate_url, job.url.as_deref()) {
            (Some(new_url), Some(old_url)) => {
                job.source_platform.eq_ignore_ascii_case(candidate.source_platform)
                    && *new_url == normalize_url(old_url)
            }
            _ => false,
        };

        if same_url {
            warnings.push(DuplicateWarning {
                duplicate_type: DuplicateType::SameUrl,
                existing_job_id: job.id,
                description: format!(
                    "Posting '{}' at {} was already ingested from this URL",
                    job.title, job.company
                ),
                severity: DuplicateSeverity::Blocking,
            });
        } else if normalize_text(&job.title) == candidate_title
            && normalize_text(&job.company) == candidate_company
        {
            warnings.push(DuplicateWarning {
                duplicate_type: DuplicateType::SameTitleAndCompany,
                existing_job_id: job.id,
                description: format!(
                    "A posting titled '{}' at {} already exists. It may be a repost.",
                    job.title, job.company
                ),
                severity: DuplicateSeverity::Advisory,
            });
        }
    }

    warnings
}

/// Lower-case, single-spaced, punctuation-free.
fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_url(url: &str) -> String {
    let url = url.trim().to_lowercase();
    let url = url.split(['#', '?']).next().unwrap_or_default();
    url.trim_end_matches('/').to_string()
}
