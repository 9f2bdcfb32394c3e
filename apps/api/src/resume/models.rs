use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PARSER_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeSection {
    Summary,
    Education,
    Experience,
    Skills,
    Projects,
    Certifications,
    Contact,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub graduation_date: Option<String>,
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub dates: Vec<String>,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub filename: String,
    pub parsed_at: DateTime<Utc>,
    pub parser_version: String,
}

/// Structured view of a resume, persisted as JSON alongside the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub contact: ContactInfo,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub education: Vec<EducationRecord>,
    pub experience: Vec<ExperienceRecord>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub sections_found: Vec<ResumeSection>,
    pub metadata: ParseMetadata,
}

impl ParsedResume {
    /// All experience description lines, in document order.
    pub fn bullets(&self) -> impl Iterator<Item = &str> {
        self.experience
            .iter()
            .flat_map(|e| e.description.iter().map(String::as_str))
    }
}
