//! Resume Parser: turns extracted resume text into a `ParsedResume`.
//!
//! Pure and deterministic: section headings are recognised by vocabulary,
//! contact details by pattern, education and experience by paragraph shape,
//! skills by the skills section plus the shared lexicon.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

use crate::lexicon;
use crate::resume::extract::ExtractError;
use crate::resume::models::{
    ContactInfo, EducationRecord, ExperienceRecord, ParseMetadata, ParsedResume, ResumeSection,
    PARSER_VERSION,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
        .expect("valid phone regex")
});
static LINKEDIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)linkedin\.com/in/[\w-]+").expect("valid linkedin regex"));
static GITHUB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)github\.com/[\w-]+").expect("valid github regex"));
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+\d{4}\b",
    )
    .expect("valid date regex")
});
static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid year regex"));
static PRESENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:present|current)\b").expect("valid present regex"));
static GPA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bgpa\b\s*[:\-]?\s*(\d\.\d{1,2})(?:\s*/\s*(\d(?:\.\d{1,2})?))?")
        .expect("valid gpa regex")
});
static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Za-z .'-]*[a-z],\s*[A-Z][A-Za-z .'-]*[A-Za-z]$")
        .expect("valid location regex")
});
static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[|,;•·]\s*|\s+[-–—]\s+").expect("valid segment regex"));
static AT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:at|@)\s+").expect("valid at regex"));

const SECTION_KEYWORDS: &[(ResumeSection, &[&str])] = &[
    (ResumeSection::Summary, &["profile", "summary", "objective", "about"]),
    (
        ResumeSection::Education,
        &["education", "academic", "academics", "qualification", "qualifications"],
    ),
    (ResumeSection::Experience, &["experience", "employment", "history"]),
    (ResumeSection::Skills, &["skills", "skill", "competencies", "competency"]),
    (ResumeSection::Projects, &["projects", "project"]),
    (
        ResumeSection::Certifications,
        &["certifications", "certification", "certificates", "licenses"],
    ),
    (ResumeSection::Contact, &["contact", "details", "information"]),
];

/// Words allowed in a heading besides the section keywords.
const HEADING_FILLERS: &[&str] = &[
    "professional", "work", "technical", "personal", "key", "core", "relevant", "career",
    "selected", "additional", "other", "and", "of", "me", "my", "the", "&",
];

const DEGREE_TERMS: &[&str] = &[
    "bachelor", "bachelors", "bachelor's", "master", "masters", "master's", "phd", "ph.d",
    "doctorate", "mba", "b.s", "m.s", "b.a", "m.a", "b.tech", "m.tech", "btech", "mtech", "b.e",
    "m.e", "b.sc", "m.sc", "bsc", "msc",
];

/// Undotted two-letter degrees. They collide with units ("900 ms") and state codes,
/// so they only count at the start of a line or segment, or before "in"/"of".
const SHORT_DEGREE_TERMS: &[&str] = &["bs", "ms", "ba", "ma"];

const INSTITUTION_TERMS: &[&str] = &["university", "college", "institute", "school", "academy"];

const BULLET_CHARS: &[char] = &['•', '-', '*', '·', '–', '—', '▪', '◦', '●', '►', '>'];

/// A record header is at most this many lines, the dated one among them.
const MAX_HEADER_LINES: usize = 4;
const MAX_HEADER_WORDS: usize = 10;

/// Parses extracted text into a structured resume.
pub fn parse_resume(text: &str, filename: &str) -> Result<ParsedResume, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    let blocks = split_sections(text);
    let sections_found: Vec<ResumeSection> = {
        let mut seen = Vec::new();
        for block in &blocks {
            if let Some(section) = block.section {
                if !seen.contains(&section) {
                    seen.push(section);
                }
            }
        }
        seen
    };

    let lines_of = |section: ResumeSection| {
        blocks
            .iter()
            .filter(|b| b.section == Some(section))
            .flat_map(|b| b.lines.iter().copied())
            .collect::<Vec<&str>>()
    };

    let header_lines: Vec<&str> = blocks
        .iter()
        .filter(|b| b.section.is_none() || b.section == Some(ResumeSection::Contact))
        .flat_map(|b| b.lines.iter().copied())
        .collect();

    let contact = extract_contact(text, &header_lines);

    let education_lines = if sections_found.contains(&ResumeSection::Education) {
        lines_of(ResumeSection::Education)
    } else {
        blocks
            .iter()
            .filter(|b| b.section != Some(ResumeSection::Experience))
            .flat_map(|b| b.lines.iter().copied())
            .collect()
    };
    let education = extract_education(
        &education_lines,
        sections_found.contains(&ResumeSection::Education),
    );

    let experience_lines = if sections_found.contains(&ResumeSection::Experience) {
        lines_of(ResumeSection::Experience)
    } else {
        // Only text no other section claimed; paragraphs naming schools are education.
        blocks
            .iter()
            .filter(|b| b.section.is_none())
            .flat_map(|b| b.lines.iter().copied())
            .collect()
    };
    let experience = extract_experience(
        &experience_lines,
        !sections_found.contains(&ResumeSection::Experience),
    );

    let skills = extract_skills(&lines_of(ResumeSection::Skills), text);

    let summary = {
        let joined = lines_of(ResumeSection::Summary)
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    };

    Ok(ParsedResume {
        contact,
        summary,
        skills,
        education,
        experience,
        projects: list_items(&lines_of(ResumeSection::Projects)),
        certifications: list_items(&lines_of(ResumeSection::Certifications)),
        sections_found,
        metadata: ParseMetadata {
            filename: filename.to_string(),
            parsed_at: Utc::now(),
            parser_version: PARSER_VERSION.to_string(),
        },
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

struct SectionBlock<'a> {
    section: Option<ResumeSection>,
    lines: Vec<&'a str>,
}

fn split_sections(text: &str) -> Vec<SectionBlock<'_>> {
    let mut blocks = vec![SectionBlock {
        section: None,
        lines: Vec::new(),
    }];
    for line in text.lines() {
        match classify_heading(line) {
            Some(section) => blocks.push(SectionBlock {
                section: Some(section),
                lines: Vec::new(),
            }),
            None => {
                if let Some(current) = blocks.last_mut() {
                    current.lines.push(line);
                }
            }
        }
    }
    blocks
}

/// Recognises a heading line. Every word must be a section keyword or a filler,
/// which keeps sentences that merely mention "experience" out.
pub fn classify_heading(line: &str) -> Option<ResumeSection> {
    let cleaned = line
        .trim()
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .to_lowercase();
    if cleaned.is_empty() || cleaned.chars().count() > 40 {
        return None;
    }
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 5 {
        return None;
    }

    let mut best: Option<ResumeSection> = None;
    for word in &words {
        let section = SECTION_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.contains(word))
            .map(|(section, _)| *section);
        match section {
            Some(section) => {
                best.get_or_insert(section);
            }
            None if HEADING_FILLERS.contains(word) => {}
            None => return None,
        }
    }
    let section = best?;

    // "details" / "information" / "history" alone only count next to a qualifier.
    if section == ResumeSection::Contact
        && !words.contains(&"contact")
        && !words.contains(&"personal")
    {
        return None;
    }
    if section == ResumeSection::Experience && words == ["history"] {
        return None;
    }
    Some(section)
}

fn paragraphs<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Contact
// ────────────────────────────────────────────────────────────────────────────

fn extract_contact(text: &str, header_lines: &[&str]) -> ContactInfo {
    let location = header_lines
        .iter()
        .flat_map(|line| line.split(['|', '•', '·']))
        .map(str::trim)
        .find(|segment| {
            !segment.contains('@')
                && !segment.chars().any(|c| c.is_ascii_digit())
                && LOCATION_RE.is_match(segment)
        })
        .map(str::to_string);

    ContactInfo {
        email: first_match(&EMAIL_RE, text),
        phone: first_match(&PHONE_RE, text),
        linkedin: first_match(&LINKEDIN_RE, text),
        github: first_match(&GITHUB_RE, text),
        location,
    }
}

fn first_match(re: &Regex, text: &str) -> Option<String> {
    re.find(text).map(|m| m.as_str().trim().to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

fn normalized_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')' | '|' | ';' | '/'))
        .map(|t| {
            t.trim_matches(|c: char| !(c.is_alphanumeric() || c == '.' || c == '\''))
                .trim_end_matches('.')
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
}

fn has_degree_term(text: &str) -> bool {
    let tokens: Vec<String> = normalized_tokens(text).collect();
    tokens.iter().enumerate().any(|(i, token)| {
        if DEGREE_TERMS.contains(&token.as_str()) {
            return true;
        }
        if !SHORT_DEGREE_TERMS.contains(&token.as_str()) {
            return false;
        }
        let after_number = i > 0 && tokens[i - 1].chars().any(|c| c.is_ascii_digit());
        let next = tokens.get(i + 1).map(String::as_str);
        !after_number && next.is_some() && (i == 0 || matches!(next, Some("in" | "of")))
    })
}

fn has_institution_term(text: &str) -> bool {
    normalized_tokens(text).any(|t| INSTITUTION_TERMS.contains(&t.as_str()))
}

fn has_education_term(text: &str) -> bool {
    has_degree_term(text) || has_institution_term(text)
}

fn segments(line: &str) -> Vec<&str> {
    SEGMENT_RE
        .split(line)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_dates(segment: &str) -> String {
    let without = DATE_RE.replace_all(segment, "");
    let without = GPA_RE.replace_all(&without, "");
    without
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '-' | '–' | '|' | '(' | ')'))
        .to_string()
}

/// Outside an Education section, bullets never start an education record.
fn extract_education(lines: &[&str], from_section: bool) -> Vec<EducationRecord> {
    paragraphs(lines)
        .into_iter()
        .filter(|p| {
            p.iter()
                .any(|l| (from_section || !is_bullet(l)) && has_education_term(l))
        })
        .filter_map(|paragraph| {
            let joined = paragraph.join("\n");
            let all_segments: Vec<&str> = paragraph.iter().flat_map(|l| segments(l)).collect();

            let institution = all_segments
                .iter()
                .find(|s| has_institution_term(s))
                .map(|s| strip_dates(s))
                .filter(|s| !s.is_empty());
            let degree = all_segments
                .iter()
                .find(|s| has_degree_term(s))
                .map(|s| strip_dates(s))
                .filter(|s| !s.is_empty());

            let graduation_date = DATE_RE
                .find_iter(&joined)
                .last()
                .or_else(|| YEAR_RE.find_iter(&joined).last())
                .map(|m| m.as_str().to_string());

            let gpa = GPA_RE.captures(&joined).map(|caps| match caps.get(2) {
                Some(scale) => format!("{}/{}", &caps[1], scale.as_str()),
                None => caps[1].to_string(),
            });

            (degree.is_some() || institution.is_some()).then_some(EducationRecord {
                degree,
                institution,
                graduation_date,
                gpa,
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

fn is_bullet(line: &str) -> bool {
    line.trim_start().starts_with(BULLET_CHARS)
}

fn strip_bullet(line: &str) -> &str {
    line.trim().trim_start_matches(BULLET_CHARS).trim()
}

fn is_date_like(text: &str) -> bool {
    YEAR_RE.is_match(text) || PRESENT_RE.is_match(text)
}

fn is_contact_line(line: &str) -> bool {
    EMAIL_RE.is_match(line) || PHONE_RE.is_match(line)
}

/// Number of leading lines that can belong to a record header.
fn header_span(lines: &[&str]) -> usize {
    lines
        .iter()
        .take(MAX_HEADER_LINES)
        .enumerate()
        .take_while(|(i, line)| {
            !is_bullet(line) && (*i == 0 || line.split_whitespace().count() <= MAX_HEADER_WORDS)
        })
        .count()
}

/// Index of the header line that carries the record's dates, if the lines open a record.
fn record_date_line(lines: &[&str]) -> Option<usize> {
    lines[..header_span(lines)]
        .iter()
        .position(|line| is_date_like(line) && !is_contact_line(line))
}

/// A titled, dated header run directly followed by a bullet.
fn starts_record(lines: &[&str]) -> bool {
    let span = header_span(lines);
    if record_date_line(lines).is_none() || !lines.get(span).is_some_and(|l| is_bullet(l)) {
        return false;
    }
    match title_and_company(lines[0]) {
        (Some(_), Some(_)) => true,
        (Some(_), None) => span > 1,
        _ => false,
    }
}

/// Splits a paragraph where a new header follows the previous record's bullets.
fn record_chunks<'p, 'a>(paragraph: &'p [&'a str]) -> Vec<&'p [&'a str]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut seen_bullet = false;
    for (i, line) in paragraph.iter().enumerate() {
        if is_bullet(line) {
            seen_bullet = true;
        } else if seen_bullet && starts_record(&paragraph[i..]) {
            chunks.push(&paragraph[start..i]);
            start = i;
            seen_bullet = false;
        }
    }
    chunks.push(&paragraph[start..]);
    chunks
}

fn title_and_company(line: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<String> = AT_RE
        .split(line)
        .flat_map(|part| segments(part).into_iter().map(str::to_string).collect::<Vec<_>>())
        .filter(|s| !is_date_like(s))
        .collect();
    let mut iter = parts.into_iter();
    (iter.next(), iter.next())
}

fn first_segment(line: &str) -> Option<String> {
    segments(line).first().map(|s| s.to_string())
}

fn parse_record(lines: &[&str], date_line: usize) -> ExperienceRecord {
    let (mut title, mut company) = title_and_company(lines[0]);

    if company.is_none() && date_line > 0 {
        let (dated, _) = title_and_company(lines[date_line]);
        match dated {
            // Company, optional location, then "Title, dates".
            Some(role) if date_line > 1 => {
                company = title.take();
                title = Some(role);
            }
            Some(name) => company = Some(name),
            None => {
                company = lines[1..date_line]
                    .iter()
                    .find(|l| !LOCATION_RE.is_match(l))
                    .and_then(|l| first_segment(l));
            }
        }
    }

    let mut header_end = date_line + 1;
    if company.is_none() {
        if let Some(line) = lines.get(header_end).filter(|l| {
            !is_bullet(l)
                && !is_date_like(l)
                && !LOCATION_RE.is_match(l)
                && l.split_whitespace().count() <= MAX_HEADER_WORDS
        }) {
            company = first_segment(line);
            header_end += 1;
        }
    }

    let header = lines[..header_end].join("\n");
    let mut dates: Vec<String> = DATE_RE
        .find_iter(&header)
        .map(|m| m.as_str().to_string())
        .collect();
    if dates.is_empty() {
        dates = YEAR_RE
            .find_iter(&header)
            .map(|m| m.as_str().to_string())
            .collect();
    }
    if PRESENT_RE.is_match(&header) {
        dates.push("Present".to_string());
    }

    ExperienceRecord {
        title,
        company,
        dates,
        description: description_lines(&lines[header_end..]),
    }
}

fn extract_experience(lines: &[&str], skip_education: bool) -> Vec<ExperienceRecord> {
    let mut records: Vec<ExperienceRecord> = Vec::new();

    for paragraph in paragraphs(lines) {
        for chunk in record_chunks(&paragraph) {
            let header = &chunk[..header_span(chunk)];
            if skip_education && header.iter().any(|l| has_education_term(l)) {
                continue;
            }

            match record_date_line(chunk) {
                Some(date_line) => records.push(parse_record(chunk, date_line)),
                None => {
                    if let Some(current) = records.last_mut() {
                        current.description.extend(description_lines(chunk));
                    }
                }
            }
        }
    }

    records
}

fn description_lines(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .map(|l| strip_bullet(l))
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Skills and simple list sections
// ────────────────────────────────────────────────────────────────────────────

fn extract_skills(section_lines: &[&str], full_text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for line in section_lines {
        let line = strip_bullet(line);
        let items = match line.split_once(':') {
            Some((label, rest)) if label.split_whitespace().count() <= 3 => rest,
            _ => line,
        };
        for item in items.split([',', ';', '|', '•', '·']) {
            let item = item.trim().trim_end_matches('.').trim();
            if !item.is_empty() && item.chars().count() <= 40 && item.split_whitespace().count() <= 5 {
                candidates.push(item.to_string());
            }
        }
    }

    candidates.extend(
        lexicon::find_skills(full_text)
            .into_iter()
            .map(|s| s.canonical.to_string()),
    );

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|item| {
            let key = lexicon::canonicalize(item)
                .map(|s| s.canonical.to_lowercase())
                .unwrap_or_else(|| item.to_lowercase());
            seen.insert(key)
        })
        .collect()
}

fn list_items(lines: &[&str]) -> Vec<String> {
    description_lines(lines)
}
