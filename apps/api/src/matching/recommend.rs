use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::store::parsed_job;
use crate::matching::fit_scoring::{CandidateProfile, FitScorer};
use crate::models::job::JobPostingRow;

pub const FRESHNESS_HALF_LIFE_DAYS: f64 = 30.0;
const FIT_WEIGHT: f64 = 0.85;
const FRESHNESS_WEIGHT: f64 = 0.15;
const TOP_GAPS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct RankedJob {
    pub job_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub source_platform: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub fit_score: u32,
    pub freshness: f64,
    pub rank_score: f64,
    pub top_gaps: Vec<String>,
    pub recommendation: String,
}

/// Exponential decay with a 30-day half-life. Postings dated in the future count as brand new.
pub fn compute_freshness(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - posted_at).num_seconds() as f64 / 86_400.0;
    if days <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(days / FRESHNESS_HALF_LIFE_DAYS).clamp(0.0, 1.0)
}

/// 0.85 × fit + 0.15 × freshness, both on a 0–1 scale.
pub fn compute_rank_score(fit_score: u32, freshness: f64) -> f64 {
    (FIT_WEIGHT * f64::from(fit_score.min(100)) / 100.0 + FRESHNESS_WEIGHT * freshness)
        .clamp(0.0, 1.0)
}

/// Scores every posting against the profile and returns the best `limit`, best first.
/// Equal rank scores put the newer posting first.
pub async fn rank_jobs(
    scorer: &dyn FitScorer,
    profile: &CandidateProfile,
    jobs: &[JobPostingRow],
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<RankedJob>, AppError> {
    let mut ranked = Vec::with_capacity(jobs.len());

    for job in jobs {
        let parsed = parsed_job(job);
        let report = scorer.score(profile, &parsed).await?;
        let freshness = compute_freshness(job.created_at, now);

        ranked.push(RankedJob {
            job_id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            source_platform: job.source_platform.clone(),
            url: job.url.clone(),
            created_at: job.created_at,
            fit_score: report.overall_score,
            freshness,
            rank_score: compute_rank_score(report.overall_score, freshness),
            top_gaps: report
                .gaps
                .iter()
                .take(TOP_GAPS)
                .map(|g| g.keyword.clone())
                .collect(),
            recommendation: report.recommendation,
        });
    }

    ranked.sort_by(|a, b| {
        b.rank_score
            .total_cmp(&a.rank_score)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    ranked.truncate(limit);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::jd_parser::parse_job_description;
    use crate::matching::fit_scoring::KeywordFitScorer;
    use chrono::Duration;

    fn job(title: &str, description: &str, created_at: DateTime<Utc>) -> JobPostingRow {
        JobPostingRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: None,
            description: description.to_string(),
            source_platform: "manual".to_string(),
            url: None,
            parsed: serde_json::to_value(parse_job_description(title, description)).unwrap(),
            created_by: None,
            created_at,
        }
    }

    fn profile(skills: &[&str]) -> CandidateProfile {
        CandidateProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            text: skills.join(", "),
        }
    }

    #[test]
    fn test_freshness_half_life() {
        let now = Utc::now();
        assert_eq!(compute_freshness(now, now), 1.0);
        let month_old = compute_freshness(now - Duration::days(30), now);
        assert!((month_old - 0.5).abs() < 1e-9, "was {month_old}");
        let two_months = compute_freshness(now - Duration::days(60), now);
        assert!((two_months - 0.25).abs() < 1e-9);
        assert_eq!(compute_freshness(now + Duration::days(3), now), 1.0);
    }

    #[test]
    fn test_rank_score_weights() {
        assert!((compute_rank_score(100, 1.0) - 1.0).abs() < 1e-9);
        assert!((compute_rank_score(0, 1.0) - 0.15).abs() < 1e-9);
        assert!((compute_rank_score(60, 0.5) - (0.85 * 0.6 + 0.15 * 0.5)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rank_jobs_orders_by_fit_then_freshness() {
        let now = Utc::now();
        let jobs = vec![
            job("Java Developer", "Requirements: Java, Spring Boot", now),
            job("Rust Engineer", "Requirements: Rust, PostgreSQL", now - Duration::days(10)),
            job("Rust Engineer II", "Requirements: Rust, PostgreSQL", now - Duration::days(1)),
        ];

        let ranked = rank_jobs(&KeywordFitScorer, &profile(&["Rust", "PostgreSQL"]), &jobs, now, 10)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].title, "Rust Engineer II");
        assert_eq!(ranked[1].title, "Rust Engineer");
        assert_eq!(ranked[2].title, "Java Developer");
        assert_eq!(ranked[2].fit_score, 0);
        assert_eq!(ranked[2].top_gaps, vec!["Java", "Spring Boot"]);
        assert!(ranked.windows(2).all(|w| w[0].rank_score >= w[1].rank_score));
    }

    #[tokio::test]
    async fn test_rank_jobs_ties_prefer_newer() {
        let posted = Utc::now();
        // both postings are ahead of `now`, so both have freshness 1.0
        let now = posted - Duration::days(1);
        let jobs = vec![
            job("Rust Engineer", "Rust", posted - Duration::hours(1)),
            job("Rust Engineer", "Rust", posted),
        ];
        let ranked = rank_jobs(&KeywordFitScorer, &profile(&["Rust"]), &jobs, now, 10)
            .await
            .unwrap();
        assert_eq!(ranked[0].rank_score, ranked[1].rank_score);
        assert_eq!(ranked[0].created_at, posted);
    }

    #[tokio::test]
    async fn test_rank_jobs_respects_limit_and_reparses() {
        let now = Utc::now();
        let mut broken = job("Rust Engineer", "Requirements: Rust", now);
        broken.parsed = serde_json::json!("garbage");
        let jobs = vec![broken, job("Go Engineer", "Requirements: Golang", now)];

        let ranked = rank_jobs(&KeywordFitScorer, &profile(&["Rust"]), &jobs, now, 1)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, "Rust Engineer");
        assert_eq!(ranked[0].fit_score, 100);
    }
}
