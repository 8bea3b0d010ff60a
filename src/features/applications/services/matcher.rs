//! Keyword overlap between job requirements and resume skills.

use std::collections::BTreeMap;
use uuid::Uuid;

use crate::features::applications::dtos::{
    BestMatchesDto, JobMatchSummaryDto, KeywordMatchDto, ResumeBestMatchesDto, ResumeMatchDto,
};
use crate::features::jobs::models::Job;
use crate::features::resumes::models::Resume;

/// Jobs considered for the best-match list
pub const BEST_MATCH_JOB_LIMIT: i64 = 50;
const BEST_MATCH_MIN_SCORE: f64 = 0.3;
const BEST_MATCH_TOTAL: usize = 50;
const BEST_MATCH_PER_RESUME: usize = 10;
const TOP_MATCHING_SKILLS: usize = 5;
const CRITICAL_MISSING_SKILLS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordMatch {
    /// Fraction of requirements matched, 0..=1
    pub score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

impl From<KeywordMatch> for KeywordMatchDto {
    fn from(matched: KeywordMatch) -> Self {
        Self {
            score: matched.score,
            matched_skills: matched.matched_skills,
            missing_skills: matched.missing_skills,
        }
    }
}

/// A requirement matches when it contains a skill or a skill contains it,
/// ignoring case. Without requirements or skills the score is zero.
pub fn keyword_match(requirements: &[String], skills: &[String]) -> KeywordMatch {
    let skills: Vec<String> = skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut result = KeywordMatch::default();
    let mut considered = 0usize;

    for requirement in requirements {
        let needle = requirement.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }
        considered += 1;

        let found = skills
            .iter()
            .any(|skill| needle.contains(skill.as_str()) || skill.contains(needle.as_str()));
        if found {
            result.matched_skills.push(requirement.trim().to_string());
        } else {
            result.missing_skills.push(requirement.trim().to_string());
        }
    }

    if considered > 0 && !skills.is_empty() {
        result.score = (result.matched_skills.len() as f64 / considered as f64).clamp(0.0, 1.0);
    }

    result
}

/// Drops matches under `min_score`, best first, at most `max_results`
pub fn rank_matches(
    mut matches: Vec<ResumeMatchDto>,
    min_score: f64,
    max_results: usize,
) -> Vec<ResumeMatchDto> {
    matches.retain(|m| m.score >= min_score);
    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.resume_id.cmp(&b.resume_id))
    });
    matches.truncate(max_results);
    matches
}

/// Seeds a ranked entry from a keyword match
pub fn resume_match(
    resume_id: Uuid,
    application_id: Option<Uuid>,
    candidate_name: String,
    candidate_email: String,
    filename: String,
    matched: KeywordMatch,
) -> ResumeMatchDto {
    ResumeMatchDto {
        resume_id,
        application_id,
        candidate_name,
        candidate_email,
        filename,
        score: matched.score,
        matched_skills: matched.matched_skills,
        missing_skills: matched.missing_skills,
    }
}

/// Scores every resume against every job and keeps the strongest pairs.
///
/// Pairs under 30% are dropped, the best 50 overall are grouped by resume
/// and each resume keeps at most 10. Resumes without a match are omitted.
pub fn best_matches(resumes: &[Resume], jobs: &[Job]) -> BestMatchesDto {
    let mut scored: Vec<(usize, JobMatchSummaryDto)> = Vec::new();
    for (index, resume) in resumes.iter().enumerate() {
        for job in jobs {
            let matched = keyword_match(&job.requirements.0, &resume.skills.0);
            if matched.score < BEST_MATCH_MIN_SCORE {
                continue;
            }
            scored.push((
                index,
                JobMatchSummaryDto {
                    job_id: job.id,
                    job_title: job.title.clone(),
                    company: job.company.clone(),
                    location: job.location.clone(),
                    employment_type: job.employment_type.clone(),
                    score: matched.score,
                    top_matching_skills: matched
                        .matched_skills
                        .into_iter()
                        .take(TOP_MATCHING_SKILLS)
                        .collect(),
                    critical_missing_skills: matched
                        .missing_skills
                        .into_iter()
                        .take(CRITICAL_MISSING_SKILLS)
                        .collect(),
                },
            ));
        }
    }

    let total_matches = scored.len();
    scored.sort_by(|(ia, a), (ib, b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| ia.cmp(ib))
            .then_with(|| a.job_id.cmp(&b.job_id))
    });
    scored.truncate(BEST_MATCH_TOTAL);

    // Keyed by resume position so groups follow the resume order
    let mut grouped: BTreeMap<usize, Vec<JobMatchSummaryDto>> = BTreeMap::new();
    for (index, summary) in scored {
        let matches = grouped.entry(index).or_default();
        if matches.len() < BEST_MATCH_PER_RESUME {
            matches.push(summary);
        }
    }

    let matches_by_resume = grouped
        .into_iter()
        .map(|(index, matches)| ResumeBestMatchesDto {
            resume_id: resumes[index].id,
            resume_filename: resumes[index].filename.clone(),
            matches,
        })
        .collect();

    BestMatchesDto {
        matches_by_resume,
        total_matches,
        resumes_analyzed: resumes.len(),
        jobs_analyzed: jobs.len(),
    }
}
