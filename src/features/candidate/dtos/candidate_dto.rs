use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::features::applications::dtos::ApplicationDetailDto;
use crate::features::jobs::dtos::JobDto;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CandidateStatsDto {
    pub total_applications: i64,
    pub status_counts: BTreeMap<String, i64>,
    pub average_match_score: f64,
    pub resume_count: i64,
    /// Scheduled in the next 30 days
    pub upcoming_interviews: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfileCompletionDto {
    /// 0-100
    pub percentage: u8,
    /// Items still to do
    pub missing: Vec<String>,
}

/// Inputs of the profile completion score
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileChecks {
    pub has_name: bool,
    pub has_email: bool,
    pub has_role: bool,
    pub has_avatar_or_github: bool,
    pub has_resume: bool,
    pub has_parsed_resume: bool,
}

impl ProfileChecks {
    pub fn completion(&self) -> ProfileCompletionDto {
        let items = [
            (self.has_name, "name"),
            (self.has_email, "email"),
            (self.has_role, "role"),
            (self.has_avatar_or_github, "avatar_or_github"),
            (self.has_resume, "resume"),
            (self.has_parsed_resume, "parsed_resume"),
        ];

        let done = items.iter().filter(|(ok, _)| *ok).count();
        let percentage = ((done * 100) as f64 / items.len() as f64).round() as u8;

        ProfileCompletionDto {
            percentage,
            missing: items
                .iter()
                .filter(|(ok, _)| !*ok)
                .map(|(_, name)| name.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CandidateDashboardDto {
    pub stats: CandidateStatsDto,
    pub recent_applications: Vec<ApplicationDetailDto>,
    pub recommended_jobs: Vec<JobDto>,
    pub profile_completion: ProfileCompletionDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile() {
        let completion = ProfileChecks::default().completion();
        assert_eq!(completion.percentage, 0);
        assert_eq!(completion.missing.len(), 6);
    }

    #[test]
    fn test_partial_profile_rounds() {
        let completion = ProfileChecks {
            has_name: true,
            has_email: true,
            has_role: true,
            has_resume: true,
            ..Default::default()
        }
        .completion();
        assert_eq!(completion.percentage, 67);
        assert_eq!(completion.missing, vec!["avatar_or_github", "parsed_resume"]);
    }

    #[test]
    fn test_complete_profile() {
        let completion = ProfileChecks {
            has_name: true,
            has_email: true,
            has_role: true,
            has_avatar_or_github: true,
            has_resume: true,
            has_parsed_resume: true,
        }
        .completion();
        assert_eq!(completion.percentage, 100);
        assert!(completion.missing.is_empty());
    }
}
