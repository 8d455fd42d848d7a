use serde::Serialize;
use std::collections::HashMap;

/// Per-author tallies, aggregated at both project and group scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ContributorStats {
    pub commits: usize,
    pub merge_requests: usize,
}

/// A failed data source recorded while collecting one project.
#[derive(Clone, Debug, Serialize)]
pub struct CollectionError {
    #[serde(rename = "type")]
    pub kind: String,
    pub error: String,
}

/// Which of the two data sources actually produced data for a project.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DataAvailability {
    pub commits_available: bool,
    pub merge_requests_available: bool,
}

/// Everything gathered for a single project. `errors` and `status` carry
/// the partial-failure annotations when one data source was unavailable.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectStats {
    pub id: i64,
    pub name: String,
    pub commit_count: usize,
    pub merge_request_count: usize,
    pub contributors: HashMap<String, ContributorStats>,
    pub errors: Vec<CollectionError>,
    pub status: DataAvailability,
}

impl ProjectStats {
    pub fn new(id: i64, name: String) -> Self {
        Self {
            id,
            name,
            commit_count: 0,
            merge_request_count: 0,
            contributors: HashMap::new(),
            errors: Vec::new(),
            status: DataAvailability::default(),
        }
    }

    /// Flatten into the shape the report exposes, contributors sorted by
    /// name so the output is stable.
    pub fn to_summary(&self) -> ProjectSummary {
        let mut contributors: Vec<ProjectContributor> = self
            .contributors
            .iter()
            .map(|(name, stats)| ProjectContributor {
                name: name.clone(),
                commits: stats.commits,
                merge_requests: stats.merge_requests,
            })
            .collect();
        contributors.sort_by(|a, b| a.name.cmp(&b.name));

        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            commits: self.commit_count,
            merge_requests: self.merge_request_count,
            contributors,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ProjectContributor {
    pub name: String,
    pub commits: usize,
    pub merge_requests: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub commits: usize,
    pub merge_requests: usize,
    pub contributors: Vec<ProjectContributor>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SkippedProject {
    pub id: i64,
    pub name: String,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct PartialDataProject {
    pub id: i64,
    pub name: String,
    pub errors: Vec<CollectionError>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ReportSummary {
    pub total_projects: usize,
    pub processed_projects: usize,
    pub skipped_projects: usize,
    pub partial_data_projects: usize,
}

/// Group-wide statistics returned to the caller.
#[derive(Clone, Debug, Serialize)]
pub struct GroupReport {
    pub total_commits: usize,
    pub total_merge_requests: usize,
    pub total_projects: usize,
    pub processed_projects: usize,
    pub projects: Vec<ProjectSummary>,
    pub skipped_projects: Vec<SkippedProject>,
    pub partial_data_projects: Vec<PartialDataProject>,
    pub contributors: HashMap<String, ContributorStats>,
    pub summary: ReportSummary,
}

impl GroupReport {
    pub fn new(total_projects: usize) -> Self {
        Self {
            total_commits: 0,
            total_merge_requests: 0,
            total_projects,
            processed_projects: 0,
            projects: Vec::new(),
            skipped_projects: Vec::new(),
            partial_data_projects: Vec::new(),
            contributors: HashMap::new(),
            summary: ReportSummary::default(),
        }
    }
}
