use std::collections::HashSet;

use crate::models::report::{
    CollectionError, GroupReport, PartialDataProject, ProjectStats, ReportSummary, SkippedProject,
};
use crate::services::gitlab::{GitLabApi, GitLabCommit, GitLabError, GitLabProject};

/// Collects contribution statistics for every project in a group.
pub struct GroupStatsService<C> {
    client: C,
    excluded_projects: Vec<i64>,
}

impl<C: GitLabApi> GroupStatsService<C> {
    pub fn new(client: C, excluded_projects: Vec<i64>) -> Self {
        Self {
            client,
            excluded_projects,
        }
    }

    /// Walk every project in the group, in listing order, and fold the
    /// per-project results into one report. A project that fails outright
    /// lands in `skipped_projects`; it never aborts the batch.
    pub async fn collect_stats(
        &self,
        group_id: i64,
        start_date: &str,
        end_date: &str,
    ) -> Result<GroupReport, GitLabError> {
        let projects = self.client.list_group_projects(group_id).await?;

        log::info!(
            "Found {} total projects in group {}",
            projects.len(),
            group_id
        );

        let mut report = GroupReport::new(projects.len());

        for project in &projects {
            log::info!("Processing project {} (ID: {})", project.name, project.id);

            if self.excluded_projects.contains(&project.id) {
                log::warn!(
                    "Skipping excluded project {} ({})",
                    project.id,
                    project.name
                );
                report.skipped_projects.push(SkippedProject {
                    id: project.id,
                    name: project.name.clone(),
                    reason: "Project ID temporarily excluded".to_string(),
                });
                continue;
            }

            match self
                .collect_project_stats(project, start_date, end_date)
                .await
            {
                Ok(project_stats) => {
                    for (author, contributor) in &project_stats.contributors {
                        let entry = report.contributors.entry(author.clone()).or_default();
                        entry.commits += contributor.commits;
                        entry.merge_requests += contributor.merge_requests;
                    }

                    if !project_stats.errors.is_empty() {
                        log::warn!(
                            "Partial data for project {}: {:?}",
                            project.name,
                            project_stats.errors
                        );
                        report.partial_data_projects.push(PartialDataProject {
                            id: project.id,
                            name: project.name.clone(),
                            errors: project_stats.errors.clone(),
                        });
                    }

                    report.total_commits += project_stats.commit_count;
                    report.total_merge_requests += project_stats.merge_request_count;

                    log::info!(
                        "Successfully processed project {} - Commits: {}, MRs: {}",
                        project.name,
                        project_stats.commit_count,
                        project_stats.merge_request_count
                    );

                    report.projects.push(project_stats.to_summary());
                    report.processed_projects += 1;
                }
                Err(e) => {
                    log::error!(
                        "Error collecting stats for project {}: {}",
                        project.name,
                        e
                    );
                    report.skipped_projects.push(SkippedProject {
                        id: project.id,
                        name: project.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.summary = ReportSummary {
            total_projects: report.total_projects,
            processed_projects: report.processed_projects,
            skipped_projects: report.skipped_projects.len(),
            partial_data_projects: report.partial_data_projects.len(),
        };

        log::info!("Statistics collection completed: {:?}", report.summary);

        Ok(report)
    }

    /// Gather commit and merge-request statistics for one project.
    ///
    /// The two data sources are attempted independently: when one fails
    /// the other still populates and the failure is recorded on the
    /// result. Only a missing project propagates, which the caller turns
    /// into a skip.
    async fn collect_project_stats(
        &self,
        project: &GitLabProject,
        start_date: &str,
        end_date: &str,
    ) -> Result<ProjectStats, GitLabError> {
        let mut stats = ProjectStats::new(project.id, project.name.clone());

        match self
            .client
            .list_project_commits(project.id, Some(start_date), Some(end_date))
            .await
        {
            Ok(raw_commits) => {
                let commits = dedup_commits(raw_commits);
                stats.commit_count = commits.len();
                stats.status.commits_available = true;

                for commit in &commits {
                    stats
                        .contributors
                        .entry(commit.author_name.clone())
                        .or_default()
                        .commits += 1;
                }
            }
            Err(e @ GitLabError::ProjectNotFound(_)) => return Err(e),
            Err(e) => {
                log::warn!("Unable to get commits for project {}: {}", project.id, e);
                stats.errors.push(CollectionError {
                    kind: "commits".to_string(),
                    error: e.to_string(),
                });
            }
        }

        match self
            .client
            .list_project_merge_requests(project.id, "all", Some(start_date), Some(end_date))
            .await
        {
            Ok(merge_requests) => {
                stats.merge_request_count = merge_requests.len();
                stats.status.merge_requests_available = true;

                for merge_request in &merge_requests {
                    if let Some(author) = merge_request
                        .author
                        .as_ref()
                        .and_then(|author| author.name.as_ref())
                    {
                        stats
                            .contributors
                            .entry(author.clone())
                            .or_default()
                            .merge_requests += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!(
                    "Unable to get merge requests for project {}: {}",
                    project.id,
                    e
                );
                stats.errors.push(CollectionError {
                    kind: "merge_requests".to_string(),
                    error: e.to_string(),
                });
            }
        }

        Ok(stats)
    }
}

/// The same commit is reachable from every branch that contains it, so
/// branch-by-branch listings overlap heavily. Keep the first record seen
/// for each commit id, preserving discovery order.
pub fn dedup_commits(commits: Vec<GitLabCommit>) -> Vec<GitLabCommit> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for commit in commits {
        if seen.insert(commit.id.clone()) {
            unique.push(commit);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gitlab::{GitLabBranch, GitLabMergeRequest, GitLabUser};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockGitLab {
        projects: Vec<GitLabProject>,
        commits: HashMap<i64, Vec<GitLabCommit>>,
        merge_requests: HashMap<i64, Vec<GitLabMergeRequest>>,
        failing_commits: Vec<i64>,
        failing_merge_requests: Vec<i64>,
        missing_projects: Vec<i64>,
    }

    fn fetch_failed() -> GitLabError {
        GitLabError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            url: "https://gitlab.example.com/api/v4".to_string(),
        }
    }

    #[async_trait]
    impl GitLabApi for MockGitLab {
        async fn list_group_projects(
            &self,
            _group_id: i64,
        ) -> Result<Vec<GitLabProject>, GitLabError> {
            Ok(self.projects.clone())
        }

        async fn list_project_branches(
            &self,
            _project_id: i64,
        ) -> Result<Vec<GitLabBranch>, GitLabError> {
            Ok(vec![GitLabBranch {
                name: "main".to_string(),
            }])
        }

        async fn list_project_commits(
            &self,
            project_id: i64,
            _since: Option<&str>,
            _until: Option<&str>,
        ) -> Result<Vec<GitLabCommit>, GitLabError> {
            if self.missing_projects.contains(&project_id) {
                return Err(GitLabError::ProjectNotFound(project_id));
            }
            if self.failing_commits.contains(&project_id) {
                return Err(fetch_failed());
            }
            Ok(self.commits.get(&project_id).cloned().unwrap_or_default())
        }

        async fn list_project_merge_requests(
            &self,
            project_id: i64,
            _state: &str,
            _since: Option<&str>,
            _until: Option<&str>,
        ) -> Result<Vec<GitLabMergeRequest>, GitLabError> {
            if self.failing_merge_requests.contains(&project_id) {
                return Err(fetch_failed());
            }
            Ok(self
                .merge_requests
                .get(&project_id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn project(id: i64, name: &str) -> GitLabProject {
        GitLabProject {
            id,
            name: name.to_string(),
        }
    }

    fn commit(id: &str, author: &str) -> GitLabCommit {
        GitLabCommit {
            id: id.to_string(),
            author_name: author.to_string(),
            authored_date: "2024-03-01T10:00:00Z".to_string(),
            title: format!("change {}", id),
        }
    }

    fn merge_request(author: &str) -> GitLabMergeRequest {
        GitLabMergeRequest {
            author: Some(GitLabUser {
                name: Some(author.to_string()),
            }),
            created_at: "2024-03-02T09:30:00Z".to_string(),
            state: "merged".to_string(),
        }
    }

    #[test]
    fn dedup_merges_commits_shared_between_branches() {
        let branch_a = vec![commit("a1", "alice"), commit("b2", "bob")];
        let branch_b = vec![commit("b2", "bob"), commit("c3", "carol")];
        let merged: Vec<GitLabCommit> = branch_a.into_iter().chain(branch_b).collect();

        let unique = dedup_commits(merged);

        let ids: Vec<&str> = unique.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2", "c3"]);
    }

    #[test]
    fn dedup_keeps_the_first_record_seen() {
        let commits = vec![commit("a1", "alice"), commit("a1", "mallory")];

        let unique = dedup_commits(commits);

        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].author_name, "alice");
    }

    #[tokio::test]
    async fn aggregates_totals_and_contributors_across_projects() {
        let mut commits = HashMap::new();
        commits.insert(
            1,
            vec![
                commit("a1", "alice"),
                commit("a2", "alice"),
                commit("b1", "bob"),
            ],
        );
        commits.insert(2, vec![commit("c1", "alice")]);

        let mut merge_requests = HashMap::new();
        merge_requests.insert(1, vec![merge_request("bob")]);
        merge_requests.insert(2, vec![merge_request("alice"), merge_request("bob")]);

        let mock = MockGitLab {
            projects: vec![project(1, "api"), project(2, "web")],
            commits,
            merge_requests,
            ..Default::default()
        };
        let service = GroupStatsService::new(mock, vec![]);

        let report = service
            .collect_stats(42, "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert_eq!(report.total_projects, 2);
        assert_eq!(report.processed_projects, 2);
        assert_eq!(report.total_commits, 4);
        assert_eq!(report.total_merge_requests, 3);
        assert_eq!(
            report.total_commits,
            report.projects.iter().map(|p| p.commits).sum::<usize>()
        );
        assert_eq!(
            report.total_merge_requests,
            report.projects.iter().map(|p| p.merge_requests).sum::<usize>()
        );

        let alice = &report.contributors["alice"];
        assert_eq!(alice.commits, 3);
        assert_eq!(alice.merge_requests, 1);
        let bob = &report.contributors["bob"];
        assert_eq!(bob.commits, 1);
        assert_eq!(bob.merge_requests, 2);

        assert!(report.skipped_projects.is_empty());
        assert!(report.partial_data_projects.is_empty());
    }

    #[tokio::test]
    async fn commit_failure_is_isolated_from_merge_requests() {
        let mut merge_requests = HashMap::new();
        merge_requests.insert(7, vec![merge_request("alice"), merge_request("bob")]);

        let mock = MockGitLab {
            projects: vec![project(7, "api")],
            merge_requests,
            failing_commits: vec![7],
            ..Default::default()
        };
        let service = GroupStatsService::new(mock, vec![]);

        let stats = service
            .collect_project_stats(&project(7, "api"), "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert!(!stats.status.commits_available);
        assert!(stats.status.merge_requests_available);
        assert_eq!(stats.commit_count, 0);
        assert_eq!(stats.merge_request_count, 2);
        assert_eq!(stats.errors.len(), 1);
        assert_eq!(stats.errors[0].kind, "commits");
    }

    #[tokio::test]
    async fn partially_failed_project_is_still_reported() {
        let mut commits = HashMap::new();
        commits.insert(3, vec![commit("a1", "alice")]);

        let mock = MockGitLab {
            projects: vec![project(3, "tools")],
            commits,
            failing_merge_requests: vec![3],
            ..Default::default()
        };
        let service = GroupStatsService::new(mock, vec![]);

        let report = service
            .collect_stats(42, "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert_eq!(report.processed_projects, 1);
        assert_eq!(report.total_commits, 1);
        assert_eq!(report.total_merge_requests, 0);
        assert_eq!(report.partial_data_projects.len(), 1);
        assert_eq!(report.partial_data_projects[0].errors[0].kind, "merge_requests");
        assert_eq!(report.projects.len(), 1);
    }

    #[tokio::test]
    async fn missing_project_is_skipped_without_aborting_the_batch() {
        let mut commits = HashMap::new();
        commits.insert(2, vec![commit("c1", "carol")]);

        let mock = MockGitLab {
            projects: vec![project(1, "gone"), project(2, "web")],
            commits,
            missing_projects: vec![1],
            ..Default::default()
        };
        let service = GroupStatsService::new(mock, vec![]);

        let report = service
            .collect_stats(42, "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert_eq!(report.total_projects, 2);
        assert_eq!(report.processed_projects, 1);
        assert_eq!(report.total_commits, 1);
        assert_eq!(report.skipped_projects.len(), 1);
        assert_eq!(report.skipped_projects[0].id, 1);
        assert_eq!(report.skipped_projects[0].reason, "project 1 not found");
        assert_eq!(report.summary.processed_projects, 1);
        assert_eq!(report.summary.skipped_projects, 1);
    }

    #[tokio::test]
    async fn excluded_project_is_always_skipped() {
        let mut commits = HashMap::new();
        commits.insert(174, vec![commit("a1", "alice")]);
        commits.insert(5, vec![commit("b1", "bob")]);

        let mock = MockGitLab {
            projects: vec![project(174, "legacy"), project(5, "api")],
            commits,
            ..Default::default()
        };
        let service = GroupStatsService::new(mock, vec![174]);

        let report = service
            .collect_stats(42, "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert_eq!(report.processed_projects, 1);
        assert_eq!(report.total_commits, 1);
        assert_eq!(report.skipped_projects.len(), 1);
        assert_eq!(report.skipped_projects[0].id, 174);
        assert_eq!(
            report.skipped_projects[0].reason,
            "Project ID temporarily excluded"
        );
        assert!(!report.contributors.contains_key("alice"));
    }

    #[tokio::test]
    async fn empty_group_produces_an_empty_report() {
        let service = GroupStatsService::new(MockGitLab::default(), vec![174]);

        let report = service
            .collect_stats(42, "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert_eq!(report.total_projects, 0);
        assert!(report.projects.is_empty());
        assert!(report.skipped_projects.is_empty());
        assert_eq!(report.summary.total_projects, 0);
        assert_eq!(report.summary.processed_projects, 0);
    }

    #[tokio::test]
    async fn commits_are_counted_once_per_unique_id() {
        let mut commits = HashMap::new();
        // Same commit discovered from two branches.
        commits.insert(
            8,
            vec![
                commit("a1", "alice"),
                commit("a1", "alice"),
                commit("b2", "bob"),
            ],
        );

        let mock = MockGitLab {
            projects: vec![project(8, "api")],
            commits,
            ..Default::default()
        };
        let service = GroupStatsService::new(mock, vec![]);

        let report = service
            .collect_stats(42, "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert_eq!(report.total_commits, 2);
        assert_eq!(report.contributors["alice"].commits, 1);
        assert_eq!(report.contributors["bob"].commits, 1);
    }

    #[tokio::test]
    async fn merge_request_without_author_counts_toward_totals_only() {
        let mut merge_requests = HashMap::new();
        merge_requests.insert(
            9,
            vec![
                GitLabMergeRequest {
                    author: None,
                    created_at: "2024-03-02T09:30:00Z".to_string(),
                    state: "opened".to_string(),
                },
                merge_request("dave"),
            ],
        );

        let mock = MockGitLab {
            projects: vec![project(9, "tools")],
            merge_requests,
            ..Default::default()
        };
        let service = GroupStatsService::new(mock, vec![]);

        let report = service
            .collect_stats(42, "2024-01-01", "2024-12-31")
            .await
            .unwrap();

        assert_eq!(report.total_merge_requests, 2);
        assert_eq!(report.contributors.len(), 1);
        assert_eq!(report.contributors["dave"].merge_requests, 1);
    }
}
