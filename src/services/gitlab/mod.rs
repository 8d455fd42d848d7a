pub mod client;
mod pagination;

pub use client::GitLabClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

// GitLab API response structures

#[derive(Clone, Debug, Deserialize)]
pub struct GitLabProject {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GitLabBranch {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GitLabCommit {
    pub id: String,
    pub author_name: String,
    pub authored_date: String,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GitLabUser {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GitLabMergeRequest {
    pub author: Option<GitLabUser>,
    pub created_at: String,
    pub state: String,
}

/// Failures surfaced by the GitLab API client
#[derive(Debug, Error)]
pub enum GitLabError {
    #[error("invalid private token or unauthorized access")]
    Unauthorized,
    #[error("group {0} not found")]
    GroupNotFound(i64),
    #[error("project {0} not found")]
    ProjectNotFound(i64),
    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Operations the stats pipeline needs from a GitLab instance
#[async_trait]
pub trait GitLabApi: Send + Sync {
    /// List every project in a group. Fails when the group is missing or
    /// the token is rejected.
    async fn list_group_projects(&self, group_id: i64) -> Result<Vec<GitLabProject>, GitLabError>;

    /// List every branch of a project. An empty list is a valid result.
    async fn list_project_branches(
        &self,
        project_id: i64,
    ) -> Result<Vec<GitLabBranch>, GitLabError>;

    /// List commit records across all branches of a project, optionally
    /// bounded by since/until date strings. Records are raw: the same
    /// commit appears once per branch that contains it.
    async fn list_project_commits(
        &self,
        project_id: i64,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<GitLabCommit>, GitLabError>;

    /// List merge requests of a project, optionally filtered by state and
    /// creation date range.
    async fn list_project_merge_requests(
        &self,
        project_id: i64,
        state: &str,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<GitLabMergeRequest>, GitLabError>;
}
