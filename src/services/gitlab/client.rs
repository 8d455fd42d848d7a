use super::pagination::{fetch_all_pages, Page, PER_PAGE};
use super::{
    GitLabApi, GitLabBranch, GitLabCommit, GitLabError, GitLabMergeRequest, GitLabProject,
};
use crate::utils::http_client::{create_http_client, HttpClientOptions};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Client for a single GitLab instance, authenticated with a private
/// token sent on every request.
pub struct GitLabClient {
    http: Client,
    base_url: String,
    token: String,
}

impl GitLabClient {
    pub fn new(
        base_url: &str,
        token: &str,
        options: &HttpClientOptions,
    ) -> Result<Self, GitLabError> {
        let http = create_http_client(options)?;

        log::debug!("Initialized GitLab client with base URL: {}", base_url);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base_url, path)
    }

    /// Fetch one page of a listing and report whether more pages follow.
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &str,
        page: u32,
        extra_params: &[(&str, String)],
    ) -> Result<Page<T>, GitLabError> {
        let response = self
            .http
            .get(url)
            .header(PRIVATE_TOKEN_HEADER, &self.token)
            .query(&[("page", page.to_string()), ("per_page", PER_PAGE.to_string())])
            .query(extra_params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(GitLabError::Unauthorized);
        }
        if !status.is_success() {
            return Err(GitLabError::Status {
                status,
                url: url.to_string(),
            });
        }

        let has_next = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|value| value.to_str().ok())
            .map(has_next_page)
            .unwrap_or(false);

        let items = response.json::<Vec<T>>().await?;

        Ok(Page { items, has_next })
    }

    /// Verify that the group exists before paginating its projects.
    async fn check_group(&self, group_id: i64) -> Result<(), GitLabError> {
        let url = self.api_url(&format!("groups/{}", group_id));

        let response = self
            .http
            .get(&url)
            .header(PRIVATE_TOKEN_HEADER, &self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(GitLabError::Unauthorized),
            StatusCode::NOT_FOUND => {
                log::error!("Group {} not found", group_id);
                Err(GitLabError::GroupNotFound(group_id))
            }
            status if !status.is_success() => Err(GitLabError::Status { status, url }),
            _ => Ok(()),
        }
    }

    /// Verify that the project exists before enumerating its branches.
    async fn check_project(&self, project_id: i64) -> Result<(), GitLabError> {
        let url = self.api_url(&format!("projects/{}", project_id));

        let response = self
            .http
            .get(&url)
            .header(PRIVATE_TOKEN_HEADER, &self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(GitLabError::Unauthorized),
            StatusCode::NOT_FOUND => {
                log::error!("Project {} not found", project_id);
                Err(GitLabError::ProjectNotFound(project_id))
            }
            status if !status.is_success() => Err(GitLabError::Status { status, url }),
            _ => Ok(()),
        }
    }
}

/// GitLab signals further pages through a Link header with rel="next";
/// its absence means the last page.
fn has_next_page(link_header: &str) -> bool {
    link_header
        .split(',')
        .any(|link| link.contains(r#"rel="next""#))
}

#[async_trait]
impl GitLabApi for GitLabClient {
    async fn list_group_projects(&self, group_id: i64) -> Result<Vec<GitLabProject>, GitLabError> {
        self.check_group(group_id).await?;

        log::info!("Fetching projects for group {}", group_id);

        let url = self.api_url(&format!("groups/{}/projects", group_id));
        let projects = fetch_all_pages("projects", |page| self.fetch_page(&url, page, &[])).await;

        log::info!("Total projects found: {}", projects.len());

        Ok(projects)
    }

    async fn list_project_branches(
        &self,
        project_id: i64,
    ) -> Result<Vec<GitLabBranch>, GitLabError> {
        let url = self.api_url(&format!("projects/{}/repository/branches", project_id));
        let branches = fetch_all_pages("branches", |page| self.fetch_page(&url, page, &[])).await;

        log::info!(
            "Total branches found for project {}: {}",
            project_id,
            branches.len()
        );

        Ok(branches)
    }

    async fn list_project_commits(
        &self,
        project_id: i64,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<GitLabCommit>, GitLabError> {
        self.check_project(project_id).await?;

        let branches = self.list_project_branches(project_id).await?;
        let url = self.api_url(&format!("projects/{}/repository/commits", project_id));
        let mut all_commits = Vec::new();

        for branch in &branches {
            let mut params = vec![("ref_name", branch.name.clone())];
            if let Some(since) = since {
                params.push(("since", since.to_string()));
            }
            if let Some(until) = until {
                params.push(("until", until.to_string()));
            }

            log::debug!("Fetching commits for branch: {}", branch.name);

            let commits: Vec<GitLabCommit> =
                fetch_all_pages("commits", |page| self.fetch_page(&url, page, &params)).await;
            all_commits.extend(commits);
        }

        log::info!(
            "Collected {} commit records across {} branches of project {}",
            all_commits.len(),
            branches.len(),
            project_id
        );

        Ok(all_commits)
    }

    async fn list_project_merge_requests(
        &self,
        project_id: i64,
        state: &str,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<GitLabMergeRequest>, GitLabError> {
        let url = self.api_url(&format!("projects/{}/merge_requests", project_id));

        let mut params = vec![("state", state.to_string())];
        if let Some(since) = since {
            params.push(("created_after", since.to_string()));
        }
        if let Some(until) = until {
            params.push(("created_before", until.to_string()));
        }

        let merge_requests =
            fetch_all_pages("merge requests", |page| self.fetch_page(&url, page, &params)).await;

        log::info!("Total merge requests found: {}", merge_requests.len());

        Ok(merge_requests)
    }
}
