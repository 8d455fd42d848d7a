use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::services::gitlab::{GitLabClient, GitLabError};
use crate::services::group_stats::GroupStatsService;
use crate::utils::config::Config;
use crate::utils::http_client::HttpClientOptions;
use crate::utils::validators::{validate_date, validate_url};

// ============ Request DTOs ============

#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    pub gitlab_url: Option<String>,
    pub private_token: Option<String>,
    pub group_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug)]
struct ValidStatsRequest {
    gitlab_url: String,
    private_token: String,
    group_id: i64,
    start_date: String,
    end_date: String,
}

/// Check the request for missing or malformed fields before any network
/// call is made.
fn validate(request: StatsRequest) -> Result<ValidStatsRequest, String> {
    let missing: Vec<&str> = [
        ("gitlab_url", request.gitlab_url.is_none()),
        ("private_token", request.private_token.is_none()),
        ("group_id", request.group_id.is_none()),
        ("start_date", request.start_date.is_none()),
        ("end_date", request.end_date.is_none()),
    ]
    .iter()
    .filter(|(_, is_missing)| *is_missing)
    .map(|(field, _)| *field)
    .collect();

    if !missing.is_empty() {
        return Err(format!("Missing required fields: [{}]", missing.join(", ")));
    }

    let (Some(gitlab_url), Some(private_token), Some(group_id), Some(start_date), Some(end_date)) = (
        request.gitlab_url,
        request.private_token,
        request.group_id,
        request.start_date,
        request.end_date,
    ) else {
        return Err("Missing required fields".to_string());
    };

    validate_url(&gitlab_url).map_err(|e| format!("Invalid GitLab URL: {}", e))?;
    validate_date(&start_date).map_err(|e| e.to_string())?;
    validate_date(&end_date).map_err(|e| e.to_string())?;

    Ok(ValidStatsRequest {
        gitlab_url,
        private_token,
        group_id,
        start_date,
        end_date,
    })
}

/// POST /api/stats
/// Collect contribution statistics for every project in a group
pub async fn collect_group_stats(
    config: web::Data<Config>,
    payload: web::Json<StatsRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let request = match validate(payload.into_inner()) {
        Ok(request) => request,
        Err(message) => {
            log::warn!("Rejected stats request: {}", message);
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "error": message })));
        }
    };

    log::debug!(
        "Received request with GitLab URL: {} and group ID: {}",
        request.gitlab_url,
        request.group_id
    );

    let options = HttpClientOptions {
        verify_tls: config.verify_tls,
        disable_proxy: config.disable_proxy,
    };

    let client = match GitLabClient::new(&request.gitlab_url, &request.private_token, &options) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to create GitLab client: {}", e);
            return Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to create GitLab client: {}", e)
            })));
        }
    };

    let service = GroupStatsService::new(client, config.excluded_project_ids.clone());

    match service
        .collect_stats(request.group_id, &request.start_date, &request.end_date)
        .await
    {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(GitLabError::Unauthorized) => {
            Ok(HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Invalid private token or unauthorized access"
            })))
        }
        Err(e @ GitLabError::GroupNotFound(_)) => {
            Ok(HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() })))
        }
        Err(e) => {
            log::error!("Error collecting stats: {}", e);
            Ok(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Error collecting stats: {}", e)
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> StatsRequest {
        StatsRequest {
            gitlab_url: Some("https://gitlab.example.com".to_string()),
            private_token: Some("glpat-token".to_string()),
            group_id: Some(42),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-12-31".to_string()),
        }
    }

    #[test]
    fn accepts_a_complete_request() {
        assert!(validate(full_request()).is_ok());
    }

    #[test]
    fn lists_every_missing_field() {
        let request = StatsRequest {
            gitlab_url: None,
            private_token: Some("glpat-token".to_string()),
            group_id: None,
            start_date: Some("2024-01-01".to_string()),
            end_date: None,
        };

        let message = validate(request).unwrap_err();

        assert_eq!(
            message,
            "Missing required fields: [gitlab_url, group_id, end_date]"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        let mut request = full_request();
        request.gitlab_url = Some("ftp://gitlab.example.com".to_string());

        assert!(validate(request).unwrap_err().starts_with("Invalid GitLab URL"));
    }

    #[test]
    fn rejects_malformed_dates() {
        let mut request = full_request();
        request.start_date = Some("January 1st".to_string());
        assert!(validate(request).is_err());
    }

    #[test]
    fn accepts_rfc3339_timestamps() {
        let mut request = full_request();
        request.end_date = Some("2024-12-31T23:59:59Z".to_string());
        assert!(validate(request).is_ok());
    }
}
