use serde::Deserialize;
use std::env;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub verify_tls: bool,
    pub disable_proxy: bool,
    pub excluded_project_ids: Vec<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a number"),
            verify_tls: env::var("GITLAB_VERIFY_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .expect("GITLAB_VERIFY_TLS must be true or false"),
            disable_proxy: env::var("GITLAB_DISABLE_PROXY")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .expect("GITLAB_DISABLE_PROXY must be true or false"),
            excluded_project_ids: parse_id_list(
                &env::var("EXCLUDED_PROJECT_IDS").unwrap_or_else(|_| "174".to_string()),
            ),
        })
    }
}

/// Parse a comma-separated list of project ids.
fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse()
                .expect("EXCLUDED_PROJECT_IDS must be a comma-separated list of numbers")
        })
        .collect()
}
