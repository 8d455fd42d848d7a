use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate};
use url::Url;

/// Validate that a string is a valid URL with http or https scheme
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).map_err(|e| anyhow!("Invalid URL format: {}", e))?;

    // Only allow http and https schemes
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!(
            "URL must use http or https scheme, got: {}",
            url.scheme()
        ));
    }

    // Must have a host
    if url.host_str().is_none() {
        return Err(anyhow!("URL must have a host"));
    }

    Ok(url)
}

/// Validate a date filter value. GitLab accepts plain dates as well as
/// full RFC 3339 timestamps for since/until style parameters.
pub fn validate_date(value: &str) -> Result<()> {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
    {
        Ok(())
    } else {
        Err(anyhow!(
            "Invalid date '{}': expected YYYY-MM-DD or an RFC 3339 timestamp",
            value
        ))
    }
}
