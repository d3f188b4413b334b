//! Shared HTTP response checks for the model API client.

use crate::error::AgentError;

/// Map 429 to [`AgentError::RateLimited`] and any other non-success status
/// to [`AgentError::Api`]; successful responses pass through.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, AgentError> {
    if resp.status() == 429 {
        return Err(AgentError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        return Err(AgentError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// `Retry-After` in seconds, 60 when absent or not numeric.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}
