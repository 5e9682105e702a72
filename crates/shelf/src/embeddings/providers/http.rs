//! Shared HTTP plumbing for hosted embedding services.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use topicshelf_core::{AppError, AppResult};
use tracing::debug;

/// Request timeout in seconds
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 60;

pub(crate) fn build_client(service: &str, timeout_secs: Option<u64>) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(
            timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS),
        ))
        .build()
        .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client for {}: {}", service, e)))
}

/// Join a base URL and an endpoint path without doubling slashes.
pub(crate) fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// POST a JSON body and decode a JSON response.
///
/// Non-2xx responses are turned into `AppError::Embedding` carrying the
/// service's own error message when one can be found in the body.
pub(crate) async fn post_json<Req, Resp>(
    client: &Client,
    service: &str,
    url: &str,
    bearer: Option<&str>,
    body: &Req,
) -> AppResult<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    debug!("Sending embedding request to {}", url);

    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Embedding(format!("Failed to send request to {}: {}", service, e)))?;

    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        return Err(AppError::Embedding(format!(
            "{} API error ({}): {}",
            service,
            status,
            extract_error_message(&error_text)
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Embedding(format!("Failed to parse {} response: {}", service, e)))
}

/// Pull a readable message out of `{"error": {"message": ..}}` or `{"error": ".."}`.
fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    let error = &value["error"];
    error["message"]
        .as_str()
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.openai.com/v1/", "/embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(join_url("http://h", "api/embeddings"), "http://h/api/embeddings");
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"bad key","type":"auth"}}"#),
            "bad key"
        );
        assert_eq!(extract_error_message(r#"{"error":"model not found"}"#), "model not found");
        assert_eq!(extract_error_message("gateway timeout"), "gateway timeout");
    }
}
