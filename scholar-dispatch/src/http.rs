//! Shared HTTP plumbing for the concrete backend clients.
//!
//! Provides a configured [`reqwest::Client`] and the request/response
//! handling every JSON search API needs: send, check status, decode.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// User-Agent sent with every backend request.
pub const USER_AGENT: &str = concat!("scholar-dispatch/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed into a [`ClientError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Build a [`reqwest::Client`] for search API calls.
///
/// The client has:
/// - A fixed, identifying User-Agent
/// - gzip decompression
/// - A connect timeout; per-request timeouts are set per call
///
/// # Errors
///
/// Returns [`ClientError::Transport`] if the client cannot be constructed.
pub fn build_client() -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and decode a JSON body of type `T`.
///
/// Non-2xx responses become [`ClientError::Status`] with a truncated body;
/// undecodable bodies become [`ClientError::Parse`]. A request that hits
/// its own timeout becomes [`ClientError::TimedOut`].
pub async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ClientError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::TimedOut(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ClientError::Transport(format!("failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            message: truncate(&body, MAX_ERROR_BODY),
        });
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_succeeds() {
        assert!(build_client().is_ok());
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("scholar-dispatch/"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo");
        assert_eq!(truncate("short", 200), "short");
    }
}
