use anyhow::{Context, Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; emasbot/", env!("CARGO_PKG_VERSION"), ")");

/// Builds the HTTP client shared by a provider, bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T>(mut operation: F, retries: usize, delay_ms: u64) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        // URLs can carry API keys, keep them out of error messages
        match operation().await.map_err(|e| anyhow::Error::from(e.without_url())) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Sends a GET built by `request`, retrying transport failures, and fails on
/// a non-success status.
pub async fn get_success(
    request: impl Fn() -> reqwest::RequestBuilder,
    retries: usize,
) -> Result<reqwest::Response> {
    let response = with_retry(|| request().send(), retries, 500).await?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("HTTP error: {}", status);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_retry_gives_up_after_attempts() {
        let attempts = AtomicUsize::new(0);
        let client = http_client(Duration::from_secs(1)).unwrap();

        let result = with_retry(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                client.get("http://127.0.0.1:1/unreachable").send()
            },
            2,
            1,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_get_success_rejects_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = http_client(Duration::from_secs(5)).unwrap();
        let url = format!("{}/down", mock_server.uri());
        let err = get_success(|| client.get(&url), 0).await.unwrap_err();

        assert!(err.to_string().starts_with("HTTP error: 503 Service Unavailable"));
    }
}
