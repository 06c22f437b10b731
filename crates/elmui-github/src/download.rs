//! HTTP downloads from GitHub with retries.

use std::time::Duration;

use elmui_util::errors::ElmUiError;
use reqwest::Client;

use crate::repository::GithubHost;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(8);

/// How often, and how patiently, transient failures are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            ..Self::default()
        }
    }

    /// Longest one download can take: every attempt running into
    /// `request_timeout`, plus the pauses between attempts.
    pub fn budget(&self, request_timeout: Duration) -> Duration {
        let attempts = self.attempts.max(1);
        let pauses: Duration = (1..attempts).map(|attempt| self.delay(attempt)).sum();
        request_timeout.saturating_mul(attempts) + pauses
    }

    /// Pause before retry number `attempt` (1-based), doubling each time.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }
}

/// Build a shared reqwest client for GitHub requests.
pub fn build_client(timeout: Duration) -> miette::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("elm-ui/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            ElmUiError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// Download raw bytes from a URL, retrying server errors, timeouts and
/// connection failures.
///
/// Returns `Ok(None)` for 404.
pub async fn download_bytes(
    client: &Client,
    host: &GithubHost,
    url: &str,
    retry: &RetryPolicy,
) -> miette::Result<Option<Vec<u8>>> {
    let mut last_err = String::new();
    let attempts = retry.attempts.max(1);

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = retry.delay(attempt);
            tracing::debug!("Retrying {url} in {delay:?} ({last_err})");
            tokio::time::sleep(delay).await;
        }

        let request = host.authorize(client.get(url), url);
        match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(ElmUiError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    }
                    .into());
                }

                let bytes = resp.bytes().await.map_err(|e| ElmUiError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = e.to_string();
                continue;
            }
            Err(e) => {
                return Err(ElmUiError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    Err(ElmUiError::Network {
        message: format!("Failed after {attempts} attempts for {url}: {last_err}"),
    }
    .into())
}

/// Download a text document (manifest, JSON listing).
pub async fn download_text(
    client: &Client,
    host: &GithubHost,
    url: &str,
    retry: &RetryPolicy,
) -> miette::Result<Option<String>> {
    Ok(download_bytes(client, host, url, retry)
        .await?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}
