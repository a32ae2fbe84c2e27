//! Presentation generation API client.
//!
//! Hands a committed deck off to the remote backend that turns the
//! transcript into a presentation. The hand-off is a single point-in-time
//! snapshot on explicit stop; nothing is streamed. Token acquisition is the
//! host application's concern - this client accepts an already-acquired
//! bearer token.

use crate::capture::SlideSegment;
use crate::error::GenerationError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};
use zeroize::Zeroize;

/// Maximum number of retry attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Initial delay between retries (doubles with each attempt).
const INITIAL_RETRY_DELAY_MS: u64 = 1000;

/// Client for the presentation-generation REST API.
pub struct PresentationClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

/// Request body for presentation creation.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    transcript: &'a str,
    title: &'a str,
    /// Always null; the backend produces the slide outline itself.
    slides: serde_json::Value,
}

/// One slide in the generated presentation.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSlide {
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
}

/// A presentation created by the backend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPresentation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slides: Vec<GeneratedSlide>,
    #[serde(default)]
    pub transcript: String,
    pub created_at: String,
}

impl PresentationClient {
    /// Create a client for the given API base URL and bearer token.
    pub fn new(base_url: &str, access_token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for PresentationClient")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            client,
        })
    }

    /// Generate a presentation from a committed deck.
    ///
    /// Sends the space-joined segment texts to the backend. Retries on 5xx
    /// responses and transient network failures with exponential backoff.
    #[instrument(skip(self, deck, title), fields(slides = deck.len()))]
    pub async fn generate(
        &self,
        deck: &[SlideSegment],
        title: Option<&str>,
    ) -> Result<GeneratedPresentation, GenerationError> {
        if deck.is_empty() {
            return Err(GenerationError::EmptyDeck);
        }

        let transcript = deck
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let request_body = GenerateRequest {
            transcript: &transcript,
            title: title.unwrap_or(""),
            slides: serde_json::Value::Null,
        };
        let url = format!("{}/api/presentations", self.base_url);

        let mut last_error: Option<GenerationError> = None;
        let mut retry_delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                warn!(
                    attempt = attempt,
                    max_retries = MAX_RETRIES,
                    delay_ms = retry_delay.as_millis(),
                    "Retrying presentation request after transient failure"
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.access_token)
                .header("Content-Type", "application/json")
                .json(&request_body)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let presentation: GeneratedPresentation =
                            response.json().await.map_err(|e| {
                                GenerationError::InvalidResponse(format!(
                                    "Failed to parse presentation response: {}",
                                    e
                                ))
                            })?;

                        if attempt > 0 {
                            info!(
                                attempt = attempt,
                                "Presentation request succeeded after retry"
                            );
                        }

                        info!(id = %presentation.id, "Presentation created");
                        return Ok(presentation);
                    }

                    let status_code = status.as_u16();
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let message = response.text().await.unwrap_or_default();
                    let error = classify_status(status_code, message, retry_after);

                    if (500..600).contains(&status_code) && attempt < MAX_RETRIES {
                        warn!(
                            status = status_code,
                            attempt = attempt,
                            "Server error, will retry"
                        );
                        last_error = Some(error);
                        continue;
                    }

                    warn!(status = status_code, "Presentation request failed");
                    return Err(error);
                }
                Err(e) => {
                    if Self::is_retryable_error(&e) && attempt < MAX_RETRIES {
                        warn!(error = %e, attempt = attempt, "Network error, will retry");
                        last_error = Some(GenerationError::Network(e));
                        continue;
                    }

                    return Err(GenerationError::Network(e));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GenerationError::InvalidResponse("Unexpected retry loop exit".into())))
    }

    /// Check if a reqwest error is retryable (transient).
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }
}

/// Map a non-success HTTP status to a typed error.
fn classify_status(status: u16, message: String, retry_after: Option<String>) -> GenerationError {
    match status {
        401 => GenerationError::Unauthorized,
        429 => GenerationError::RateLimited { retry_after },
        400 => GenerationError::InvalidRequest(message),
        _ => GenerationError::ServerError { status, message },
    }
}

impl Drop for PresentationClient {
    fn drop(&mut self) {
        // Clear bearer token from memory
        self.access_token.zeroize();
    }
}
