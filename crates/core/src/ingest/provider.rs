use crate::config::Settings;
use crate::ingest::types::{FetchedTranscript, TranscriptFragment};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_LANGUAGES: &str = "en,en-US";

#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_transcript(&self, content_id: &str) -> Result<FetchedTranscript>;
}

/// Pulls timed transcript fragments from an HTTP service that fronts the video platform.
#[derive(Debug, Clone)]
pub struct HttpJsonTranscriptSource {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    languages: Vec<String>,
    retries: u32,
}

impl HttpJsonTranscriptSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_transcript_provider_base_url()?.to_string();
        let api_key = settings.transcript_provider_api_key.clone();

        let timeout_secs = std::env::var("TRANSCRIPT_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("TRANSCRIPT_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let languages = parse_languages(
            &std::env::var("TRANSCRIPT_LANGUAGES").unwrap_or_else(|_| DEFAULT_LANGUAGES.to_string()),
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build transcript provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            languages,
            retries,
        })
    }

    fn url(&self, content_id: &str) -> String {
        format!(
            "{}/v1/transcripts/{}",
            self.base_url.trim_end_matches('/'),
            content_id
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, content_id: &str) -> Result<FetchedTranscript> {
        let res = self
            .http
            .get(self.url(content_id))
            .headers(self.headers()?)
            .query(&[("languages", self.languages.join(","))])
            .send()
            .await
            .context("transcript provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read transcript provider response")?;

        if !status.is_success() {
            anyhow::bail!("transcript provider HTTP {status}: {text}");
        }

        serde_json::from_str::<FetchedTranscript>(&text)
            .with_context(|| format!("transcript response is not valid JSON for {content_id}"))
    }
}

#[async_trait::async_trait]
impl TranscriptSource for HttpJsonTranscriptSource {
    fn source_name(&self) -> &'static str {
        "youtube"
    }

    async fn fetch_transcript(&self, content_id: &str) -> Result<FetchedTranscript> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(content_id).await {
                Ok(fetched) => {
                    validate(&fetched, content_id)?;
                    return Ok(fetched);
                }
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, %content_id, error = %err, "transcript fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn parse_languages(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate(fetched: &FetchedTranscript, expected: &str) -> Result<()> {
    anyhow::ensure!(
        fetched.content_id == expected,
        "transcript content_id mismatch: expected {expected}, got {}",
        fetched.content_id
    );

    for (idx, fragment) in fetched.fragments.iter().enumerate() {
        validate_fragment(fragment).with_context(|| format!("invalid fragment #{idx}"))?;
    }

    Ok(())
}

fn validate_fragment(fragment: &TranscriptFragment) -> Result<()> {
    anyhow::ensure!(
        fragment.start.is_finite() && fragment.start >= 0.0,
        "start must be a non-negative number (got {})",
        fragment.start
    );
    anyhow::ensure!(
        fragment.duration.is_finite() && fragment.duration >= 0.0,
        "duration must be a non-negative number (got {})",
        fragment.duration
    );
    Ok(())
}
