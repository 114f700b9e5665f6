use crate::config::Settings;
use crate::domain::risk::{SentimentLabel, SentimentResult};
use crate::nlp::error::InferenceDiagnosticsError;
use crate::nlp::{Entity, EntityRecognizer, SentimentClassifier, TopicClassifier};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_SENTIMENT_MODEL: &str = "ProsusAI/finbert";
const DEFAULT_TOPIC_MODEL: &str = "facebook/bart-large-mnli";
const DEFAULT_NER_MODEL: &str = "dslim/bert-base-NER";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRIES: u32 = 3;

/// Hosted inference client serving sentiment, zero-shot and NER from three models.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    http: reqwest::Client,
    api_token: String,
    base_url: String,
    sentiment_model: String,
    topic_model: String,
    ner_model: String,
    retries: u32,
}

impl HuggingFaceClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_token = settings.require_hf_api_token()?.to_string();
        let base_url = settings
            .hf_inference_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let sentiment_model = std::env::var("HF_SENTIMENT_MODEL")
            .unwrap_or_else(|_| DEFAULT_SENTIMENT_MODEL.to_string());
        let topic_model =
            std::env::var("HF_TOPIC_MODEL").unwrap_or_else(|_| DEFAULT_TOPIC_MODEL.to_string());
        let ner_model =
            std::env::var("HF_NER_MODEL").unwrap_or_else(|_| DEFAULT_NER_MODEL.to_string());

        let timeout_secs = std::env::var("HF_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("HF_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_token,
            base_url,
            sentiment_model,
            topic_model,
            ner_model,
            retries,
        })
    }

    fn headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_token))?,
        );
        Ok(headers)
    }

    async fn post_once<T: DeserializeOwned>(
        &self,
        model: &str,
        req: &InferenceRequest<'_>,
    ) -> anyhow::Result<T> {
        let url = format!(
            "{}/models/{}",
            self.base_url.trim_end_matches('/'),
            model
        );
        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(req)
            .send()
            .await
            .with_context(|| format!("inference request to {model} failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read inference response body")?;
        if !status.is_success() {
            return Err(InferenceDiagnosticsError {
                model: model.to_string(),
                stage: if is_transient(status) { "http_transient" } else { "http" },
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        serde_json::from_str::<T>(&text).map_err(|err| {
            InferenceDiagnosticsError {
                model: model.to_string(),
                stage: "decode",
                detail: err.to_string(),
                raw_output: Some(text),
            }
            .into()
        })
    }

    /// Retries while the model is loading or rate limited; other failures return at once.
    async fn post<T: DeserializeOwned>(
        &self,
        model: &str,
        req: InferenceRequest<'_>,
    ) -> anyhow::Result<T> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.post_once(model, &req).await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    let transient = err
                        .downcast_ref::<InferenceDiagnosticsError>()
                        .map(|d| d.stage == "http_transient")
                        .unwrap_or(true);
                    if !transient || attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, %model, error = %err, "inference call failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for HuggingFaceClient {
    async fn classify_sentiment(&self, text: &str) -> anyhow::Result<SentimentResult> {
        let req = InferenceRequest {
            inputs: text,
            parameters: None,
            options: InferenceOptions::WAIT,
        };
        let res: ClassificationResponse = self.post(&self.sentiment_model, req).await?;
        top_sentiment(res).with_context(|| format!("model {}", self.sentiment_model))
    }
}

#[async_trait::async_trait]
impl TopicClassifier for HuggingFaceClient {
    async fn classify_topic(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> anyhow::Result<Vec<String>> {
        let req = InferenceRequest {
            inputs: text,
            parameters: Some(Parameters::ZeroShot {
                candidate_labels,
                multi_label: false,
            }),
            options: InferenceOptions::WAIT,
        };
        let res: ZeroShotResponse = self.post(&self.topic_model, req).await?;
        res.ranked_labels()
            .with_context(|| format!("model {}", self.topic_model))
    }
}

#[async_trait::async_trait]
impl EntityRecognizer for HuggingFaceClient {
    async fn extract_entities(&self, text: &str) -> anyhow::Result<Vec<Entity>> {
        let req = InferenceRequest {
            inputs: text,
            parameters: Some(Parameters::TokenClassification {
                aggregation_strategy: "simple",
            }),
            options: InferenceOptions::WAIT,
        };
        let res: Vec<TokenClassificationItem> = self.post(&self.ner_model, req).await?;
        Ok(res
            .into_iter()
            .map(|item| Entity {
                text: item.word.trim().to_string(),
                label: item.entity_group,
            })
            .collect())
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS
}

fn top_sentiment(res: ClassificationResponse) -> anyhow::Result<SentimentResult> {
    let scores = match res {
        ClassificationResponse::Nested(mut batches) => {
            anyhow::ensure!(!batches.is_empty(), "empty sentiment response");
            batches.swap_remove(0)
        }
        ClassificationResponse::Flat(scores) => scores,
    };

    let best = scores
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .context("sentiment response had no labels")?;
    anyhow::ensure!(
        (0.0..=1.0).contains(&best.score),
        "sentiment score {} is outside [0, 1]",
        best.score
    );

    Ok(SentimentResult {
        label: SentimentLabel::parse(&best.label)?,
        score: best.score,
    })
}

#[derive(Debug, Clone, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Parameters<'a>>,
    options: InferenceOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Parameters<'a> {
    ZeroShot {
        candidate_labels: &'a [&'a str],
        multi_label: bool,
    },
    TokenClassification {
        aggregation_strategy: &'static str,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

impl InferenceOptions {
    const WAIT: InferenceOptions = InferenceOptions {
        wait_for_model: true,
    };
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Columns {
        labels: Vec<String>,
        scores: Vec<f64>,
    },
    Rows(Vec<LabelScore>),
}

impl ZeroShotResponse {
    fn ranked_labels(self) -> anyhow::Result<Vec<String>> {
        let mut pairs: Vec<(String, f64)> = match self {
            ZeroShotResponse::Columns { labels, scores } => {
                anyhow::ensure!(
                    labels.len() == scores.len(),
                    "zero-shot response has {} labels but {} scores",
                    labels.len(),
                    scores.len()
                );
                labels.into_iter().zip(scores).collect()
            }
            ZeroShotResponse::Rows(rows) => rows.into_iter().map(|r| (r.label, r.score)).collect(),
        };
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(pairs.into_iter().map(|(label, _)| label).collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TokenClassificationItem {
    #[serde(alias = "entity")]
    entity_group: String,
    word: String,
}
