use crate::domain::risk::SentimentResult;
use anyhow::Context;
use std::sync::Arc;

pub mod error;
pub mod huggingface;

#[cfg(any(test, feature = "test-util"))]
pub mod fakes;

/// Entity label the recognizer uses for companies and other organizations.
pub const ORGANIZATION_LABEL: &str = "ORG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn is_organization(&self) -> bool {
        self.label.eq_ignore_ascii_case(ORGANIZATION_LABEL)
    }
}

#[async_trait::async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify_sentiment(&self, text: &str) -> anyhow::Result<SentimentResult>;
}

#[async_trait::async_trait]
pub trait TopicClassifier: Send + Sync {
    /// Returns `candidate_labels` reordered by descending relevance.
    async fn classify_topic(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> anyhow::Result<Vec<String>>;
}

#[async_trait::async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn extract_entities(&self, text: &str) -> anyhow::Result<Vec<Entity>>;
}

/// Probe text sent to every model before a run so a missing model fails fast.
const WARM_UP_TEXT: &str = "Apple reported quarterly earnings.";

#[derive(Clone)]
pub struct Collaborators {
    pub sentiment: Arc<dyn SentimentClassifier>,
    pub topic: Arc<dyn TopicClassifier>,
    pub entities: Arc<dyn EntityRecognizer>,
}

impl Collaborators {
    /// Wires all three capabilities to one hosted inference client.
    pub fn hosted(settings: &crate::config::Settings) -> anyhow::Result<Self> {
        let client = Arc::new(huggingface::HuggingFaceClient::from_settings(settings)?);
        Ok(Self {
            sentiment: client.clone(),
            topic: client.clone(),
            entities: client,
        })
    }

    pub async fn warm_up(&self) -> anyhow::Result<()> {
        self.sentiment
            .classify_sentiment(WARM_UP_TEXT)
            .await
            .context("sentiment model is unavailable")?;
        self.topic
            .classify_topic(WARM_UP_TEXT, &["finance", "other"])
            .await
            .context("zero-shot topic model is unavailable")?;
        self.entities
            .extract_entities(WARM_UP_TEXT)
            .await
            .context("entity recognition model is unavailable")?;

        tracing::info!("nlp collaborators ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{FakeEntities, FakeSentiment, FakeTopic};
    use super::*;
    use crate::domain::risk::SentimentLabel;

    #[test]
    fn organization_label_is_case_insensitive() {
        let entity = Entity {
            text: "Apple".to_string(),
            label: "org".to_string(),
        };
        assert!(entity.is_organization());
    }

    #[tokio::test]
    async fn warm_up_fails_when_any_model_is_down() {
        let collaborators = Collaborators {
            sentiment: Arc::new(FakeSentiment::constant(SentimentLabel::Neutral, 0.5)),
            topic: Arc::new(FakeTopic::failing()),
            entities: Arc::new(FakeEntities::none()),
        };

        let err = collaborators.warm_up().await.unwrap_err();
        assert!(format!("{err:#}").contains("zero-shot topic model is unavailable"));
    }

    #[tokio::test]
    async fn warm_up_succeeds_with_healthy_models() {
        let collaborators = Collaborators {
            sentiment: Arc::new(FakeSentiment::constant(SentimentLabel::Neutral, 0.5)),
            topic: Arc::new(FakeTopic::first_candidate()),
            entities: Arc::new(FakeEntities::none()),
        };

        assert!(collaborators.warm_up().await.is_ok());
    }
}
