//! In-memory collaborators for tests.

use super::{Entity, EntityRecognizer, SentimentClassifier, TopicClassifier};
use crate::domain::risk::{SentimentLabel, SentimentResult};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FakeSentiment {
    /// First rule whose needle occurs in the text decides the result.
    rules: Vec<(String, SentimentResult)>,
    fallback: SentimentResult,
    fail_on: Option<String>,
}

impl FakeSentiment {
    pub fn constant(label: SentimentLabel, score: f64) -> Self {
        Self {
            rules: Vec::new(),
            fallback: SentimentResult { label, score },
            fail_on: None,
        }
    }

    pub fn with_rule(mut self, needle: &str, label: SentimentLabel, score: f64) -> Self {
        self.rules
            .push((needle.to_string(), SentimentResult { label, score }));
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for FakeSentiment {
    async fn classify_sentiment(&self, text: &str) -> anyhow::Result<SentimentResult> {
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                anyhow::bail!("sentiment backend unavailable");
            }
        }

        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, result)| *result)
            .unwrap_or(self.fallback))
    }
}

pub enum FakeTopic {
    FirstCandidate,
    Fixed(String),
    Failing,
}

impl FakeTopic {
    pub fn first_candidate() -> Self {
        FakeTopic::FirstCandidate
    }

    pub fn fixed(label: &str) -> Self {
        FakeTopic::Fixed(label.to_string())
    }

    pub fn failing() -> Self {
        FakeTopic::Failing
    }
}

#[async_trait::async_trait]
impl TopicClassifier for FakeTopic {
    async fn classify_topic(
        &self,
        _text: &str,
        candidate_labels: &[&str],
    ) -> anyhow::Result<Vec<String>> {
        match self {
            FakeTopic::FirstCandidate => Ok(candidate_labels.iter().map(|s| s.to_string()).collect()),
            FakeTopic::Fixed(label) => {
                let mut out = vec![label.clone()];
                out.extend(
                    candidate_labels
                        .iter()
                        .filter(|l| **l != label.as_str())
                        .map(|s| s.to_string()),
                );
                Ok(out)
            }
            FakeTopic::Failing => anyhow::bail!("topic backend unavailable"),
        }
    }
}

pub struct FakeEntities {
    entities: Vec<Entity>,
    calls: AtomicUsize,
}

impl FakeEntities {
    pub fn none() -> Self {
        Self::returning(&[])
    }

    pub fn returning(entities: &[(&str, &str)]) -> Self {
        Self {
            entities: entities
                .iter()
                .map(|(text, label)| Entity {
                    text: text.to_string(),
                    label: label.to_string(),
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EntityRecognizer for FakeEntities {
    async fn extract_entities(&self, _text: &str) -> anyhow::Result<Vec<Entity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entities.clone())
    }
}
