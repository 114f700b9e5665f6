use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedTranscript {
    pub content_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    #[serde(default)]
    pub language: Option<String>,
    pub fragments: Vec<TranscriptFragment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub source: String,
    pub content_id: String,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub published_at: Option<NaiveDate>,
    pub raw_text: String,
    pub language: Option<String>,
}

impl FetchedTranscript {
    /// Fragment texts joined by single spaces.
    pub fn full_text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn content_item(&self, source: &str) -> ContentItem {
        ContentItem {
            source: source.to_string(),
            content_id: self.content_id.clone(),
            title: self.title.clone(),
            creator: self.creator.clone(),
            published_at: self.published_at,
            raw_text: self.full_text(),
            language: self.language.clone(),
        }
    }
}

impl ContentItem {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.content_id.trim().is_empty(),
            "content_id must be non-empty"
        );
        ensure!(
            !self.raw_text.trim().is_empty(),
            "transcript text for {} is empty",
            self.content_id
        );
        Ok(())
    }

    /// First `max_chars` characters of the text, for terminal previews.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.raw_text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.raw_text[..idx],
            None => &self.raw_text,
        }
    }
}
