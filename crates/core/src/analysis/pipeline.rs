use crate::analysis::merger::{self, MergeOptions};
use crate::analysis::{detector, scorer, topic};
use crate::domain::portfolio::Portfolio;
use crate::domain::risk::{RiskCategory, RiskRecord, RiskReport};
use crate::ingest::types::TranscriptFragment;
use crate::nlp::Collaborators;
use crate::storage::session::{SessionPointer, SessionStore};
use anyhow::Context;
use std::sync::Arc;

/// Runs transcript fragments through merging, detection, scoring and classification.
///
/// Units are processed one after another. A collaborator failure on any unit aborts the
/// whole run; the error names the unit index and the failing step.
#[derive(Clone)]
pub struct RiskPipeline {
    collaborators: Collaborators,
    portfolio: Arc<Portfolio>,
    taxonomy: Vec<RiskCategory>,
    merge_opts: MergeOptions,
}

impl RiskPipeline {
    pub fn new(collaborators: Collaborators, portfolio: Arc<Portfolio>) -> Self {
        Self {
            collaborators,
            portfolio,
            taxonomy: RiskCategory::ALL.to_vec(),
            merge_opts: MergeOptions::default(),
        }
    }

    pub fn with_merge_options(mut self, merge_opts: MergeOptions) -> Self {
        self.merge_opts = merge_opts;
        self
    }

    /// Restricts topic classification to `taxonomy`, in the given order.
    pub fn with_taxonomy(mut self, taxonomy: Vec<RiskCategory>) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub async fn analyze(&self, fragments: &[TranscriptFragment]) -> anyhow::Result<RiskReport> {
        let units = merger::merge(fragments, self.merge_opts);
        tracing::info!(
            fragments = fragments.len(),
            units = units.len(),
            "transcript merged into text units"
        );
        if units.is_empty() {
            return Ok(RiskReport::empty());
        }

        let mut records = Vec::new();
        for (idx, unit) in units.iter().enumerate() {
            if let Some(record) = self
                .analyze_unit(unit)
                .await
                .with_context(|| format!("analysis of text unit #{idx} failed"))?
            {
                records.push(record);
            }
        }

        tracing::info!(
            units = units.len(),
            records = records.len(),
            "transcript analysis complete"
        );
        Ok(RiskReport::from_records(records))
    }

    /// Like [`RiskPipeline::analyze`], but a transcript that cannot be loaded yields an
    /// empty report instead of an error.
    pub async fn analyze_session(
        &self,
        store: &dyn SessionStore,
        pointer: &SessionPointer,
    ) -> anyhow::Result<RiskReport> {
        let fragments = match store.load_fragments(pointer).await {
            Ok(fragments) => fragments,
            Err(err) => {
                tracing::error!(
                    content_id = %pointer.content_id,
                    path = %pointer.transcript_path.display(),
                    error = %format!("{err:#}"),
                    "transcript could not be loaded"
                );
                return Ok(RiskReport::empty());
            }
        };

        self.analyze(&fragments).await
    }

    async fn analyze_unit(&self, unit: &str) -> anyhow::Result<Option<RiskRecord>> {
        let Some(asset) =
            detector::detect(unit, &self.portfolio, self.collaborators.entities.as_ref()).await?
        else {
            return Ok(None);
        };

        let sentiment = self
            .collaborators
            .sentiment
            .classify_sentiment(unit)
            .await
            .context("sentiment classification failed")?;

        let category =
            topic::classify(unit, &self.taxonomy, self.collaborators.topic.as_ref()).await?;

        let impact = scorer::score(&sentiment, asset, &self.portfolio);
        tracing::debug!(
            %asset,
            label = %sentiment.label,
            risk_multiplier = impact.risk_multiplier,
            impact_score = impact.impact_score,
            "scored asset mention"
        );

        Ok(Some(RiskRecord {
            asset: asset.to_string(),
            portfolio_weight: self.portfolio.weight(asset),
            sentence: unit.to_string(),
            sentiment_label: sentiment.label,
            top_risk_category: category,
            portfolio_impact_score: scorer::round_score(impact.impact_score),
        }))
    }
}
