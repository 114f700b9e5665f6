use crate::domain::risk::{RiskRecord, RiskReport, SentimentLabel};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub const DEFAULT_OUTPUT_FILE: &str = "financial_risk_output.csv";

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Asset")]
    asset: &'a str,
    #[serde(rename = "Portfolio_Weight")]
    portfolio_weight: f64,
    #[serde(rename = "Sentence")]
    sentence: &'a str,
    #[serde(rename = "Sentiment_Label")]
    sentiment_label: SentimentLabel,
    #[serde(rename = "Top_Risk_Category")]
    top_risk_category: &'static str,
    #[serde(rename = "Portfolio_Impact_Score")]
    portfolio_impact_score: f64,
}

impl<'a> From<&'a RiskRecord> for CsvRow<'a> {
    fn from(record: &'a RiskRecord) -> Self {
        Self {
            asset: &record.asset,
            portfolio_weight: record.portfolio_weight,
            sentence: &record.sentence,
            sentiment_label: record.sentiment_label,
            top_risk_category: record.top_risk_category.label(),
            portfolio_impact_score: record.portfolio_impact_score,
        }
    }
}

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Portfolio_Weight")]
    portfolio_weight: f64,
    #[tabled(rename = "Sentence")]
    sentence: String,
    #[tabled(rename = "Sentiment_Label")]
    sentiment_label: SentimentLabel,
    #[tabled(rename = "Top_Risk_Category")]
    top_risk_category: &'static str,
    #[tabled(rename = "Portfolio_Impact_Score")]
    portfolio_impact_score: f64,
}

impl From<&RiskRecord> for TableRow {
    fn from(record: &RiskRecord) -> Self {
        // Markdown rows must stay on one line and keep their column count.
        let sentence = record
            .sentence
            .replace(&['\r', '\n'][..], " ")
            .replace('|', "\\|");
        Self {
            asset: record.asset.clone(),
            portfolio_weight: record.portfolio_weight,
            sentence,
            sentiment_label: record.sentiment_label,
            top_risk_category: record.top_risk_category.label(),
            portfolio_impact_score: record.portfolio_impact_score,
        }
    }
}

/// Full report as CSV text, one row per record in report order.
pub fn to_csv(report: &RiskReport) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in report.records() {
        writer
            .serialize(CsvRow::from(record))
            .context("failed to serialize risk record")?;
    }
    if report.is_empty() {
        writer.write_record([
            "Asset",
            "Portfolio_Weight",
            "Sentence",
            "Sentiment_Label",
            "Top_Risk_Category",
            "Portfolio_Impact_Score",
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::Error::new(e.into_error()))
        .context("failed to flush csv buffer")?;
    String::from_utf8(bytes).context("csv output is not valid UTF-8")
}

pub async fn write_csv(path: &Path, report: &RiskReport) -> anyhow::Result<()> {
    tokio::fs::write(path, to_csv(report)?)
        .await
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    tracing::info!(path = %path.display(), records = report.len(), "wrote risk report");
    Ok(())
}

/// Markdown table of the `n` worst findings.
pub fn to_markdown(report: &RiskReport, n: usize) -> String {
    let rows: Vec<TableRow> = report.top(n).iter().map(TableRow::from).collect();
    Table::new(rows).with(Style::markdown()).to_string()
}
