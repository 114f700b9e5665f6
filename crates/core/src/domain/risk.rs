use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }

    /// Parses classifier output labels such as `negative` or `Negative`.
    pub fn parse(label: &str) -> anyhow::Result<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => bail!("unrecognized sentiment label: {other}"),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f64,
}

/// Risk taxonomy handed to the zero-shot classifier as candidate labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Macro,
    Finance,
    Product,
    Regulatory,
    CompanyPositive,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Macro,
        RiskCategory::Finance,
        RiskCategory::Product,
        RiskCategory::Regulatory,
        RiskCategory::CompanyPositive,
    ];

    /// Candidate label text. The parenthesised hints steer the zero-shot model.
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Macro => "MACRO_RISK (Economy, Inflation, Rates)",
            RiskCategory::Finance => "FINANCE_RISK (Debt, Earnings, Cash Flow)",
            RiskCategory::Product => "PRODUCT_RISK (Supply Chain, Product Failure)",
            RiskCategory::Regulatory => "REGULATORY_RISK (Lawsuits, Policy Changes)",
            RiskCategory::CompanyPositive => "COMPANY_SPECIFIC_POSITIVE (Growth, New Product)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub asset: String,
    pub portfolio_weight: f64,
    pub sentence: String,
    pub sentiment_label: SentimentLabel,
    pub top_risk_category: RiskCategory,
    pub portfolio_impact_score: f64,
}

/// Records ordered from the most negative impact score to the most positive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskReport {
    records: Vec<RiskRecord>,
}

impl RiskReport {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sorts ascending by impact score. The sort is stable, so ties keep transcript order.
    pub fn from_records(mut records: Vec<RiskRecord>) -> Self {
        records.sort_by(|a, b| a.portfolio_impact_score.total_cmp(&b.portfolio_impact_score));
        Self { records }
    }

    pub fn records(&self) -> &[RiskRecord] {
        &self.records
    }

    /// The `n` worst findings.
    pub fn top(&self, n: usize) -> &[RiskRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(asset: &str, score: f64) -> RiskRecord {
        RiskRecord {
            asset: asset.to_string(),
            portfolio_weight: 0.1,
            sentence: format!("{asset} sentence"),
            sentiment_label: SentimentLabel::Neutral,
            top_risk_category: RiskCategory::Macro,
            portfolio_impact_score: score,
        }
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!(SentimentLabel::parse("Negative").unwrap(), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::parse(" positive ").unwrap(), SentimentLabel::Positive);
        assert!(SentimentLabel::parse("LABEL_0").is_err());
    }

    #[test]
    fn category_labels_round_trip() {
        for category in RiskCategory::ALL {
            assert_eq!(RiskCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(RiskCategory::from_label("OTHER"), None);
    }

    #[test]
    fn report_sorts_most_negative_first() {
        let report = RiskReport::from_records(vec![
            record("A", 0.5),
            record("B", -2.0),
            record("C", 0.0),
            record("D", -0.1),
        ]);

        let scores: Vec<_> = report
            .records()
            .iter()
            .map(|r| r.portfolio_impact_score)
            .collect();
        assert_eq!(scores, vec![-2.0, -0.1, 0.0, 0.5]);
        for pair in report.records().windows(2) {
            assert!(pair[0].portfolio_impact_score <= pair[1].portfolio_impact_score);
        }
    }

    #[test]
    fn ties_keep_insertion_order() {
        let report = RiskReport::from_records(vec![record("first", 0.0), record("second", 0.0)]);
        assert_eq!(report.records()[0].asset, "first");
        assert_eq!(report.records()[1].asset, "second");
    }

    #[test]
    fn top_is_capped_by_len() {
        let report = RiskReport::from_records(vec![record("A", 1.0), record("B", -1.0)]);
        assert_eq!(report.top(5).len(), 2);
        assert_eq!(report.top(1)[0].asset, "B");
        assert!(RiskReport::empty().top(5).is_empty());
    }
}
