use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPosition {
    pub ticker: String,
    pub weight: f64,
    pub risk_tolerance: RiskTolerance,
}

/// Tracked holdings in their configured order.
///
/// Detection walks positions in this order, so the first listed ticker wins when a text
/// mentions several. Weights are not required to sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    positions: Vec<PortfolioPosition>,
}

#[derive(Debug, Deserialize)]
struct PortfolioFile {
    positions: Vec<PortfolioPosition>,
}

impl Portfolio {
    pub fn try_new(positions: Vec<PortfolioPosition>) -> anyhow::Result<Self> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(positions.len());
        for position in positions {
            let ticker = position.ticker.trim().to_string();
            ensure!(!ticker.is_empty(), "portfolio ticker must be non-empty");
            ensure!(
                seen.insert(ticker.to_uppercase()),
                "duplicate portfolio ticker: {ticker}"
            );
            ensure!(
                (0.0..=1.0).contains(&position.weight),
                "weight for {ticker} must be between 0 and 1 (got {})",
                position.weight
            );
            out.push(PortfolioPosition { ticker, ..position });
        }

        Ok(Self { positions: out })
    }

    /// The holdings the analyzer ships with when no portfolio file is configured.
    pub fn reference() -> Self {
        let position = |ticker: &str, weight: f64, risk_tolerance: RiskTolerance| {
            PortfolioPosition {
                ticker: ticker.to_string(),
                weight,
                risk_tolerance,
            }
        };

        Self {
            positions: vec![
                position("AAPL", 0.35, RiskTolerance::Low),
                position("TESLA", 0.15, RiskTolerance::Medium),
                position("MSFT", 0.20, RiskTolerance::Low),
            ],
        }
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let parsed = serde_json::from_str::<PortfolioFile>(s)
            .context("portfolio JSON must look like {\"positions\": [...]}")?;
        Self::try_new(parsed.positions)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read portfolio file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid portfolio file {}", path.display()))
    }

    /// Loads `path` when given, otherwise falls back to [`Portfolio::reference`].
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::reference()),
        }
    }

    pub fn positions(&self) -> &[PortfolioPosition] {
        &self.positions
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.positions.iter().map(|p| p.ticker.as_str())
    }

    pub fn get(&self, ticker: &str) -> Option<&PortfolioPosition> {
        self.positions.iter().find(|p| p.ticker == ticker)
    }

    /// Weight of `ticker`, or 0 when it is not held.
    pub fn weight(&self, ticker: &str) -> f64 {
        self.get(ticker).map(|p| p.weight).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_portfolio_keeps_declared_order() {
        let portfolio = Portfolio::reference();
        let tickers: Vec<_> = portfolio.tickers().collect();
        assert_eq!(tickers, vec!["AAPL", "TESLA", "MSFT"]);
        assert_eq!(portfolio.weight("AAPL"), 0.35);
        assert_eq!(
            portfolio.get("TESLA").unwrap().risk_tolerance,
            RiskTolerance::Medium
        );
    }

    #[test]
    fn unknown_ticker_has_zero_weight() {
        assert_eq!(Portfolio::reference().weight("NVDA"), 0.0);
    }

    #[test]
    fn parses_positions_file() {
        let s = json!({
            "positions": [
                {"ticker": "NVDA", "weight": 0.5, "risk_tolerance": "HIGH"},
                {"ticker": " AMZN ", "weight": 0.25, "risk_tolerance": "LOW"}
            ]
        })
        .to_string();

        let portfolio = Portfolio::from_json_str(&s).unwrap();
        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio.positions()[1].ticker, "AMZN");
        assert_eq!(portfolio.positions()[0].risk_tolerance, RiskTolerance::High);
    }

    #[test]
    fn rejects_duplicate_tickers_case_insensitively() {
        let s = json!({
            "positions": [
                {"ticker": "AAPL", "weight": 0.1, "risk_tolerance": "LOW"},
                {"ticker": "aapl", "weight": 0.2, "risk_tolerance": "LOW"}
            ]
        })
        .to_string();

        assert!(Portfolio::from_json_str(&s).is_err());
    }

    #[test]
    fn rejects_weight_out_of_range() {
        let s = json!({
            "positions": [{"ticker": "AAPL", "weight": 1.5, "risk_tolerance": "LOW"}]
        })
        .to_string();

        assert!(Portfolio::from_json_str(&s).is_err());
    }

    #[test]
    fn weights_need_not_sum_to_one() {
        let s = json!({
            "positions": [
                {"ticker": "AAPL", "weight": 0.9, "risk_tolerance": "LOW"},
                {"ticker": "MSFT", "weight": 0.9, "risk_tolerance": "LOW"}
            ]
        })
        .to_string();

        assert!(Portfolio::from_json_str(&s).is_ok());
    }
}
