use crate::domain::portfolio::Portfolio;
use crate::domain::risk::{SentimentLabel, SentimentResult};

/// Scales `weight * polarity` into roughly [-3.5, 3.5] for realistic holdings.
pub const IMPACT_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub impact_score: f64,
    pub risk_multiplier: f64,
}

/// Signed exposure of `ticker` to one sentiment reading. Unknown tickers weigh 0.
pub fn score(sentiment: &SentimentResult, ticker: &str, portfolio: &Portfolio) -> Impact {
    let risk_multiplier = match sentiment.label {
        SentimentLabel::Negative => -sentiment.score,
        SentimentLabel::Positive => sentiment.score,
        SentimentLabel::Neutral => 0.0,
    };

    let weight = portfolio.weight(ticker);
    Impact {
        impact_score: risk_multiplier * (weight * IMPACT_SCALE),
        risk_multiplier,
    }
}

/// Rounds to the four decimals reports carry.
pub fn round_score(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}
