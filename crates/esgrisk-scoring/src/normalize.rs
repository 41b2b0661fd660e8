//! Sentiment space (`-1..=1`, +1 best) to risk scale (`0..=100`, 100 worst).

use crate::aggregate::RawAggregate;

/// Map one sentiment value onto the risk scale.
///
/// `risk = round((1 - sentiment) / 2 * 100)`, clamped to `[0, 100]` after
/// rounding. The sign flip is deliberate: negative ESG news reads as higher risk.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn risk_score(sentiment: f64) -> u8 {
    let risk = ((1.0 - sentiment) / 2.0 * 100.0).round().clamp(0.0, 100.0);
    risk as u8
}

/// Risk-scale scores for every axis of an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskScores {
    pub environmental: u8,
    pub social: u8,
    pub governance: u8,
    pub overall: u8,
}

impl From<&RawAggregate> for RiskScores {
    fn from(agg: &RawAggregate) -> Self {
        Self {
            environmental: risk_score(agg.environmental),
            social: risk_score(agg.social),
            governance: risk_score(agg.governance),
            overall: risk_score(agg.overall),
        }
    }
}
