use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Discrete risk band derived from the normalized overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(CoreError::UnknownRiskLevel(other.to_string())),
        }
    }
}

/// One company's scored result for one evaluation date.
///
/// Scores are on the 0–100 risk scale (higher means more negative ESG news).
/// `overall_sentiment` keeps the pre-normalization value so the next period
/// can compute its trend in sentiment space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyAggregateRecord {
    pub company_id: i64,
    pub date: NaiveDate,
    pub environmental_score: u8,
    pub social_score: u8,
    pub governance_score: u8,
    pub overall_score: u8,
    pub overall_sentiment: f64,
    pub confidence_score: f64,
    pub articles_analyzed: u32,
    pub sentiment_trend: f64,
    pub risk_level: RiskLevel,
}

/// The stored record of the preceding period, as read back from storage.
///
/// `overall_sentiment` is optional because older or hand-edited rows may lack
/// it; such a record cannot support a trend.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorRecord {
    pub company_id: i64,
    pub date: NaiveDate,
    pub overall_sentiment: Option<f64>,
}
