use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// One of the three independent ESG axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EsgCategory {
    Environmental,
    Social,
    Governance,
}

impl EsgCategory {
    pub const ALL: [EsgCategory; 3] = [
        EsgCategory::Environmental,
        EsgCategory::Social,
        EsgCategory::Governance,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EsgCategory::Environmental => "environmental",
            EsgCategory::Social => "social",
            EsgCategory::Governance => "governance",
        }
    }
}

impl std::fmt::Display for EsgCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EsgCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "environmental" => Ok(EsgCategory::Environmental),
            "social" => Ok(EsgCategory::Social),
            "governance" => Ok(EsgCategory::Governance),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }
}

/// Raw model output for a single category: sentiment in `[-1, 1]` and the
/// model's confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategorySignal {
    pub sentiment: f64,
    pub confidence: f64,
}

impl CategorySignal {
    #[must_use]
    pub fn new(sentiment: f64, confidence: f64) -> Self {
        Self {
            sentiment,
            confidence,
        }
    }
}

/// Per-article output of the sentiment-classification stage.
///
/// Immutable once written. Re-analysis produces a new `version` for the same
/// `article_id`; the older version is superseded rather than edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSignal {
    pub article_id: Uuid,
    pub company_id: i64,
    pub published_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: i32,
    pub overall_sentiment: f64,
    pub overall_confidence: f64,
    pub environmental: CategorySignal,
    pub social: CategorySignal,
    pub governance: CategorySignal,
    /// Produced upstream and carried through untouched.
    #[serde(default)]
    pub key_themes: Vec<String>,
    /// Produced upstream and carried through untouched.
    #[serde(default)]
    pub risk_indicators: Vec<String>,
}

fn default_version() -> i32 {
    1
}

impl ArticleSignal {
    #[must_use]
    pub fn category(&self, category: EsgCategory) -> CategorySignal {
        match category {
            EsgCategory::Environmental => self.environmental,
            EsgCategory::Social => self.social,
            EsgCategory::Governance => self.governance,
        }
    }
}

/// A lexicon hit in an article's text.
///
/// `polarity` is the signed sentiment implied around the match, in `[-1, 1]`.
/// It is supplied by whoever produced the match; the taxonomy ships a default
/// heuristic for callers that have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub category: EsgCategory,
    pub weight: f64,
    pub polarity: f64,
}

/// Which path the article scorer took for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBasis {
    /// Confidence at or above the floor; raw model sentiment used as-is.
    Model,
    /// Sub-floor confidence blended with keyword bias.
    KeywordBlend,
    /// Sub-floor confidence and no keyword evidence; down-weighted downstream.
    LowConfidence,
}

impl ScoreBasis {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreBasis::Model => "model",
            ScoreBasis::KeywordBlend => "keyword_blend",
            ScoreBasis::LowConfidence => "low_confidence",
        }
    }
}

impl std::fmt::Display for ScoreBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScoreBasis {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(ScoreBasis::Model),
            "keyword_blend" => Ok(ScoreBasis::KeywordBlend),
            "low_confidence" => Ok(ScoreBasis::LowConfidence),
            other => Err(CoreError::UnknownScoreBasis(other.to_string())),
        }
    }
}

/// Finalized per-category value for one article.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub sentiment: f64,
    pub confidence: f64,
    pub basis: ScoreBasis,
}

/// Article-level result of the scorer, the unit the aggregator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub article_id: Uuid,
    pub company_id: i64,
    pub published_at: DateTime<Utc>,
    pub version: i32,
    pub environmental: CategoryScore,
    pub social: CategoryScore,
    pub governance: CategoryScore,
    pub overall_confidence: f64,
}

impl ScoredArticle {
    #[must_use]
    pub fn category(&self, category: EsgCategory) -> CategoryScore {
        match category {
            EsgCategory::Environmental => self.environmental,
            EsgCategory::Social => self.social,
            EsgCategory::Governance => self.governance,
        }
    }
}
