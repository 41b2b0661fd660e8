//! Per-article category scoring.
//!
//! Turns one article's raw model output plus its keyword matches into the
//! finalized `(E, S, G)` triple the aggregator consumes.

use esgrisk_core::{
    ArticleSignal, CategoryScore, CategorySignal, EsgCategory, KeywordMatch, ScoreBasis,
    ScoredArticle, ScoringConfig,
};
use uuid::Uuid;

use crate::error::ScoringError;

/// Scores individual articles under a fixed [`ScoringConfig`].
#[derive(Debug, Clone)]
pub struct ArticleScorer {
    config: ScoringConfig,
}

impl ArticleScorer {
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if the config fails validation.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Finalize one article's category scores.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidSignal`] if any sentiment lies outside
    /// `[-1, 1]`, any confidence or keyword weight outside `[0, 1]`, or any
    /// keyword polarity outside `[-1, 1]`. Values are never clamped.
    pub fn score(
        &self,
        signal: &ArticleSignal,
        matches: &[KeywordMatch],
    ) -> Result<ScoredArticle, ScoringError> {
        validate_signal(signal)?;
        validate_matches(signal.article_id, matches)?;

        let floor = self.config.confidence_floor;
        let score_for = |category: EsgCategory| {
            score_category(
                floor,
                signal.category(category),
                keyword_bias(category, matches),
            )
        };

        let environmental = score_for(EsgCategory::Environmental);
        let social = score_for(EsgCategory::Social);
        let governance = score_for(EsgCategory::Governance);

        let any_confident = [environmental, social, governance]
            .iter()
            .any(|c| c.basis == ScoreBasis::Model);
        let overall_confidence = if any_confident {
            signal.overall_confidence.max(floor)
        } else {
            signal.overall_confidence
        };

        tracing::debug!(
            article_id = %signal.article_id,
            environmental = %environmental.basis,
            social = %social.basis,
            governance = %governance.basis,
            overall_confidence,
            "article scored"
        );

        Ok(ScoredArticle {
            article_id: signal.article_id,
            company_id: signal.company_id,
            published_at: signal.published_at,
            version: signal.version,
            environmental,
            social,
            governance,
            overall_confidence,
        })
    }
}

/// Decide one category's finalized value.
///
/// At or above the floor the raw sentiment is kept. Below it, a keyword bias
/// (if any) is blended in proportion to the missing confidence; with no bias
/// the raw sentiment is kept and flagged low-confidence.
#[must_use]
pub fn score_category(floor: f64, raw: CategorySignal, bias: Option<f64>) -> CategoryScore {
    if raw.confidence >= floor {
        return CategoryScore {
            sentiment: raw.sentiment,
            confidence: raw.confidence,
            basis: ScoreBasis::Model,
        };
    }

    match bias {
        Some(bias) => CategoryScore {
            sentiment: raw.sentiment * raw.confidence + bias * (1.0 - raw.confidence),
            confidence: raw.confidence,
            basis: ScoreBasis::KeywordBlend,
        },
        None => CategoryScore {
            sentiment: raw.sentiment,
            confidence: raw.confidence,
            basis: ScoreBasis::LowConfidence,
        },
    }
}

/// Weight-averaged polarity of the matches in `category`.
///
/// `None` when the category has no matches (or only zero-weight ones).
#[must_use]
pub fn keyword_bias(category: EsgCategory, matches: &[KeywordMatch]) -> Option<f64> {
    let (weighted, total) = matches
        .iter()
        .filter(|m| m.category == category)
        .fold((0.0_f64, 0.0_f64), |(weighted, total), m| {
            (weighted + m.weight * m.polarity, total + m.weight)
        });

    (total > 0.0).then(|| weighted / total)
}

fn check(article_id: Uuid, field: &'static str, value: f64, min: f64) -> Result<(), ScoringError> {
    if (min..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::InvalidSignal {
            article_id,
            field,
            value,
        })
    }
}

/// Range-check every numeric field of a raw signal.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidSignal`] naming the first offending field.
pub fn validate_signal(signal: &ArticleSignal) -> Result<(), ScoringError> {
    let id = signal.article_id;
    check(id, "overall_sentiment", signal.overall_sentiment, -1.0)?;
    check(id, "overall_confidence", signal.overall_confidence, 0.0)?;
    check(id, "environmental_sentiment", signal.environmental.sentiment, -1.0)?;
    check(id, "environmental_confidence", signal.environmental.confidence, 0.0)?;
    check(id, "social_sentiment", signal.social.sentiment, -1.0)?;
    check(id, "social_confidence", signal.social.confidence, 0.0)?;
    check(id, "governance_sentiment", signal.governance.sentiment, -1.0)?;
    check(id, "governance_confidence", signal.governance.confidence, 0.0)?;
    Ok(())
}

/// Range-check a finalized article read back from storage.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidSignal`] naming the first offending field.
pub fn validate_scored(article: &ScoredArticle) -> Result<(), ScoringError> {
    let id = article.article_id;
    check(id, "overall_confidence", article.overall_confidence, 0.0)?;
    check(id, "environmental_sentiment", article.environmental.sentiment, -1.0)?;
    check(id, "environmental_confidence", article.environmental.confidence, 0.0)?;
    check(id, "social_sentiment", article.social.sentiment, -1.0)?;
    check(id, "social_confidence", article.social.confidence, 0.0)?;
    check(id, "governance_sentiment", article.governance.sentiment, -1.0)?;
    check(id, "governance_confidence", article.governance.confidence, 0.0)?;
    Ok(())
}

fn validate_matches(article_id: Uuid, matches: &[KeywordMatch]) -> Result<(), ScoringError> {
    for m in matches {
        check(article_id, "keyword_weight", m.weight, 0.0)?;
        check(article_id, "keyword_polarity", m.polarity, -1.0)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
