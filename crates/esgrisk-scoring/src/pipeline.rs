//! Per-company evaluation: select, aggregate, normalize, classify.

use chrono::NaiveDate;
use esgrisk_core::{CompanyAggregateRecord, PriorRecord, ScoredArticle, ScoringConfig};

use crate::aggregate::{Aggregator, EvaluationWindow};
use crate::error::ScoringError;
use crate::normalize::RiskScores;
use crate::trend::{classify_risk, sentiment_trend};

/// What happened for one company in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyOutcome {
    /// A record was produced.
    Scored,
    /// No qualifying articles; nothing to write.
    Skipped,
    /// Articles existed but none could be used, or storage failed.
    Failed,
}

/// Result of evaluating one `(company, date)`.
#[derive(Debug)]
pub struct CompanyEvaluation {
    pub company_id: i64,
    pub date: NaiveDate,
    /// `None` when there was no usable evidence.
    pub record: Option<CompanyAggregateRecord>,
    /// Articles excluded for out-of-range values.
    pub rejected: Vec<ScoringError>,
    /// Non-fatal problems, e.g. an unusable prior record.
    pub warnings: Vec<ScoringError>,
}

impl CompanyEvaluation {
    #[must_use]
    pub fn outcome(&self) -> CompanyOutcome {
        match (&self.record, self.rejected.is_empty()) {
            (Some(_), _) => CompanyOutcome::Scored,
            (None, true) => CompanyOutcome::Skipped,
            (None, false) => CompanyOutcome::Failed,
        }
    }
}

/// Runs the aggregator, normalizer, and classifier for one company at a time.
///
/// Holds no mutable state, so one evaluator can be shared across workers.
#[derive(Debug, Clone)]
pub struct CompanyEvaluator {
    aggregator: Aggregator,
}

impl CompanyEvaluator {
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if the config fails validation.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        Ok(Self {
            aggregator: Aggregator::new(config)?,
        })
    }

    /// Window of articles read for `date`.
    #[must_use]
    pub fn window(&self, date: NaiveDate) -> EvaluationWindow {
        self.aggregator.window(date)
    }

    /// Window in which the prior period's record is looked up.
    #[must_use]
    pub fn prior_window(&self, date: NaiveDate) -> EvaluationWindow {
        self.aggregator.window(date).preceding()
    }

    /// Evaluate one company for one date.
    ///
    /// `articles` may contain anything the caller read; only the company's
    /// current-version articles inside the window are used. Re-running with the
    /// same inputs yields an identical record.
    #[must_use]
    pub fn evaluate(
        &self,
        company_id: i64,
        date: NaiveDate,
        articles: &[ScoredArticle],
        prior: Option<&PriorRecord>,
    ) -> CompanyEvaluation {
        let selection = self.aggregator.select(company_id, date, articles);
        let mut evaluation = CompanyEvaluation {
            company_id,
            date,
            record: None,
            rejected: selection.rejected,
            warnings: Vec::new(),
        };

        let Some(raw) = self.aggregator.aggregate(&selection.articles) else {
            tracing::debug!(company_id, %date, "no qualifying articles; no record produced");
            return evaluation;
        };

        let scores = RiskScores::from(&raw);

        let trend = match sentiment_trend(company_id, date, raw.overall, prior) {
            Ok(trend) => trend,
            Err(e) => {
                tracing::warn!(company_id, %date, error = %e, "ignoring prior record for trend");
                evaluation.warnings.push(e);
                0.0
            }
        };

        evaluation.record = Some(CompanyAggregateRecord {
            company_id,
            date,
            environmental_score: scores.environmental,
            social_score: scores.social,
            governance_score: scores.governance,
            overall_score: scores.overall,
            overall_sentiment: raw.overall,
            confidence_score: raw.confidence,
            articles_analyzed: raw.articles_analyzed,
            sentiment_trend: trend,
            risk_level: classify_risk(scores.overall),
        });

        evaluation
    }
}

/// Running tally of company outcomes for a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: CompanyOutcome) {
        match outcome {
            CompanyOutcome::Scored => self.processed += 1,
            CompanyOutcome::Skipped => self.skipped += 1,
            CompanyOutcome::Failed => self.failed += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }

    /// True when there was work and every company failed.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.failed > 0 && self.failed == self.total()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed {}, skipped {}, failed {}",
            self.processed, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
