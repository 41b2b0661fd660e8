//! Confidence-weighted aggregation of scored articles for one company.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use esgrisk_core::{EsgCategory, ScoreBasis, ScoredArticle, ScoringConfig};
use uuid::Uuid;

use crate::error::ScoringError;
use crate::scorer::validate_scored;

/// Inclusive date range `[start, end]` covered by one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EvaluationWindow {
    /// The `window_days` days ending on (and including) `date`.
    #[must_use]
    pub fn trailing(date: NaiveDate, window_days: u32) -> Self {
        let back = u64::from(window_days.saturating_sub(1));
        let start = date.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
        Self { start, end: date }
    }

    /// The window of the same length that ends the day before this one starts.
    #[must_use]
    pub fn preceding(&self) -> Self {
        let len = (self.end - self.start).num_days() + 1;
        let end = self.start.pred_opt().unwrap_or(NaiveDate::MIN);
        let back = u64::try_from(len - 1).unwrap_or(0);
        let start = end.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Sentiment-space aggregate for one company and window, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAggregate {
    pub environmental: f64,
    pub social: f64,
    pub governance: f64,
    pub overall: f64,
    pub confidence: f64,
    pub articles_analyzed: u32,
}

impl RawAggregate {
    #[must_use]
    pub fn category(&self, category: EsgCategory) -> f64 {
        match category {
            EsgCategory::Environmental => self.environmental,
            EsgCategory::Social => self.social,
            EsgCategory::Governance => self.governance,
        }
    }
}

/// Articles that qualify for a window, plus those rejected on validation.
#[derive(Debug, Default)]
pub struct WindowSelection<'a> {
    pub articles: Vec<&'a ScoredArticle>,
    pub rejected: Vec<ScoringError>,
}

/// Combines a company's scored articles into a [`RawAggregate`].
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: ScoringConfig,
}

impl Aggregator {
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidConfig`] if the config fails validation.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn window(&self, date: NaiveDate) -> EvaluationWindow {
        EvaluationWindow::trailing(date, self.config.window_days)
    }

    /// Pick the articles for `company_id` that fall inside the window ending on `date`.
    ///
    /// Only the highest version of each article counts. Articles failing range
    /// validation are returned in `rejected` instead. The result is ordered by
    /// `(published_at, article_id)` so downstream sums do not depend on input
    /// order.
    #[must_use]
    pub fn select<'a>(
        &self,
        company_id: i64,
        date: NaiveDate,
        articles: &'a [ScoredArticle],
    ) -> WindowSelection<'a> {
        let window = self.window(date);
        let mut latest: HashMap<Uuid, &'a ScoredArticle> = HashMap::new();

        for article in articles {
            if article.company_id != company_id
                || !window.contains(article.published_at.date_naive())
            {
                continue;
            }
            latest
                .entry(article.article_id)
                .and_modify(|current| {
                    if article.version > current.version {
                        *current = article;
                    }
                })
                .or_insert(article);
        }

        let mut selection = WindowSelection::default();
        for article in latest.into_values() {
            match validate_scored(article) {
                Ok(()) => selection.articles.push(article),
                Err(e) => {
                    tracing::warn!(
                        company_id,
                        article_id = %article.article_id,
                        error = %e,
                        "excluding invalid article from aggregation"
                    );
                    selection.rejected.push(e);
                }
            }
        }

        selection
            .articles
            .sort_by(|a, b| (a.published_at, a.article_id).cmp(&(b.published_at, b.article_id)));
        selection.rejected.sort_by_key(ToString::to_string);
        selection
    }

    /// Aggregate pre-selected articles.
    ///
    /// Returns `None` for an empty slice: zero evidence never yields a score.
    #[must_use]
    pub fn aggregate(&self, articles: &[&ScoredArticle]) -> Option<RawAggregate> {
        if articles.is_empty() {
            return None;
        }

        let environmental = self.category_mean(EsgCategory::Environmental, articles);
        let social = self.category_mean(EsgCategory::Social, articles);
        let governance = self.category_mean(EsgCategory::Governance, articles);
        let overall = (environmental + social + governance) / 3.0;

        #[allow(clippy::cast_precision_loss)]
        let confidence = articles.iter().map(|a| a.overall_confidence).sum::<f64>()
            / articles.len() as f64;

        Some(RawAggregate {
            environmental,
            social,
            governance,
            overall,
            confidence,
            articles_analyzed: u32::try_from(articles.len()).unwrap_or(u32::MAX),
        })
    }

    fn weight(&self, basis: ScoreBasis, confidence: f64) -> f64 {
        match basis {
            ScoreBasis::LowConfidence => confidence * self.config.low_confidence_weight,
            ScoreBasis::Model | ScoreBasis::KeywordBlend => confidence,
        }
    }

    /// `Σ(score·w) / Σ(w)`, or the plain mean when every weight is zero.
    fn category_mean(&self, category: EsgCategory, articles: &[&ScoredArticle]) -> f64 {
        let (weighted, total) = articles.iter().fold((0.0_f64, 0.0_f64), |(ws, wt), a| {
            let score = a.category(category);
            let w = self.weight(score.basis, score.confidence);
            (ws + score.sentiment * w, wt + w)
        });

        if total > 0.0 {
            return weighted / total;
        }

        tracing::debug!(
            category = %category,
            articles = articles.len(),
            "no confidence mass for category; using unweighted mean"
        );
        #[allow(clippy::cast_precision_loss)]
        let mean = articles
            .iter()
            .map(|a| a.category(category).sentiment)
            .sum::<f64>()
            / articles.len() as f64;
        mean
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
