//! Database operations for the `article_signals` table.
//!
//! Each row is one analysis version of an article: the raw model output plus
//! the finalized category scores computed when it was ingested. Only the
//! highest version of an article is flagged `is_current`.

use chrono::{DateTime, NaiveDate, Utc};
use esgrisk_core::{ArticleSignal, CategoryScore, ScoreBasis, ScoredArticle};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::numeric::{to_decimal, to_f64, SIGNAL_SCALE};
use crate::DbError;

const ARTICLE_SIGNAL_COLUMNS: &str = "id, article_id, company_id, version, published_at, \
     overall_sentiment, overall_confidence, \
     environmental_sentiment, environmental_confidence, \
     social_sentiment, social_confidence, \
     governance_sentiment, governance_confidence, \
     key_themes, risk_indicators, \
     environmental_score, environmental_basis, \
     social_score, social_basis, \
     governance_score, governance_basis, \
     scored_confidence, is_current, created_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `article_signals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleSignalRow {
    pub id: i64,
    pub article_id: Uuid,
    pub company_id: i64,
    pub version: i32,
    pub published_at: DateTime<Utc>,
    pub overall_sentiment: Decimal,
    pub overall_confidence: Decimal,
    pub environmental_sentiment: Decimal,
    pub environmental_confidence: Decimal,
    pub social_sentiment: Decimal,
    pub social_confidence: Decimal,
    pub governance_sentiment: Decimal,
    pub governance_confidence: Decimal,
    pub key_themes: Vec<String>,
    pub risk_indicators: Vec<String>,
    pub environmental_score: Decimal,
    pub environmental_basis: String,
    pub social_score: Decimal,
    pub social_basis: String,
    pub governance_score: Decimal,
    pub governance_basis: String,
    pub scored_confidence: Decimal,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}

impl ArticleSignalRow {
    /// Rebuild the finalized article the aggregator consumes.
    ///
    /// Finalized confidence equals the raw category confidence on every path,
    /// so it is read from the raw columns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if a stored basis is not recognized.
    pub fn to_scored_article(&self) -> Result<ScoredArticle, DbError> {
        Ok(ScoredArticle {
            article_id: self.article_id,
            company_id: self.company_id,
            published_at: self.published_at,
            version: self.version,
            environmental: category_score(
                "environmental_basis",
                self.environmental_score,
                self.environmental_confidence,
                &self.environmental_basis,
            )?,
            social: category_score(
                "social_basis",
                self.social_score,
                self.social_confidence,
                &self.social_basis,
            )?,
            governance: category_score(
                "governance_basis",
                self.governance_score,
                self.governance_confidence,
                &self.governance_basis,
            )?,
            overall_confidence: to_f64(self.scored_confidence),
        })
    }
}

fn category_score(
    column: &'static str,
    sentiment: Decimal,
    confidence: Decimal,
    basis: &str,
) -> Result<CategoryScore, DbError> {
    let basis = basis
        .parse::<ScoreBasis>()
        .map_err(|_| DbError::InvalidColumn {
            column,
            value: basis.to_string(),
        })?;
    Ok(CategoryScore {
        sentiment: to_f64(sentiment),
        confidence: to_f64(confidence),
        basis,
    })
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Store one analysis version of an article together with its finalized scores.
///
/// Re-importing the same `(article_id, version)` overwrites that row. After the
/// write, only the highest stored version of the article stays current, so an
/// older version arriving late never displaces a newer one.
///
/// Returns the row id.
///
/// # Errors
///
/// Returns [`DbError::NonFiniteValue`] if a value cannot be represented, or
/// [`DbError::Sqlx`] if the transaction fails.
pub async fn insert_article_signal(
    pool: &PgPool,
    signal: &ArticleSignal,
    scored: &ScoredArticle,
) -> Result<i64, DbError> {
    let dec = |field: &'static str, value: f64| to_decimal(field, value, SIGNAL_SCALE);

    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO article_signals ( \
             article_id, company_id, version, published_at, \
             overall_sentiment, overall_confidence, \
             environmental_sentiment, environmental_confidence, \
             social_sentiment, social_confidence, \
             governance_sentiment, governance_confidence, \
             key_themes, risk_indicators, \
             environmental_score, environmental_basis, \
             social_score, social_basis, \
             governance_score, governance_basis, \
             scored_confidence) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                 $15, $16, $17, $18, $19, $20, $21) \
         ON CONFLICT (article_id, version) DO UPDATE SET \
             company_id = EXCLUDED.company_id, \
             published_at = EXCLUDED.published_at, \
             overall_sentiment = EXCLUDED.overall_sentiment, \
             overall_confidence = EXCLUDED.overall_confidence, \
             environmental_sentiment = EXCLUDED.environmental_sentiment, \
             environmental_confidence = EXCLUDED.environmental_confidence, \
             social_sentiment = EXCLUDED.social_sentiment, \
             social_confidence = EXCLUDED.social_confidence, \
             governance_sentiment = EXCLUDED.governance_sentiment, \
             governance_confidence = EXCLUDED.governance_confidence, \
             key_themes = EXCLUDED.key_themes, \
             risk_indicators = EXCLUDED.risk_indicators, \
             environmental_score = EXCLUDED.environmental_score, \
             environmental_basis = EXCLUDED.environmental_basis, \
             social_score = EXCLUDED.social_score, \
             social_basis = EXCLUDED.social_basis, \
             governance_score = EXCLUDED.governance_score, \
             governance_basis = EXCLUDED.governance_basis, \
             scored_confidence = EXCLUDED.scored_confidence \
         RETURNING id",
    )
    .bind(signal.article_id)
    .bind(signal.company_id)
    .bind(signal.version)
    .bind(signal.published_at)
    .bind(dec("overall_sentiment", signal.overall_sentiment)?)
    .bind(dec("overall_confidence", signal.overall_confidence)?)
    .bind(dec("environmental_sentiment", signal.environmental.sentiment)?)
    .bind(dec("environmental_confidence", signal.environmental.confidence)?)
    .bind(dec("social_sentiment", signal.social.sentiment)?)
    .bind(dec("social_confidence", signal.social.confidence)?)
    .bind(dec("governance_sentiment", signal.governance.sentiment)?)
    .bind(dec("governance_confidence", signal.governance.confidence)?)
    .bind(&signal.key_themes)
    .bind(&signal.risk_indicators)
    .bind(dec("environmental_score", scored.environmental.sentiment)?)
    .bind(scored.environmental.basis.as_str())
    .bind(dec("social_score", scored.social.sentiment)?)
    .bind(scored.social.basis.as_str())
    .bind(dec("governance_score", scored.governance.sentiment)?)
    .bind(scored.governance.basis.as_str())
    .bind(dec("scored_confidence", scored.overall_confidence)?)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE article_signals \
         SET is_current = (version = ( \
             SELECT MAX(version) FROM article_signals WHERE article_id = $1)) \
         WHERE article_id = $1",
    )
    .bind(signal.article_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

/// Returns the current version of every article for a company published
/// within `[start, end]` (UTC calendar dates, inclusive).
///
/// Ordered by `published_at` then `article_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_current_scored_articles(
    pool: &PgPool,
    company_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ArticleSignalRow>, DbError> {
    let sql = format!(
        "SELECT {ARTICLE_SIGNAL_COLUMNS} \
         FROM article_signals \
         WHERE company_id = $1 \
           AND is_current \
           AND published_at >= ($2::date AT TIME ZONE 'UTC') \
           AND published_at < (($3::date + 1) AT TIME ZONE 'UTC') \
         ORDER BY published_at, article_id"
    );

    let rows = sqlx::query_as::<_, ArticleSignalRow>(&sql)
        .bind(company_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns every stored version of an article, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_article_versions(
    pool: &PgPool,
    article_id: Uuid,
) -> Result<Vec<ArticleSignalRow>, DbError> {
    let sql = format!(
        "SELECT {ARTICLE_SIGNAL_COLUMNS} \
         FROM article_signals \
         WHERE article_id = $1 \
         ORDER BY version DESC"
    );

    let rows = sqlx::query_as::<_, ArticleSignalRow>(&sql)
        .bind(article_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
