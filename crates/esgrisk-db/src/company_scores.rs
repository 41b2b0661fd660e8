//! Database operations for the `company_esg_scores` table.

use chrono::{DateTime, NaiveDate, Utc};
use esgrisk_core::{CompanyAggregateRecord, PriorRecord};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::numeric::{to_decimal, to_f64, AGGREGATE_SCALE};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `company_esg_scores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyScoreRow {
    pub id: i64,
    pub company_id: i64,
    pub score_date: NaiveDate,
    pub environmental_score: Decimal,
    pub social_score: Decimal,
    pub governance_score: Decimal,
    pub overall_score: Decimal,
    pub overall_sentiment: Option<Decimal>,
    pub confidence_score: Decimal,
    pub articles_analyzed: i32,
    pub sentiment_trend: Decimal,
    pub risk_level: String,
    pub scoring_run_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyScoreRow {
    /// The fields trend computation needs from a stored record.
    ///
    /// Unreadable values come back as `None` (or NaN) and are rejected by the
    /// trend check rather than here.
    #[must_use]
    pub fn to_prior_record(&self) -> PriorRecord {
        PriorRecord {
            company_id: self.company_id,
            date: self.score_date,
            overall_sentiment: self.overall_sentiment.map(to_f64),
        }
    }
}

/// A score joined with its company, for status tables and reports.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyScoreSummaryRow {
    pub company_id: i64,
    pub ticker: String,
    pub name: String,
    pub sector: String,
    pub score_date: NaiveDate,
    pub environmental_score: Decimal,
    pub social_score: Decimal,
    pub governance_score: Decimal,
    pub overall_score: Decimal,
    pub confidence_score: Decimal,
    pub articles_analyzed: i32,
    pub sentiment_trend: Decimal,
    pub risk_level: String,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert or replace the record for `(company_id, date)`.
///
/// Re-running a date overwrites the previous record, so at most one record
/// exists per company per date. Returns the row id.
///
/// # Errors
///
/// Returns [`DbError::NonFiniteValue`] if a float cannot be stored, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_company_score(
    pool: &PgPool,
    record: &CompanyAggregateRecord,
    scoring_run_id: Option<i64>,
) -> Result<i64, DbError> {
    let dec = |field: &'static str, value: f64| to_decimal(field, value, AGGREGATE_SCALE);
    let articles_analyzed = i32::try_from(record.articles_analyzed).unwrap_or(i32::MAX);

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO company_esg_scores ( \
             company_id, score_date, environmental_score, social_score, governance_score, \
             overall_score, overall_sentiment, confidence_score, articles_analyzed, \
             sentiment_trend, risk_level, scoring_run_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (company_id, score_date) DO UPDATE SET \
             environmental_score = EXCLUDED.environmental_score, \
             social_score = EXCLUDED.social_score, \
             governance_score = EXCLUDED.governance_score, \
             overall_score = EXCLUDED.overall_score, \
             overall_sentiment = EXCLUDED.overall_sentiment, \
             confidence_score = EXCLUDED.confidence_score, \
             articles_analyzed = EXCLUDED.articles_analyzed, \
             sentiment_trend = EXCLUDED.sentiment_trend, \
             risk_level = EXCLUDED.risk_level, \
             scoring_run_id = EXCLUDED.scoring_run_id, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(record.company_id)
    .bind(record.date)
    .bind(Decimal::from(record.environmental_score))
    .bind(Decimal::from(record.social_score))
    .bind(Decimal::from(record.governance_score))
    .bind(Decimal::from(record.overall_score))
    .bind(dec("overall_sentiment", record.overall_sentiment)?)
    .bind(dec("confidence_score", record.confidence_score)?)
    .bind(articles_analyzed)
    .bind(dec("sentiment_trend", record.sentiment_trend)?)
    .bind(record.risk_level.as_str())
    .bind(scoring_run_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns the most recent record for a company dated within `[start, end]`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_prior_company_score(
    pool: &PgPool,
    company_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Option<CompanyScoreRow>, DbError> {
    let row = sqlx::query_as::<_, CompanyScoreRow>(
        "SELECT id, company_id, score_date, environmental_score, social_score, \
                governance_score, overall_score, overall_sentiment, confidence_score, \
                articles_analyzed, sentiment_trend, risk_level, scoring_run_id, \
                created_at, updated_at \
         FROM company_esg_scores \
         WHERE company_id = $1 AND score_date BETWEEN $2 AND $3 \
         ORDER BY score_date DESC \
         LIMIT 1",
    )
    .bind(company_id)
    .bind(start)
    .bind(end)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List recent records, optionally filtered by company.
///
/// Results are ordered by `score_date DESC` then ticker.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_company_scores(
    pool: &PgPool,
    company_id: Option<i64>,
    limit: i64,
) -> Result<Vec<CompanyScoreSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyScoreSummaryRow>(
        "SELECT s.company_id, c.ticker, c.name, c.sector, s.score_date, \
                s.environmental_score, s.social_score, s.governance_score, s.overall_score, \
                s.confidence_score, s.articles_analyzed, s.sentiment_trend, s.risk_level \
         FROM company_esg_scores s \
         JOIN companies c ON c.id = s.company_id \
         WHERE ($1::BIGINT IS NULL OR s.company_id = $1) \
         ORDER BY s.score_date DESC, c.ticker \
         LIMIT $2",
    )
    .bind(company_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All records for one date, highest overall risk first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scores_for_date(
    pool: &PgPool,
    date: NaiveDate,
    company_id: Option<i64>,
) -> Result<Vec<CompanyScoreSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyScoreSummaryRow>(
        "SELECT s.company_id, c.ticker, c.name, c.sector, s.score_date, \
                s.environmental_score, s.social_score, s.governance_score, s.overall_score, \
                s.confidence_score, s.articles_analyzed, s.sentiment_trend, s.risk_level \
         FROM company_esg_scores s \
         JOIN companies c ON c.id = s.company_id \
         WHERE s.score_date = $1 AND ($2::BIGINT IS NULL OR s.company_id = $2) \
         ORDER BY s.overall_score DESC, c.ticker",
    )
    .bind(date)
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The most recent date with any stored record, optionally for one company.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_score_date(
    pool: &PgPool,
    company_id: Option<i64>,
) -> Result<Option<NaiveDate>, DbError> {
    let date: Option<NaiveDate> = sqlx::query_scalar(
        "SELECT MAX(score_date) FROM company_esg_scores \
         WHERE ($1::BIGINT IS NULL OR company_id = $1)",
    )
    .bind(company_id)
    .fetch_one(pool)
    .await?;

    Ok(date)
}
