//! Database operations for `scoring_runs`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `scoring_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoringRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub score_date: NaiveDate,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub companies_processed: i32,
    pub companies_skipped: i32,
    pub companies_failed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-company outcome totals written when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub processed: i32,
    pub skipped: i32,
    pub failed: i32,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Creates a new scoring run for `score_date` in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scoring_run(
    pool: &PgPool,
    score_date: NaiveDate,
    trigger_source: &str,
) -> Result<ScoringRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScoringRunRow>(
        "INSERT INTO scoring_runs (public_id, score_date, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING id, public_id, score_date, trigger_source, status, started_at, \
                   completed_at, companies_processed, companies_skipped, companies_failed, \
                   error_message, created_at",
    )
    .bind(public_id)
    .bind(score_date)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScoringRunTransition`] if the run is not queued,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_scoring_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scoring_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScoringRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records its outcome counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidScoringRunTransition`] if the run is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scoring_run(pool: &PgPool, id: i64, counts: RunCounts) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scoring_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             companies_processed = $1, companies_skipped = $2, companies_failed = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(counts.processed)
    .bind(counts.skipped)
    .bind(counts.failed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScoringRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed` with an error message and whatever counts were reached.
///
/// # Errors
///
/// Returns [`DbError::InvalidScoringRunTransition`] if the run is not running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scoring_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
    counts: RunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scoring_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1, \
             companies_processed = $2, companies_skipped = $3, companies_failed = $4 \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(error_message)
    .bind(counts.processed)
    .bind(counts.skipped)
    .bind(counts.failed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScoringRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_scoring_run(pool: &PgPool, id: i64) -> Result<ScoringRunRow, DbError> {
    let row = sqlx::query_as::<_, ScoringRunRow>(
        "SELECT id, public_id, score_date, trigger_source, status, started_at, \
                completed_at, companies_processed, companies_skipped, companies_failed, \
                error_message, created_at \
         FROM scoring_runs \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
