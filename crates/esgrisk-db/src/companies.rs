//! Database operations for the `companies` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `companies` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub ticker: String,
    pub sector: String,
    pub region: String,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active, non-deleted companies, ordered by ticker.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_companies(pool: &PgPool) -> Result<Vec<CompanyRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyRow>(
        "SELECT id, public_id, name, ticker, sector, region, industry, country, \
                is_active, created_at, updated_at, deleted_at \
         FROM companies \
         WHERE is_active = true AND deleted_at IS NULL \
         ORDER BY ticker",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single active, non-deleted company by ticker, or `None` if not found.
///
/// The ticker is matched case-insensitively.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_company_by_ticker(
    pool: &PgPool,
    ticker: &str,
) -> Result<Option<CompanyRow>, DbError> {
    let row = sqlx::query_as::<_, CompanyRow>(
        "SELECT id, public_id, name, ticker, sector, region, industry, country, \
                is_active, created_at, updated_at, deleted_at \
         FROM companies \
         WHERE ticker = UPPER(TRIM($1)) AND is_active = true AND deleted_at IS NULL",
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
