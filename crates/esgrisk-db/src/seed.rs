use esgrisk_core::CompanyConfig;
use sqlx::PgPool;

use crate::DbError;

/// Upsert companies from the registry into the database, keyed by ticker.
///
/// Returns the number of companies processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back. Seeding a company also reactivates it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_companies(pool: &PgPool, companies: &[CompanyConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for company in companies {
        let ticker = company.normalized_ticker();
        let region = company.region.to_string();

        sqlx::query(
            "INSERT INTO companies (name, ticker, sector, region, industry, country, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, true) \
             ON CONFLICT (ticker) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 sector = EXCLUDED.sector, \
                 region = EXCLUDED.region, \
                 industry = EXCLUDED.industry, \
                 country = EXCLUDED.country, \
                 is_active = true, \
                 deleted_at = NULL, \
                 updated_at = NOW()",
        )
        .bind(&company.name)
        .bind(&ticker)
        .bind(&company.sector)
        .bind(&region)
        .bind(&company.industry)
        .bind(&company.country)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    tracing::debug!(count, "companies seeded");
    Ok(count)
}
