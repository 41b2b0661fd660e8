//! Read-only score query handlers.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

async fn resolve_company_id(
    pool: &sqlx::PgPool,
    ticker: Option<&str>,
) -> anyhow::Result<Option<i64>> {
    let Some(ticker) = ticker else {
        return Ok(None);
    };
    let company = esgrisk_db::get_company_by_ticker(pool, ticker)
        .await?
        .ok_or_else(|| anyhow::anyhow!("company '{ticker}' not found"))?;
    Ok(Some(company.id))
}

/// Risk scores are stored as `NUMERIC(5,2)` but always hold whole numbers.
fn whole(d: Decimal) -> Decimal {
    d.round().normalize()
}

/// Show recent company risk records as a table.
///
/// # Errors
///
/// Returns an error if the ticker is unknown or the query fails.
pub(crate) async fn run_score_status(
    pool: &sqlx::PgPool,
    ticker: Option<&str>,
    limit: i64,
) -> anyhow::Result<()> {
    let company_id = resolve_company_id(pool, ticker).await?;
    let rows = esgrisk_db::list_company_scores(pool, company_id, limit).await?;

    if rows.is_empty() {
        println!(
            "no risk records found{}; run `score run` first",
            ticker
                .map(|t| format!(" for company '{t}'"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{:<10}{:<12}{:<5}{:<5}{:<5}{:<9}{:<8}{:<10}{:<9}TREND",
        "TICKER", "DATE", "E", "S", "G", "OVERALL", "RISK", "ARTICLES", "CONF"
    );
    for row in &rows {
        println!(
            "{:<10}{:<12}{:<5}{:<5}{:<5}{:<9}{:<8}{:<10}{:<9}{}",
            row.ticker,
            row.score_date.to_string(),
            whole(row.environmental_score).to_string(),
            whole(row.social_score).to_string(),
            whole(row.governance_score).to_string(),
            whole(row.overall_score).to_string(),
            row.risk_level,
            row.articles_analyzed,
            row.confidence_score.to_string(),
            row.sentiment_trend
        );
    }

    Ok(())
}

/// Generate a markdown report ranking companies by overall risk for one date.
///
/// Defaults to the most recent date that has any records.
///
/// # Errors
///
/// Returns an error if the ticker is unknown or the query fails.
pub(crate) async fn run_score_report(
    pool: &sqlx::PgPool,
    ticker: Option<&str>,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let company_id = resolve_company_id(pool, ticker).await?;

    let date = match date {
        Some(d) => d,
        None => match esgrisk_db::latest_score_date(pool, company_id).await? {
            Some(d) => d,
            None => {
                println!("no risk data to report; run `score run` first");
                return Ok(());
            }
        },
    };

    let rows = esgrisk_db::list_scores_for_date(pool, date, company_id).await?;
    if rows.is_empty() {
        println!("no risk records for {date}");
        return Ok(());
    }

    let now = Utc::now().format("%Y-%m-%d %H:%M UTC");
    let filter_label = ticker.unwrap_or("All companies");
    let high = rows.iter().filter(|r| r.risk_level == "high").count();

    println!("# ESG Risk Report");
    println!();
    println!("**Generated**: {now}");
    println!("**Score date**: {date}");
    println!("**Filter**: {filter_label}");
    println!("**Companies**: {} ({high} high risk)", rows.len());
    println!();
    println!("---");
    println!();
    println!("| Rank | Company | Ticker | Sector | E | S | G | Overall | Risk | Articles | Trend |");
    println!("|------|---------|--------|--------|---|---|---|---------|------|----------|-------|");

    for (rank, row) in rows.iter().enumerate() {
        println!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            rank + 1,
            row.name,
            row.ticker,
            row.sector,
            whole(row.environmental_score),
            whole(row.social_score),
            whole(row.governance_score),
            whole(row.overall_score),
            row.risk_level,
            row.articles_analyzed,
            row.sentiment_trend
        );
    }

    Ok(())
}
