//! Live integration tests for esgrisk-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/esgrisk-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use esgrisk_core::{
    ArticleSignal, CategoryScore, CategorySignal, CompanyAggregateRecord, CompanyConfig, Region,
    RiskLevel, ScoreBasis, ScoredArticle,
};
use esgrisk_db::{
    complete_scoring_run, create_scoring_run, fail_scoring_run, get_company_by_ticker,
    get_prior_company_score, get_scoring_run, insert_article_signal, latest_score_date,
    list_active_companies, list_article_versions, list_company_scores,
    list_current_scored_articles, list_scores_for_date, seed_companies, start_scoring_run,
    upsert_company_score, DbError, RunCounts,
};
use rust_decimal::Decimal;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn at(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, hour, 0, 0).unwrap()
}

fn company(name: &str, ticker: &str) -> CompanyConfig {
    CompanyConfig {
        name: name.to_string(),
        ticker: ticker.to_string(),
        sector: "Technology".to_string(),
        region: Region::Americas,
        industry: None,
        country: Some("United States".to_string()),
    }
}

/// Seed one company and return its generated `id`.
async fn seed_one(pool: &sqlx::PgPool, ticker: &str) -> i64 {
    seed_companies(pool, &[company(&format!("Company {ticker}"), ticker)])
        .await
        .expect("seed_companies failed");
    get_company_by_ticker(pool, ticker)
        .await
        .expect("get_company_by_ticker failed")
        .unwrap_or_else(|| panic!("company '{ticker}' missing after seed"))
        .id
}

fn signal(company_id: i64, id: u128, version: i32, published_at: DateTime<Utc>) -> ArticleSignal {
    ArticleSignal {
        article_id: Uuid::from_u128(id),
        company_id,
        published_at,
        version,
        overall_sentiment: -0.3,
        overall_confidence: 0.8,
        environmental: CategorySignal::new(-0.3, 0.8),
        social: CategorySignal::new(0.1, 0.7),
        governance: CategorySignal::new(0.0, 0.2),
        key_themes: vec!["emissions".to_string()],
        risk_indicators: vec!["regulatory fine".to_string()],
    }
}

fn scored(signal: &ArticleSignal) -> ScoredArticle {
    let model = |c: CategorySignal| CategoryScore {
        sentiment: c.sentiment,
        confidence: c.confidence,
        basis: ScoreBasis::Model,
    };
    ScoredArticle {
        article_id: signal.article_id,
        company_id: signal.company_id,
        published_at: signal.published_at,
        version: signal.version,
        environmental: model(signal.environmental),
        social: model(signal.social),
        governance: CategoryScore {
            sentiment: signal.governance.sentiment,
            confidence: signal.governance.confidence,
            basis: ScoreBasis::LowConfidence,
        },
        overall_confidence: signal.overall_confidence,
    }
}

async fn store(pool: &sqlx::PgPool, signal: &ArticleSignal) {
    insert_article_signal(pool, signal, &scored(signal))
        .await
        .expect("insert_article_signal failed");
}

fn record(company_id: i64, date: NaiveDate, overall_score: u8) -> CompanyAggregateRecord {
    CompanyAggregateRecord {
        company_id,
        date,
        environmental_score: overall_score,
        social_score: overall_score,
        governance_score: overall_score,
        overall_score,
        overall_sentiment: 1.0 - f64::from(overall_score) / 50.0,
        confidence_score: 0.75,
        articles_analyzed: 3,
        sentiment_trend: 0.0,
        risk_level: RiskLevel::Medium,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Scoring run lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scoring_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let run = create_scoring_run(&pool, day(8), "cli")
        .await
        .expect("create_scoring_run failed");

    assert_eq!(run.status, "queued");
    assert_eq!(run.score_date, day(8));
    assert!(run.started_at.is_none());

    start_scoring_run(&pool, run.id)
        .await
        .expect("start_scoring_run failed");

    let counts = RunCounts {
        processed: 5,
        skipped: 2,
        failed: 1,
    };
    complete_scoring_run(&pool, run.id, counts)
        .await
        .expect("complete_scoring_run failed");

    let fetched = get_scoring_run(&pool, run.id)
        .await
        .expect("get_scoring_run failed");

    assert_eq!(fetched.status, "succeeded");
    assert!(fetched.started_at.is_some());
    assert!(fetched.completed_at.is_some());
    assert_eq!(fetched.companies_processed, 5);
    assert_eq!(fetched.companies_skipped, 2);
    assert_eq!(fetched.companies_failed, 1);
    assert!(fetched.error_message.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn scoring_run_lifecycle_queued_to_failed(pool: sqlx::PgPool) {
    let run = create_scoring_run(&pool, day(8), "cli")
        .await
        .expect("create_scoring_run failed");
    start_scoring_run(&pool, run.id)
        .await
        .expect("start_scoring_run failed");

    let counts = RunCounts {
        processed: 0,
        skipped: 0,
        failed: 3,
    };
    fail_scoring_run(&pool, run.id, "all 3 companies failed", counts)
        .await
        .expect("fail_scoring_run failed");

    let fetched = get_scoring_run(&pool, run.id)
        .await
        .expect("get_scoring_run failed");
    assert_eq!(fetched.status, "failed");
    assert_eq!(
        fetched.error_message.as_deref(),
        Some("all 3 companies failed")
    );
    assert_eq!(fetched.companies_failed, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn scoring_run_cannot_complete_directly_from_queued(pool: sqlx::PgPool) {
    let run = create_scoring_run(&pool, day(8), "cli")
        .await
        .expect("create_scoring_run failed");

    let err = complete_scoring_run(&pool, run.id, RunCounts::default())
        .await
        .expect_err("completing a queued run should fail");

    assert!(matches!(
        err,
        DbError::InvalidScoringRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_scoring_run_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let err = get_scoring_run(&pool, 999_999)
        .await
        .expect_err("unknown run should not be found");
    assert!(matches!(err, DbError::NotFound));
}

// ---------------------------------------------------------------------------
// Section 2: Companies
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_companies_is_idempotent(pool: sqlx::PgPool) {
    let companies = vec![company("Apple Inc.", "aapl"), company("Microsoft", "MSFT")];

    let first = seed_companies(&pool, &companies).await.unwrap();
    let second = seed_companies(&pool, &companies).await.unwrap();
    assert_eq!(first, 2);
    assert_eq!(second, 2);

    let active = list_active_companies(&pool).await.unwrap();
    let tickers: Vec<&str> = active.iter().map(|c| c.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["AAPL", "MSFT"]);
    assert_eq!(active[0].region, "Americas");
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_company_by_ticker_is_case_insensitive(pool: sqlx::PgPool) {
    seed_one(&pool, "TSLA").await;

    let found = get_company_by_ticker(&pool, " tsla ").await.unwrap();
    assert_eq!(found.map(|c| c.ticker), Some("TSLA".to_string()));
    assert!(get_company_by_ticker(&pool, "NOPE").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_active_companies_excludes_inactive(pool: sqlx::PgPool) {
    let id = seed_one(&pool, "XOM").await;
    seed_one(&pool, "CVX").await;

    sqlx::query("UPDATE companies SET is_active = false WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let active = list_active_companies(&pool).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].ticker, "CVX");
}

// ---------------------------------------------------------------------------
// Section 3: Article signals
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn article_signal_round_trips_finalized_scores(pool: sqlx::PgPool) {
    let company_id = seed_one(&pool, "AAPL").await;
    let s = signal(company_id, 1, 1, at(5, 10));
    store(&pool, &s).await;

    let rows = list_current_scored_articles(&pool, company_id, day(2), day(8))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key_themes, vec!["emissions".to_string()]);
    assert_eq!(rows[0].risk_indicators, vec!["regulatory fine".to_string()]);

    let article = rows[0].to_scored_article().unwrap();
    let expected = scored(&s);
    assert_eq!(article.article_id, expected.article_id);
    assert_eq!(article.published_at, expected.published_at);
    assert_eq!(article.governance.basis, ScoreBasis::LowConfidence);
    assert!((article.environmental.sentiment - expected.environmental.sentiment).abs() < 1e-9);
    assert!((article.social.confidence - expected.social.confidence).abs() < 1e-9);
    assert!((article.overall_confidence - expected.overall_confidence).abs() < 1e-9);
}

#[sqlx::test(migrations = "../../migrations")]
async fn newer_version_supersedes_older(pool: sqlx::PgPool) {
    let company_id = seed_one(&pool, "AAPL").await;
    store(&pool, &signal(company_id, 1, 1, at(5, 10))).await;
    let mut v2 = signal(company_id, 1, 2, at(5, 10));
    v2.environmental = CategorySignal::new(0.6, 0.9);
    store(&pool, &v2).await;

    let rows = list_current_scored_articles(&pool, company_id, day(2), day(8))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].version, 2);

    let versions = list_article_versions(&pool, Uuid::from_u128(1)).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions[0].is_current);
    assert!(!versions[1].is_current);
}

#[sqlx::test(migrations = "../../migrations")]
async fn late_older_version_does_not_displace_newer(pool: sqlx::PgPool) {
    let company_id = seed_one(&pool, "AAPL").await;
    store(&pool, &signal(company_id, 1, 3, at(5, 10))).await;
    store(&pool, &signal(company_id, 1, 1, at(5, 10))).await;

    let rows = list_current_scored_articles(&pool, company_id, day(2), day(8))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].version, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn window_bounds_are_inclusive_utc_dates(pool: sqlx::PgPool) {
    let company_id = seed_one(&pool, "AAPL").await;
    store(&pool, &signal(company_id, 1, 1, Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap())).await;
    store(&pool, &signal(company_id, 2, 1, at(2, 0))).await;
    store(&pool, &signal(company_id, 3, 1, Utc.with_ymd_and_hms(2026, 3, 8, 23, 59, 59).unwrap())).await;
    store(&pool, &signal(company_id, 4, 1, at(9, 0))).await;

    let rows = list_current_scored_articles(&pool, company_id, day(2), day(8))
        .await
        .unwrap();
    let ids: Vec<u128> = rows.iter().map(|r| r.article_id.as_u128()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn window_query_is_scoped_to_company(pool: sqlx::PgPool) {
    let a = seed_one(&pool, "AAPL").await;
    let b = seed_one(&pool, "MSFT").await;
    store(&pool, &signal(a, 1, 1, at(5, 0))).await;
    store(&pool, &signal(b, 2, 1, at(5, 0))).await;

    let rows = list_current_scored_articles(&pool, a, day(2), day(8))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].company_id, a);
}

// ---------------------------------------------------------------------------
// Section 4: Company aggregate records
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_company_score_keeps_one_record_per_date(pool: sqlx::PgPool) {
    let company_id = seed_one(&pool, "AAPL").await;

    let first = upsert_company_score(&pool, &record(company_id, day(8), 40), None)
        .await
        .unwrap();
    let second = upsert_company_score(&pool, &record(company_id, day(8), 70), None)
        .await
        .unwrap();
    assert_eq!(first, second);

    let rows = list_company_scores(&pool, Some(company_id), 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].overall_score, Decimal::from(70));
    assert_eq!(rows[0].ticker, "AAPL");
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_company_score_links_scoring_run(pool: sqlx::PgPool) {
    let company_id = seed_one(&pool, "AAPL").await;
    let run = create_scoring_run(&pool, day(8), "cli").await.unwrap();

    upsert_company_score(&pool, &record(company_id, day(8), 40), Some(run.id))
        .await
        .unwrap();

    let row = get_prior_company_score(&pool, company_id, day(8), day(8))
        .await
        .unwrap()
        .expect("record should exist");
    assert_eq!(row.scoring_run_id, Some(run.id));
    assert_eq!(row.risk_level, "medium");
}

#[sqlx::test(migrations = "../../migrations")]
async fn prior_lookup_returns_latest_in_range(pool: sqlx::PgPool) {
    let company_id = seed_one(&pool, "AAPL").await;
    for (d, score) in [(1, 30), (4, 45), (9, 80)] {
        upsert_company_score(&pool, &record(company_id, day(d), score), None)
            .await
            .unwrap();
    }

    let prior = get_prior_company_score(&pool, company_id, day(1), day(7))
        .await
        .unwrap()
        .expect("prior should exist");
    assert_eq!(prior.score_date, day(4));

    let as_prior = prior.to_prior_record();
    assert!((as_prior.overall_sentiment.unwrap() - 0.1).abs() < 1e-9);

    let none = get_prior_company_score(&pool, company_id, day(20), day(26))
        .await
        .unwrap();
    assert!(none.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn scores_for_date_rank_by_overall_risk(pool: sqlx::PgPool) {
    let a = seed_one(&pool, "AAPL").await;
    let b = seed_one(&pool, "XOM").await;
    let c = seed_one(&pool, "MSFT").await;
    upsert_company_score(&pool, &record(a, day(8), 20), None).await.unwrap();
    upsert_company_score(&pool, &record(b, day(8), 85), None).await.unwrap();
    upsert_company_score(&pool, &record(c, day(7), 99), None).await.unwrap();

    let latest = latest_score_date(&pool, None).await.unwrap();
    assert_eq!(latest, Some(day(8)));

    let rows = list_scores_for_date(&pool, day(8), None).await.unwrap();
    let tickers: Vec<&str> = rows.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["XOM", "AAPL"]);

    let only_msft = latest_score_date(&pool, Some(c)).await.unwrap();
    assert_eq!(only_msft, Some(day(7)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn latest_score_date_is_none_when_empty(pool: sqlx::PgPool) {
    assert!(latest_score_date(&pool, None).await.unwrap().is_none());
}
