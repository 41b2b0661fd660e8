//! Scoring command handlers for the CLI.

mod query;

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use esgrisk_core::{AppConfig, CompanyAggregateRecord, ScoredArticle};
use esgrisk_scoring::{BatchReport, CompanyEvaluation, CompanyEvaluator, CompanyOutcome};
use futures::stream::{self, StreamExt};

use crate::{fail_run_best_effort, parse_date};

pub(crate) use query::{run_score_report, run_score_status};

/// Sub-commands available under `score`.
#[derive(Debug, Subcommand)]
pub enum ScoreCommands {
    /// Evaluate every active company (or one) for a date and store the records
    Run {
        /// Evaluation date, YYYY-MM-DD (defaults to today, UTC)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Restrict the run to a single company (by ticker)
        #[arg(long)]
        company: Option<String>,

        /// Evaluate and print results without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show recent company risk records
    Status {
        /// Filter to a specific company (by ticker)
        #[arg(long)]
        company: Option<String>,

        /// Maximum number of rows to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Generate a markdown report ranking companies by overall risk
    Report {
        /// Filter to a specific company (by ticker)
        #[arg(long)]
        company: Option<String>,

        /// Report date, YYYY-MM-DD (defaults to the latest scored date)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

/// Load the companies a scoring run covers.
///
/// With a `ticker` filter, that single company must exist and be active.
///
/// # Errors
///
/// Returns an error if the ticker is not found or the query fails.
pub(crate) async fn load_companies_for_scoring(
    pool: &sqlx::PgPool,
    ticker: Option<&str>,
) -> anyhow::Result<Vec<esgrisk_db::CompanyRow>> {
    if let Some(ticker) = ticker {
        let company = esgrisk_db::get_company_by_ticker(pool, ticker)
            .await?
            .ok_or_else(|| anyhow::anyhow!("company '{ticker}' not found"))?;
        Ok(vec![company])
    } else {
        Ok(esgrisk_db::list_active_companies(pool).await?)
    }
}

fn run_counts(report: &BatchReport) -> esgrisk_db::RunCounts {
    let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    esgrisk_db::RunCounts {
        processed: clamp(report.processed),
        skipped: clamp(report.skipped),
        failed: clamp(report.failed),
    }
}

/// Convert stored rows, dropping any row that cannot be read back.
///
/// An unreadable row excludes that article only, never the company.
fn readable_articles(ticker: &str, rows: &[esgrisk_db::ArticleSignalRow]) -> Vec<ScoredArticle> {
    rows.iter()
        .filter_map(|row| match row.to_scored_article() {
            Ok(article) => Some(article),
            Err(e) => {
                tracing::warn!(
                    company = %ticker,
                    article_id = %row.article_id,
                    version = row.version,
                    error = %e,
                    "unreadable article row excluded"
                );
                None
            }
        })
        .collect()
}

/// Fold per-company results into a batch tally.
///
/// An `Err` for one company counts as `Failed` and the rest are still
/// tallied. Returns the report and the records produced, in input order.
fn tally<'a>(
    results: Vec<(&'a esgrisk_db::CompanyRow, anyhow::Result<CompanyEvaluation>)>,
) -> (BatchReport, Vec<(&'a esgrisk_db::CompanyRow, CompanyAggregateRecord)>) {
    let mut report = BatchReport::default();
    let mut scored = Vec::new();

    for (company, result) in results {
        match result {
            Ok(evaluation) => {
                let outcome = evaluation.outcome();
                report.record(outcome);
                match outcome {
                    CompanyOutcome::Scored => {
                        if let Some(record) = evaluation.record {
                            tracing::info!(
                                company = %company.ticker,
                                overall = record.overall_score,
                                risk = %record.risk_level,
                                articles = record.articles_analyzed,
                                "company scored"
                            );
                            scored.push((company, record));
                        }
                    }
                    CompanyOutcome::Skipped => {
                        tracing::info!(company = %company.ticker, "no qualifying articles; skipped");
                    }
                    CompanyOutcome::Failed => {
                        tracing::error!(
                            company = %company.ticker,
                            rejected = evaluation.rejected.len(),
                            "every article in the window was invalid"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(company = %company.ticker, error = %e, "company scoring failed");
                report.record(CompanyOutcome::Failed);
            }
        }
    }

    (report, scored)
}

/// The batch as a whole fails only when every company failed.
///
/// # Errors
///
/// Returns an error naming the failure count when [`BatchReport::all_failed`].
fn ensure_not_all_failed(report: &BatchReport) -> anyhow::Result<()> {
    if report.all_failed() {
        anyhow::bail!("all {} companies failed scoring", report.failed);
    }
    Ok(())
}

/// Read, evaluate, and (unless `run_id` is `None`) store one company's record.
async fn score_company(
    pool: &sqlx::PgPool,
    evaluator: &CompanyEvaluator,
    company: &esgrisk_db::CompanyRow,
    date: NaiveDate,
    run_id: Option<i64>,
) -> anyhow::Result<CompanyEvaluation> {
    let window = evaluator.window(date);
    let rows =
        esgrisk_db::list_current_scored_articles(pool, company.id, window.start, window.end)
            .await?;
    let articles = readable_articles(&company.ticker, &rows);

    let prior_window = evaluator.prior_window(date);
    let prior = esgrisk_db::get_prior_company_score(
        pool,
        company.id,
        prior_window.start,
        prior_window.end,
    )
    .await?
    .map(|row| row.to_prior_record());

    let evaluation = evaluator.evaluate(company.id, date, &articles, prior.as_ref());

    for rejected in &evaluation.rejected {
        tracing::warn!(company = %company.ticker, error = %rejected, "article excluded from aggregate");
    }

    if let (Some(record), Some(run_id)) = (&evaluation.record, run_id) {
        esgrisk_db::upsert_company_score(pool, record, Some(run_id)).await?;
    }

    Ok(evaluation)
}

/// Evaluate all (or one) companies for `date` and persist their records.
///
/// Companies are evaluated concurrently up to `max_concurrent_companies`. A
/// company with no qualifying articles is skipped, not failed, and one
/// company's failure never stops the others. A scoring run row tracks overall
/// progress.
///
/// When `dry_run` is `true`, records are computed and printed but nothing is
/// written and no run is created.
///
/// # Errors
///
/// Returns an error if companies cannot be loaded, the run cannot be created
/// or completed, or every company failed.
#[allow(clippy::too_many_lines)]
pub(crate) async fn run_score(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    date: Option<NaiveDate>,
    ticker: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let evaluator = CompanyEvaluator::new(config.scoring)?;
    let companies = load_companies_for_scoring(pool, ticker).await?;

    if companies.is_empty() {
        println!("no active companies found; run `db seed` first");
        return Ok(());
    }

    let run_id = if dry_run {
        None
    } else {
        let run = esgrisk_db::create_scoring_run(pool, date, "cli").await?;
        if let Err(e) = esgrisk_db::start_scoring_run(pool, run.id).await {
            fail_run_best_effort(
                pool,
                run.id,
                esgrisk_db::RunCounts::default(),
                format!("{e:#}"),
            )
            .await;
            return Err(e.into());
        }
        Some(run.id)
    };

    let window = evaluator.window(date);
    tracing::info!(
        %date,
        window_start = %window.start,
        companies = companies.len(),
        dry_run,
        "scoring run started"
    );

    let max_concurrent = config.max_concurrent_companies.max(1);
    let evaluator = &evaluator;

    let results: Vec<(&esgrisk_db::CompanyRow, anyhow::Result<CompanyEvaluation>)> =
        stream::iter(&companies)
            .map(|c| {
                let fut = score_company(pool, evaluator, c, date, run_id);
                async move { (c, fut.await) }
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

    let (report, mut scored) = tally(results);

    if report.failed > 0 {
        tracing::warn!(
            failed_companies = report.failed,
            total_companies = report.total(),
            "some companies failed during scoring"
        );
    }

    if dry_run {
        scored.sort_by(|a, b| a.0.ticker.cmp(&b.0.ticker));
        println!("dry-run: {date}");
        for (company, record) in &scored {
            println!(
                "  {:<10} E={:<3} S={:<3} G={:<3} overall={:<3} {:<6} articles={} trend={:+.4}",
                company.ticker,
                record.environmental_score,
                record.social_score,
                record.governance_score,
                record.overall_score,
                record.risk_level.as_str(),
                record.articles_analyzed,
                record.sentiment_trend,
            );
        }
    }

    if let Some(run_id) = run_id {
        if let Err(err) = ensure_not_all_failed(&report) {
            fail_run_best_effort(pool, run_id, run_counts(&report), format!("{err:#}")).await;
            return Err(err);
        }

        if let Err(err) = esgrisk_db::complete_scoring_run(pool, run_id, run_counts(&report)).await
        {
            fail_run_best_effort(pool, run_id, run_counts(&report), format!("{err:#}")).await;
            return Err(err.into());
        }
    } else {
        ensure_not_all_failed(&report)?;
    }

    println!("{report}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::{Cli, Commands};

    use esgrisk_core::{CompanyAggregateRecord, RiskLevel};
    use esgrisk_scoring::{BatchReport, CompanyEvaluation, ScoringError};
    use rust_decimal::Decimal;

    use super::{ensure_not_all_failed, readable_articles, tally, ScoreCommands};

    #[test]
    fn parses_score_run_defaults() {
        let cli = Cli::try_parse_from(["esgrisk-cli", "score", "run"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Score {
                command: ScoreCommands::Run {
                    date: None,
                    company: None,
                    dry_run: false,
                }
            })
        ));
    }

    #[test]
    fn parses_score_run_with_date_and_company() {
        let cli = Cli::try_parse_from([
            "esgrisk-cli",
            "score",
            "run",
            "--date",
            "2026-03-08",
            "--company",
            "AAPL",
        ])
        .unwrap();
        let Some(Commands::Score {
            command: ScoreCommands::Run { date, company, .. },
        }) = cli.command
        else {
            panic!("expected score run");
        };
        assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2026, 3, 8));
        assert_eq!(company.as_deref(), Some("AAPL"));
    }

    #[test]
    fn rejects_malformed_date() {
        let result = Cli::try_parse_from(["esgrisk-cli", "score", "run", "--date", "03/08/2026"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_score_run_dry_run() {
        let cli = Cli::try_parse_from(["esgrisk-cli", "score", "run", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Score {
                command: ScoreCommands::Run { dry_run: true, .. }
            })
        ));
    }

    #[test]
    fn parses_score_status_default_limit() {
        let cli = Cli::try_parse_from(["esgrisk-cli", "score", "status"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Score {
                command: ScoreCommands::Status {
                    company: None,
                    limit: 20
                }
            })
        ));
    }

    #[test]
    fn parses_score_report_with_company() {
        let cli =
            Cli::try_parse_from(["esgrisk-cli", "score", "report", "--company", "XOM"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Score {
                command: ScoreCommands::Report {
                    company: Some(ref c),
                    date: None,
                }
            }) if c == "XOM"
        ));
    }

    #[test]
    fn run_counts_mirror_batch_report() {
        let mut report = esgrisk_scoring::BatchReport::default();
        report.record(esgrisk_scoring::CompanyOutcome::Scored);
        report.record(esgrisk_scoring::CompanyOutcome::Failed);
        let counts = super::run_counts(&report);
        assert_eq!(
            counts,
            esgrisk_db::RunCounts {
                processed: 1,
                skipped: 0,
                failed: 1,
            }
        );
    }

    fn company(id: i64, ticker: &str) -> esgrisk_db::CompanyRow {
        esgrisk_db::CompanyRow {
            id,
            public_id: uuid::Uuid::from_u128(id.unsigned_abs().into()),
            name: format!("{ticker} Inc."),
            ticker: ticker.to_string(),
            sector: "Energy".to_string(),
            region: "north_america".to_string(),
            industry: None,
            country: None,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    fn date() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
    }

    fn evaluation(company_id: i64, record: bool, rejected: usize) -> CompanyEvaluation {
        CompanyEvaluation {
            company_id,
            date: date(),
            record: record.then(|| CompanyAggregateRecord {
                company_id,
                date: date(),
                environmental_score: 70,
                social_score: 70,
                governance_score: 70,
                overall_score: 70,
                overall_sentiment: -0.4,
                confidence_score: 0.9,
                articles_analyzed: 2,
                sentiment_trend: 0.0,
                risk_level: RiskLevel::High,
            }),
            rejected: (0..rejected)
                .map(|i| ScoringError::InvalidSignal {
                    article_id: uuid::Uuid::from_u128(i as u128),
                    field: "overall_confidence",
                    value: 1.5,
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn one_company_error_does_not_stop_the_batch() {
        let (a, b, c, d) = (
            company(1, "AAA"),
            company(2, "BBB"),
            company(3, "CCC"),
            company(4, "DDD"),
        );
        let results = vec![
            (&a, Ok(evaluation(1, true, 0))),
            (&b, Err(anyhow::anyhow!("connection reset"))),
            (&c, Ok(evaluation(3, false, 0))),
            (&d, Ok(evaluation(4, true, 1))),
        ];

        let (report, scored) = tally(results);

        assert_eq!(
            report,
            BatchReport {
                processed: 2,
                skipped: 1,
                failed: 1,
            }
        );
        let tickers: Vec<&str> = scored.iter().map(|(c, _)| c.ticker.as_str()).collect();
        assert_eq!(tickers, ["AAA", "DDD"]);
        assert!(ensure_not_all_failed(&report).is_ok());
    }

    #[test]
    fn evaluation_with_only_invalid_articles_counts_as_failed() {
        let a = company(1, "AAA");
        let (report, scored) = tally(vec![(&a, Ok(evaluation(1, false, 2)))]);
        assert_eq!(report.failed, 1);
        assert!(scored.is_empty());
    }

    #[test]
    fn batch_fails_only_when_every_company_failed() {
        let (a, b) = (company(1, "AAA"), company(2, "BBB"));
        let results = vec![
            (&a, Err(anyhow::anyhow!("timeout"))),
            (&b, Ok(evaluation(2, false, 3))),
        ];

        let (report, scored) = tally(results);

        assert!(scored.is_empty());
        assert!(report.all_failed());
        let err = ensure_not_all_failed(&report).unwrap_err();
        assert_eq!(err.to_string(), "all 2 companies failed scoring");
    }

    #[test]
    fn all_skipped_batch_is_not_a_failure() {
        let a = company(1, "AAA");
        let (report, _) = tally(vec![(&a, Ok(evaluation(1, false, 0)))]);
        assert_eq!(report.skipped, 1);
        assert!(ensure_not_all_failed(&report).is_ok());
    }

    fn stored_row(article: u128, basis: &str) -> esgrisk_db::ArticleSignalRow {
        let dec = |s: &str| s.parse::<Decimal>().unwrap();
        esgrisk_db::ArticleSignalRow {
            id: i64::try_from(article).unwrap(),
            article_id: uuid::Uuid::from_u128(article),
            company_id: 1,
            version: 1,
            published_at: chrono::Utc::now(),
            overall_sentiment: dec("-0.500000"),
            overall_confidence: dec("0.900000"),
            environmental_sentiment: dec("-0.500000"),
            environmental_confidence: dec("0.900000"),
            social_sentiment: dec("-0.500000"),
            social_confidence: dec("0.900000"),
            governance_sentiment: dec("-0.500000"),
            governance_confidence: dec("0.900000"),
            key_themes: vec![],
            risk_indicators: vec![],
            environmental_score: dec("-0.500000"),
            environmental_basis: basis.to_string(),
            social_score: dec("-0.500000"),
            social_basis: "model".to_string(),
            governance_score: dec("-0.500000"),
            governance_basis: "model".to_string(),
            scored_confidence: dec("0.900000"),
            is_current: true,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn unreadable_row_is_excluded_and_the_rest_kept() {
        let rows = vec![
            stored_row(1, "model"),
            stored_row(2, "guesswork"),
            stored_row(3, "keyword_blend"),
        ];

        let articles = readable_articles("AAA", &rows);

        let ids: Vec<u128> = articles.iter().map(|a| a.article_id.as_u128()).collect();
        assert_eq!(ids, [1, 3]);
    }
}
