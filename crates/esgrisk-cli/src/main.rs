mod score;
mod signals;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use score::ScoreCommands;
use signals::SignalsCommands;

#[derive(Debug, Parser)]
#[command(name = "esgrisk-cli")]
#[command(about = "ESG scoring and risk aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Ingest analyzed article signals
    Signals {
        #[command(subcommand)]
        command: SignalsCommands,
    },
    /// Compute and inspect company ESG risk scores
    Score {
        #[command(subcommand)]
        command: ScoreCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert companies from the registry file
    Seed,
}

/// Parse a `YYYY-MM-DD` argument.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("esgrisk-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = esgrisk_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(?config, "configuration loaded");

    let pool = esgrisk_db::connect_pool(
        &config.database_url,
        esgrisk_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match command {
        Commands::Db { command } => run_db_command(&pool, &config, command).await,
        Commands::Signals { command } => match command {
            SignalsCommands::Import { path, dry_run } => {
                signals::run_signals_import(&pool, &config, &path, dry_run).await
            }
        },
        Commands::Score { command } => match command {
            ScoreCommands::Run {
                date,
                company,
                dry_run,
            } => score::run_score(&pool, &config, date, company.as_deref(), dry_run).await,
            ScoreCommands::Status { company, limit } => {
                score::run_score_status(&pool, company.as_deref(), limit).await
            }
            ScoreCommands::Report { company, date } => {
                score::run_score_report(&pool, company.as_deref(), date).await
            }
        },
    }
}

async fn run_db_command(
    pool: &sqlx::PgPool,
    config: &esgrisk_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            esgrisk_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = esgrisk_db::run_migrations(pool).await?;
            println!("applied {applied} migrations");
        }
        DbCommands::Seed => {
            let registry = esgrisk_core::load_companies(&config.companies_path)?;
            let count = esgrisk_db::seed_companies(pool, &registry.companies).await?;
            tracing::info!(count, path = %config.companies_path.display(), "companies seeded");
            println!("seeded {count} companies");
        }
    }
    Ok(())
}

/// Attempt to mark a scoring run as failed, logging any secondary error.
async fn fail_run_best_effort(
    pool: &sqlx::PgPool,
    run_id: i64,
    counts: esgrisk_db::RunCounts,
    message: String,
) {
    if let Err(mark_err) = esgrisk_db::fail_scoring_run(pool, run_id, &message, counts).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark scoring run as failed"
        );
    }
}
