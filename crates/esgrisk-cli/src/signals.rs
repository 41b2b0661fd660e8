//! `signals import`: score analyzed articles on arrival and persist them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Subcommand;
use esgrisk_core::{AppConfig, ArticleSignal, CategorySignal, KeywordMatch};
use esgrisk_scoring::{ArticleScorer, KeywordTaxonomy};
use serde::Deserialize;
use uuid::Uuid;

/// Sub-commands available under `signals`.
#[derive(Debug, Subcommand)]
pub enum SignalsCommands {
    /// Import article signals from a JSON-lines file
    Import {
        /// Path to the JSON-lines file, one analyzed article per line
        path: PathBuf,

        /// Score and validate without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

/// One line of an import file.
///
/// Companies are referenced by ticker. Keyword evidence comes from either an
/// explicit `keyword_matches` list or, failing that, the taxonomy run over
/// `text`.
#[derive(Debug, Deserialize)]
pub(crate) struct ImportedSignal {
    pub article_id: Uuid,
    pub ticker: String,
    pub published_at: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: i32,
    pub overall_sentiment: f64,
    pub overall_confidence: f64,
    pub environmental: CategorySignal,
    pub social: CategorySignal,
    pub governance: CategorySignal,
    #[serde(default)]
    pub key_themes: Vec<String>,
    #[serde(default)]
    pub risk_indicators: Vec<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub keyword_matches: Option<Vec<KeywordMatch>>,
}

fn default_version() -> i32 {
    1
}

impl ImportedSignal {
    fn into_parts(self, company_id: i64) -> (ArticleSignal, Option<String>, Option<Vec<KeywordMatch>>) {
        let signal = ArticleSignal {
            article_id: self.article_id,
            company_id,
            published_at: self.published_at,
            version: self.version,
            overall_sentiment: self.overall_sentiment,
            overall_confidence: self.overall_confidence,
            environmental: self.environmental,
            social: self.social,
            governance: self.governance,
            key_themes: self.key_themes,
            risk_indicators: self.risk_indicators,
        };
        (signal, self.text, self.keyword_matches)
    }
}

/// Tally for one import file.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub imported: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "imported {}, rejected {}, failed {}",
            self.imported, self.rejected, self.failed
        )
    }
}

fn load_taxonomy(config: &AppConfig) -> anyhow::Result<KeywordTaxonomy> {
    match &config.taxonomy_path {
        Some(path) => {
            let taxonomy = KeywordTaxonomy::load(path)?;
            tracing::info!(path = %path.display(), keywords = taxonomy.len(), "loaded keyword taxonomy");
            Ok(taxonomy)
        }
        None => Ok(KeywordTaxonomy::default()),
    }
}

/// Parse one non-empty line of an import file.
pub(crate) fn parse_line(line: &str) -> Result<ImportedSignal, serde_json::Error> {
    serde_json::from_str(line)
}

/// Import, score, and persist every signal in a JSON-lines file.
///
/// Malformed lines, unknown tickers, and out-of-range values are reported and
/// skipped; they never abort the import. Storage errors count as failures.
///
/// # Errors
///
/// Returns an error if the file or taxonomy cannot be read, the scoring
/// config is invalid, or the company list cannot be loaded.
pub(crate) async fn run_signals_import(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    path: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
    let scorer = ArticleScorer::new(config.scoring)?;
    let taxonomy = load_taxonomy(config)?;

    let companies: HashMap<String, i64> = esgrisk_db::list_active_companies(pool)
        .await?
        .into_iter()
        .map(|c| (c.ticker, c.id))
        .collect();

    let mut summary = ImportSummary::default();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let imported = match parse_line(line) {
            Ok(imported) => imported,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "malformed signal line");
                summary.rejected += 1;
                continue;
            }
        };

        let ticker = imported.ticker.trim().to_uppercase();
        let Some(&company_id) = companies.get(&ticker) else {
            tracing::warn!(line = line_no, %ticker, "unknown or inactive company");
            summary.rejected += 1;
            continue;
        };

        let (signal, text, explicit_matches) = imported.into_parts(company_id);
        let matches = match (explicit_matches, text) {
            (Some(matches), _) => matches,
            (None, Some(text)) => taxonomy.match_keywords(&text),
            (None, None) => Vec::new(),
        };

        let scored = match scorer.score(&signal, &matches) {
            Ok(scored) => scored,
            Err(e) => {
                tracing::warn!(line = line_no, article_id = %signal.article_id, error = %e, "signal rejected");
                summary.rejected += 1;
                continue;
            }
        };

        if dry_run {
            summary.imported += 1;
            continue;
        }

        match esgrisk_db::insert_article_signal(pool, &signal, &scored).await {
            Ok(_) => {
                tracing::debug!(
                    article_id = %signal.article_id,
                    version = signal.version,
                    company = %ticker,
                    keyword_matches = matches.len(),
                    "signal stored"
                );
                summary.imported += 1;
            }
            Err(e) => {
                tracing::error!(article_id = %signal.article_id, error = %e, "failed to store signal");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        imported = summary.imported,
        rejected = summary.rejected,
        failed = summary.failed,
        dry_run,
        "signal import finished"
    );
    println!("{summary}");
    Ok(())
}
