use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// A numeric field is outside its contractual range. The article is
    /// excluded, never clamped.
    #[error("invalid signal for article {article_id}: {field} = {value} is out of range")]
    InvalidSignal {
        article_id: Uuid,
        field: &'static str,
        value: f64,
    },

    /// The prior period's record cannot support a trend.
    #[error("inconsistent prior record for company {company_id} on {date}: {reason}")]
    InconsistentPriorRecord {
        company_id: i64,
        date: NaiveDate,
        reason: String,
    },

    #[error("invalid scoring config: {0}")]
    InvalidConfig(#[from] esgrisk_core::ConfigError),

    #[error("failed to read taxonomy {path}: {source}")]
    TaxonomyIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse taxonomy YAML: {0}")]
    TaxonomyParse(#[from] serde_yaml::Error),

    #[error("invalid taxonomy: {0}")]
    TaxonomyValidation(String),
}
