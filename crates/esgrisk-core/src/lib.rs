//! Shared domain types and configuration for the ESG risk scoring workspace.

pub mod app_config;
pub mod companies;
pub mod config;
pub mod records;
pub mod scoring_config;
pub mod signals;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use companies::{load_companies, CompaniesFile, CompanyConfig, Region};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{CompanyAggregateRecord, PriorRecord, RiskLevel};
pub use scoring_config::ScoringConfig;
pub use signals::{
    ArticleSignal, CategoryScore, CategorySignal, EsgCategory, KeywordMatch, ScoreBasis,
    ScoredArticle,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown ESG category: {0}")]
    UnknownCategory(String),

    #[error("unknown risk level: {0}")]
    UnknownRiskLevel(String),

    #[error("unknown score basis: {0}")]
    UnknownScoreBasis(String),
}
