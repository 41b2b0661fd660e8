//! ESG scoring and risk aggregation.
//!
//! Finalizes per-article `(E, S, G)` sentiment (blending keyword evidence into
//! low-confidence categories), aggregates a company's articles over a trailing
//! window, normalizes the result onto a 0..=100 risk scale, and classifies it
//! into a risk band with a period-over-period trend.
//!
//! Everything here is pure computation; storage and scheduling live in
//! `esgrisk-db` and `esgrisk-cli`.

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod polarity;
pub mod scorer;
pub mod taxonomy;
pub mod trend;

pub use aggregate::{Aggregator, EvaluationWindow, RawAggregate, WindowSelection};
pub use error::ScoringError;
pub use normalize::{risk_score, RiskScores};
pub use pipeline::{BatchReport, CompanyEvaluation, CompanyEvaluator, CompanyOutcome};
pub use polarity::polarity_around;
pub use scorer::{keyword_bias, score_category, ArticleScorer};
pub use taxonomy::{KeywordTaxonomy, TaxonomyEntry};
pub use trend::{classify_risk, sentiment_trend};
