//! Period-over-period trend and risk banding.

use chrono::NaiveDate;
use esgrisk_core::{PriorRecord, RiskLevel};

use crate::error::ScoringError;

/// Scores below this are `low`.
pub const MEDIUM_RISK_FLOOR: u8 = 34;
/// Scores at or above this are `high`.
pub const HIGH_RISK_FLOOR: u8 = 67;

/// Band a normalized overall risk score.
///
/// `< 34` is low, `34..=66` medium, `>= 67` high. Fixed so that levels stay
/// comparable across companies and runs.
#[must_use]
pub fn classify_risk(overall_score: u8) -> RiskLevel {
    if overall_score < MEDIUM_RISK_FLOOR {
        RiskLevel::Low
    } else if overall_score < HIGH_RISK_FLOOR {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Change in overall sentiment versus the prior period, in sentiment space.
///
/// Returns `0.0` when there is no prior record.
///
/// # Errors
///
/// Returns [`ScoringError::InconsistentPriorRecord`] if the prior belongs to a
/// different company, is not strictly earlier than `date`, or has no usable
/// overall sentiment. Callers treat this as a zero trend plus a warning.
pub fn sentiment_trend(
    company_id: i64,
    date: NaiveDate,
    current_sentiment: f64,
    prior: Option<&PriorRecord>,
) -> Result<f64, ScoringError> {
    let Some(prior) = prior else {
        return Ok(0.0);
    };

    let inconsistent = |reason: String| ScoringError::InconsistentPriorRecord {
        company_id,
        date: prior.date,
        reason,
    };

    if prior.company_id != company_id {
        return Err(inconsistent(format!(
            "record belongs to company {}",
            prior.company_id
        )));
    }
    if prior.date >= date {
        return Err(inconsistent(format!(
            "record is not earlier than evaluation date {date}"
        )));
    }

    match prior.overall_sentiment {
        None => Err(inconsistent("overall sentiment is missing".to_string())),
        Some(previous) if !(-1.0..=1.0).contains(&previous) => Err(inconsistent(format!(
            "overall sentiment {previous} is out of range"
        ))),
        Some(previous) => Ok(current_sentiment - previous),
    }
}
