use crate::ConfigError;

pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.5;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_LOW_CONFIDENCE_WEIGHT: f64 = 0.5;

/// Tunables shared by the scorer and aggregator.
///
/// Built once and passed by reference; nothing in the scoring path reads
/// global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Category confidence at or above this uses raw model sentiment.
    pub confidence_floor: f64,
    /// Length of the trailing evaluation window, inclusive of the evaluation date.
    pub window_days: u32,
    /// Multiplier applied to the aggregation weight of low-confidence categories.
    pub low_confidence_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            window_days: DEFAULT_WINDOW_DAYS,
            low_confidence_weight: DEFAULT_LOW_CONFIDENCE_WEIGHT,
        }
    }
}

impl ScoringConfig {
    /// Check that every field is inside its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(ConfigError::Validation(format!(
                "confidence_floor must be within [0, 1], got {}",
                self.confidence_floor
            )));
        }
        if self.window_days == 0 {
            return Err(ConfigError::Validation(
                "window_days must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_weight) {
            return Err(ConfigError::Validation(format!(
                "low_confidence_weight must be within [0, 1], got {}",
                self.low_confidence_weight
            )));
        }
        Ok(())
    }
}
