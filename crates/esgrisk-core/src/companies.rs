use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Americas,
    Europe,
    Asia,
    #[serde(rename = "Middle East")]
    MiddleEast,
    Africa,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Americas => write!(f, "Americas"),
            Region::Europe => write!(f, "Europe"),
            Region::Asia => write!(f, "Asia"),
            Region::MiddleEast => write!(f, "Middle East"),
            Region::Africa => write!(f, "Africa"),
        }
    }
}

/// A tracked company as declared in `config/companies.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConfig {
    pub name: String,
    /// Exchange ticker, used as the stable external key (e.g. `"AAPL"`, `"0700.HK"`).
    pub ticker: String,
    pub sector: String,
    pub region: Region,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl CompanyConfig {
    /// Ticker normalized to uppercase with surrounding whitespace removed.
    #[must_use]
    pub fn normalized_ticker(&self) -> String {
        self.ticker.trim().to_uppercase()
    }
}

#[derive(Debug, Deserialize)]
pub struct CompaniesFile {
    pub companies: Vec<CompanyConfig>,
}

/// Load and validate the companies registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_companies(path: &Path) -> Result<CompaniesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let companies_file: CompaniesFile = serde_yaml::from_str(&content)?;

    validate_companies(&companies_file)?;

    Ok(companies_file)
}

fn validate_companies(companies_file: &CompaniesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_tickers = HashSet::new();

    for company in &companies_file.companies {
        if company.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "company name must be non-empty".to_string(),
            ));
        }

        let ticker = company.normalized_ticker();
        if ticker.is_empty() {
            return Err(ConfigError::Validation(format!(
                "company '{}' has an empty ticker",
                company.name
            )));
        }

        if !seen_names.insert(company.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate company name: '{}'",
                company.name
            )));
        }

        if !seen_tickers.insert(ticker.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate ticker: '{}' (from company '{}')",
                ticker, company.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "companies_test.rs"]
mod tests;
