//! Weighted ESG keyword lexicon and text matching.

use std::collections::HashSet;
use std::path::Path;

use esgrisk_core::{EsgCategory, KeywordMatch};
use regex::Regex;
use serde::Deserialize;

use crate::error::ScoringError;
use crate::polarity::polarity_around;

/// Built-in lexicon: `(keyword, category, salience weight)`.
const DEFAULT_LEXICON: &[(&str, EsgCategory, f64)] = &[
    ("climate change", EsgCategory::Environmental, 1.0),
    ("carbon emissions", EsgCategory::Environmental, 1.0),
    ("greenhouse gas", EsgCategory::Environmental, 0.9),
    ("renewable energy", EsgCategory::Environmental, 0.8),
    ("sustainability", EsgCategory::Environmental, 0.6),
    ("pollution", EsgCategory::Environmental, 1.0),
    ("waste management", EsgCategory::Environmental, 0.7),
    ("water usage", EsgCategory::Environmental, 0.6),
    ("biodiversity", EsgCategory::Environmental, 0.7),
    ("environmental compliance", EsgCategory::Environmental, 0.8),
    ("green technology", EsgCategory::Environmental, 0.5),
    ("emissions", EsgCategory::Environmental, 0.8),
    ("oil spill", EsgCategory::Environmental, 1.0),
    ("labor practices", EsgCategory::Social, 0.9),
    ("human rights", EsgCategory::Social, 1.0),
    ("employee satisfaction", EsgCategory::Social, 0.6),
    ("diversity", EsgCategory::Social, 0.6),
    ("inclusion", EsgCategory::Social, 0.6),
    ("community relations", EsgCategory::Social, 0.5),
    ("product safety", EsgCategory::Social, 0.9),
    ("customer privacy", EsgCategory::Social, 0.8),
    ("supply chain", EsgCategory::Social, 0.6),
    ("workplace safety", EsgCategory::Social, 0.9),
    ("social responsibility", EsgCategory::Social, 0.5),
    ("child labor", EsgCategory::Social, 1.0),
    ("board independence", EsgCategory::Governance, 0.8),
    ("executive compensation", EsgCategory::Governance, 0.7),
    ("shareholder rights", EsgCategory::Governance, 0.7),
    ("anti-corruption", EsgCategory::Governance, 0.9),
    ("transparency", EsgCategory::Governance, 0.6),
    ("audit", EsgCategory::Governance, 0.7),
    ("risk management", EsgCategory::Governance, 0.6),
    ("corporate governance", EsgCategory::Governance, 0.8),
    ("compliance", EsgCategory::Governance, 0.6),
    ("ethics", EsgCategory::Governance, 0.6),
    ("accountability", EsgCategory::Governance, 0.6),
    ("insider trading", EsgCategory::Governance, 1.0),
];

/// One lexicon entry as it appears in a taxonomy override file.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyEntry {
    pub keyword: String,
    pub category: EsgCategory,
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    keywords: Vec<TaxonomyEntry>,
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    entry: TaxonomyEntry,
    pattern: Regex,
}

/// Static weighted lexicon mapping terms to an ESG category.
#[derive(Debug, Clone)]
pub struct KeywordTaxonomy {
    entries: Vec<CompiledEntry>,
}

impl Default for KeywordTaxonomy {
    fn default() -> Self {
        let entries = DEFAULT_LEXICON
            .iter()
            .map(|&(keyword, category, weight)| TaxonomyEntry {
                keyword: keyword.to_string(),
                category,
                weight,
            })
            .collect();
        // Checked by `default_lexicon_compiles_every_entry`.
        Self::from_entries(entries).unwrap_or_else(|e| {
            tracing::error!(error = %e, "built-in taxonomy failed to compile");
            Self {
                entries: Vec::new(),
            }
        })
    }
}

impl KeywordTaxonomy {
    /// Build a taxonomy from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::TaxonomyValidation`] if a keyword is empty, a
    /// weight is outside `(0, 1]`, or a keyword repeats within a category.
    pub fn from_entries(entries: Vec<TaxonomyEntry>) -> Result<Self, ScoringError> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(entries.len());

        for entry in entries {
            let keyword = entry.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(ScoringError::TaxonomyValidation(
                    "keyword must be non-empty".to_string(),
                ));
            }
            if !(entry.weight > 0.0 && entry.weight <= 1.0) {
                return Err(ScoringError::TaxonomyValidation(format!(
                    "keyword '{keyword}' has weight {} outside (0, 1]",
                    entry.weight
                )));
            }
            if !seen.insert((entry.category, keyword.clone())) {
                return Err(ScoringError::TaxonomyValidation(format!(
                    "duplicate keyword '{keyword}' in category {}",
                    entry.category
                )));
            }

            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&keyword)))
                .map_err(|e| ScoringError::TaxonomyValidation(e.to_string()))?;

            compiled.push(CompiledEntry {
                entry: TaxonomyEntry { keyword, ..entry },
                pattern,
            });
        }

        Ok(Self { entries: compiled })
    }

    /// Parse a taxonomy from YAML of the form `keywords: [{keyword, category, weight}]`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::TaxonomyParse`] on malformed YAML, or a
    /// validation error from [`KeywordTaxonomy::from_entries`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScoringError> {
        let file: TaxonomyFile = serde_yaml::from_str(yaml)?;
        Self::from_entries(file.keywords)
    }

    /// Load a taxonomy override file.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::TaxonomyIo`] if the file cannot be read, or any
    /// error from [`KeywordTaxonomy::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScoringError::TaxonomyIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find every lexicon keyword present in `text`.
    ///
    /// Matching is whole-word and case-insensitive. Each keyword yields at most
    /// one match, in lexicon order. Polarity is the mean of the default
    /// heuristic over every occurrence of the keyword.
    #[must_use]
    pub fn match_keywords(&self, text: &str) -> Vec<KeywordMatch> {
        let mut matches = Vec::new();

        for CompiledEntry { entry, pattern } in &self.entries {
            let polarities: Vec<f64> = pattern
                .find_iter(text)
                .map(|m| polarity_around(text, m.start(), m.end()))
                .collect();
            if polarities.is_empty() {
                continue;
            }

            #[allow(clippy::cast_precision_loss)]
            let polarity = polarities.iter().sum::<f64>() / polarities.len() as f64;

            tracing::trace!(keyword = %entry.keyword, category = %entry.category, polarity, "keyword matched");

            matches.push(KeywordMatch {
                keyword: entry.keyword.clone(),
                category: entry.category,
                weight: entry.weight,
                polarity,
            });
        }

        matches
    }
}
