//! Default polarity heuristic for keyword matches.
//!
//! Used only when the caller has no upstream polarity for a match. Scores the
//! words surrounding a keyword with a small ESG-news lexicon.

/// Number of words on each side of a match that count toward its polarity.
pub const CONTEXT_WORDS: usize = 6;

/// ESG-news word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final polarity is clamped to `[-1.0, 1.0]`.
pub(crate) const POLARITY_LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("improved", 0.4),
    ("improving", 0.4),
    ("improvement", 0.4),
    ("commitment", 0.3),
    ("committed", 0.3),
    ("award", 0.5),
    ("awarded", 0.5),
    ("praised", 0.5),
    ("leader", 0.4),
    ("leading", 0.3),
    ("reduced", 0.4),
    ("reduction", 0.3),
    ("invest", 0.3),
    ("investment", 0.3),
    ("achieved", 0.4),
    ("transparent", 0.4),
    ("progress", 0.4),
    ("certified", 0.4),
    ("neutral", 0.2),
    ("strong", 0.3),
    // Negative signals
    ("violation", -0.6),
    ("violations", -0.6),
    ("fine", -0.5),
    ("fined", -0.6),
    ("penalty", -0.6),
    ("lawsuit", -0.5),
    ("sued", -0.5),
    ("investigation", -0.5),
    ("scandal", -0.7),
    ("controversy", -0.5),
    ("spill", -0.7),
    ("leak", -0.6),
    ("contamination", -0.7),
    ("breach", -0.6),
    ("fraud", -0.8),
    ("bribery", -0.8),
    ("corruption", -0.8),
    ("accident", -0.6),
    ("protest", -0.4),
    ("boycott", -0.5),
    ("failed", -0.4),
    ("failure", -0.4),
    ("criticism", -0.4),
    ("criticized", -0.4),
    ("misconduct", -0.7),
    ("exploitation", -0.7),
];

fn word_weight(word: &str) -> Option<f64> {
    let w = word
        .trim_matches(|c: char| !c.is_alphabetic())
        .to_lowercase();
    POLARITY_LEXICON
        .iter()
        .find(|&&(lex_word, _)| lex_word == w)
        .map(|&(_, weight)| weight)
}

/// Score a run of words using the polarity lexicon.
///
/// Sums matching weights and clamps the result to `[-1.0, 1.0]`. Returns
/// `0.0` when no word is in the lexicon.
#[must_use]
pub fn lexicon_polarity<'a, I>(words: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    words
        .into_iter()
        .filter_map(word_weight)
        .sum::<f64>()
        .clamp(-1.0, 1.0)
}

/// Polarity of the words around the byte range `start..end` of `text`.
///
/// Looks at up to [`CONTEXT_WORDS`] words before and after the range; the
/// matched span itself is not scored.
#[must_use]
pub fn polarity_around(text: &str, start: usize, end: usize) -> f64 {
    let before = text.get(..start).unwrap_or_default();
    let after = text.get(end..).unwrap_or_default();

    let preceding: Vec<&str> = before.split_whitespace().collect();
    let skip = preceding.len().saturating_sub(CONTEXT_WORDS);

    lexicon_polarity(
        preceding[skip..]
            .iter()
            .copied()
            .chain(after.split_whitespace().take(CONTEXT_WORDS)),
    )
}
