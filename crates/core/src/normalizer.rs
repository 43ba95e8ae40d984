//! Maps a free-form recognized utterance onto one of a question's fixed
//! answer options, or reports that nothing matched confidently enough.

use std::collections::HashMap;

/// Minimum similarity an option must reach to be accepted as a match.
///
/// Below this the caller is expected to re-prompt rather than silently
/// score a low-confidence guess.
pub const MATCH_THRESHOLD: f64 = 0.7;

/// An option resolved from an utterance, with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOption {
    /// Index of the option in the question's presentation order.
    pub index: usize,
    /// The option text as presented (original casing).
    pub option: String,
    /// Similarity in [0, 1] between the normalized utterance and option.
    pub score: f64,
}

/// Bidirectional bigram-overlap (Dice) coefficient between two strings.
///
/// Both inputs are lowercased and stripped of whitespace before bigram
/// extraction. Equal normalized strings score 1.0; strings too short to
/// hold a bigram score 0.0 unless equal.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }
    if a.chars().count() < 2 || b.chars().count() < 2 {
        return 0.0;
    }

    let a_bigrams = bigram_counts(&a);
    let b_bigrams = bigram_counts(&b);
    let total: usize = a_bigrams.values().sum::<usize>() + b_bigrams.values().sum::<usize>();

    let mut shared = 0usize;
    for (bigram, count) in &a_bigrams {
        if let Some(other) = b_bigrams.get(bigram) {
            shared += count.min(other);
        }
    }

    // total >= 2 here since both strings hold at least one bigram
    (2 * shared) as f64 / total as f64
}

/// Resolves an utterance to the best-matching option, if any clears the
/// acceptance threshold.
///
/// Ties are broken by first occurrence in option order, so duplicate
/// options resolve to the earliest copy. An empty utterance never matches.
/// Pure function of its inputs.
#[must_use]
pub fn resolve_utterance<S: AsRef<str>>(utterance: &str, options: &[S]) -> Option<ResolvedOption> {
    if utterance.trim().is_empty() {
        return None;
    }

    let mut best: Option<ResolvedOption> = None;
    for (index, option) in options.iter().enumerate() {
        let score = similarity(utterance, option.as_ref());
        let beats_current = best.as_ref().is_none_or(|b| score > b.score);
        if beats_current {
            best = Some(ResolvedOption {
                index,
                option: option.as_ref().to_string(),
                score,
            });
        }
    }

    best.filter(|b| b.score >= MATCH_THRESHOLD)
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn bigram_counts(s: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
