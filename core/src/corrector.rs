//! Spelling correction against the lexicon.
//!
//! Each token is replaced by its lemma when the lexicon knows it. Otherwise
//! the lexicon entry with the highest prefix proximity is used, ties being
//! broken by Levenshtein distance and then by lexicon order.

use crate::config::CorrectionParams;
use crate::lexicon::{Lexicon, LexiconEntry};
use crate::tokenizer::tokenize;

/// Percentage of shared leading characters relative to the longer word.
///
/// Returns 0 when either word is shorter than `min_len`, when the lengths
/// differ by more than `max_len_diff`, or when the score is below
/// `proximity_threshold`. Lengths are counted in characters.
pub fn prefix_proximity(a: &str, b: &str, params: &CorrectionParams) -> f64 {
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    if len_a < params.min_len || len_b < params.min_len {
        return 0.0;
    }
    if len_a.abs_diff(len_b) > params.max_len_diff {
        return 0.0;
    }
    let common = a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count();
    let longest = len_a.max(len_b);
    if longest == 0 {
        return 0.0;
    }
    let proximity = common as f64 / longest as f64 * 100.0;
    if proximity >= params.proximity_threshold { proximity } else { 0.0 }
}

/// Levenshtein distance with unit insert/delete/substitute costs.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let substitution = prev[j - 1] + usize::from(a[i - 1] != b[j - 1]);
            curr[j] = substitution.min(prev[j] + 1).min(curr[j - 1] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Outcome of correcting a single token.
#[derive(Debug, Clone, PartialEq)]
pub enum Correction {
    /// The token is a known surface form.
    Exact { lemma: String },
    /// The token was matched to the closest lexicon entry.
    Fuzzy { candidate: String, lemma: String, proximity: f64 },
    /// No lexicon entry was close enough; the token is kept.
    Unchanged,
}

pub struct SpellingCorrector<'a> {
    lexicon: &'a Lexicon,
    params: CorrectionParams,
}

impl<'a> SpellingCorrector<'a> {
    pub fn new(lexicon: &'a Lexicon, params: CorrectionParams) -> Self {
        Self { lexicon, params }
    }

    pub fn correct_token(&self, token: &str) -> Correction {
        if let Some(lemma) = self.lexicon.lemma(token) {
            return Correction::Exact { lemma: lemma.to_string() };
        }

        let candidates: Vec<(&LexiconEntry, f64)> = self
            .lexicon
            .entries()
            .map(|entry| (entry, prefix_proximity(token, &entry.surface, &self.params)))
            .filter(|(_, p)| *p > 0.0)
            .collect();
        let Some(best) = candidates.iter().map(|(_, p)| *p).reduce(f64::max) else {
            tracing::warn!(token, "no correction candidate");
            return Correction::Unchanged;
        };

        let tied: Vec<&LexiconEntry> = candidates
            .iter()
            .filter(|(_, p)| *p == best)
            .map(|(e, _)| *e)
            .collect();
        let chosen = if tied.len() == 1 {
            tied[0]
        } else {
            // min_by_key keeps the first minimum, i.e. lexicon order
            match tied.iter().min_by_key(|e| levenshtein(token, &e.surface)) {
                Some(e) => *e,
                None => return Correction::Unchanged,
            }
        };
        let lemma = self.lexicon.lemma(&chosen.surface).unwrap_or(&chosen.lemma).to_string();
        tracing::debug!(token, candidate = %chosen.surface, %lemma, proximity = best, "corrected");
        Correction::Fuzzy { candidate: chosen.surface.clone(), lemma, proximity: best }
    }

    /// Correct every token of `text` and join the results with single spaces.
    pub fn correct(&self, text: &str) -> String {
        tokenize(text)
            .into_iter()
            .map(|token| match self.correct_token(&token) {
                Correction::Exact { lemma } | Correction::Fuzzy { lemma, .. } => lemma,
                Correction::Unchanged => token,
            })
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Free-function form used where the caller holds the thresholds separately.
pub fn correct(text: &str, lexicon: &Lexicon, params: &CorrectionParams) -> String {
    SpellingCorrector::new(lexicon, *params).correct(text)
}
