use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+(?:-\w+)*").expect("valid regex");
}

/// Tokenize text into lowercase words using NFC normalization.
///
/// Internal hyphens are kept, so `chrono-environnement` is a single token.
/// Apostrophes split words: `l'innovation` yields `l` and `innovation`.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfc().collect::<String>().to_lowercase();
    WORD.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_hyphenated_words() {
        let t = tokenize("Le Chrono-Environnement, à Besançon!");
        assert_eq!(t, vec!["le", "chrono-environnement", "à", "besançon"]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ?! ").is_empty());
    }
}
