//! Bulletin sections (rubriques).
//!
//! Queries name sections after stop-word removal, so the recognized phrases
//! are the stripped forms (`direct laboratoires` for "En direct des
//! laboratoires"), including frequent spelling variants. Each phrase maps to
//! the label stored in the index.

use crate::error::{EngineError, Result};
use lazy_static::lazy_static;
use regex::Regex;

/// Recognized phrase → canonical index label, in matching order.
const SECTIONS: &[(&str, &str)] = &[
    ("focus", "focus"),
    ("au coeur regions", "au coeur des régions"),
    ("evenement", "evénement"),
    ("événement", "evénement"),
    ("evénement", "evénement"),
    ("évènement", "evénement"),
    ("direct laboratoires", "en direct des laboratoires"),
    ("direct labos", "en direct des labos"),
    ("a lire", "a lire"),
    ("horizon enseignement", "horizon enseignement"),
    ("horizons enseignement", "horizons enseignement"),
    ("horizons formation enseignement", "horizon formation enseignement"),
    ("horizon formation", "horizon formation"),
    ("actualités innovations", "actualités innovations"),
    ("actualités innovation", "actualités innovation"),
    ("actualité innovation", "actualité innovation"),
    ("côté pôles", "du côté des pôles"),
];

lazy_static! {
    static ref SECTION_PATTERNS: Vec<(&'static str, Regex)> = SECTIONS
        .iter()
        .map(|(phrase, _)| (*phrase, Regex::new(&format!(r"\b{}\b", regex::escape(phrase))).expect("valid regex")))
        .collect();
    static ref SECTION_OR_SECTION: Regex = {
        let any = SECTIONS.iter().map(|(p, _)| regex::escape(p)).collect::<Vec<_>>().join("|");
        Regex::new(&format!(r"\b({any})\s+ou\s+({any})\b")).expect("valid regex")
    };
}

/// Index label of a recognized section phrase.
pub fn canonical_section(phrase: &str) -> Result<&'static str> {
    SECTIONS
        .iter()
        .find(|(p, _)| *p == phrase)
        .map(|(_, label)| *label)
        .ok_or_else(|| EngineError::UnknownSection(phrase.to_string()))
}

/// Pull every recognized section out of `text`.
///
/// `A ou B` between two sections is first reduced to `A B` so both are kept;
/// the disjunction is implicit in the union computed at retrieval time.
pub fn extract_sections(text: &str) -> (Vec<String>, String) {
    let mut rest = SECTION_OR_SECTION.replace_all(&text.to_lowercase(), "$1 $2").into_owned();
    let mut found = Vec::new();
    for (phrase, re) in SECTION_PATTERNS.iter() {
        if re.is_match(&rest) {
            found.push(phrase.to_string());
            rest = re.replace_all(&rest, "").into_owned();
        }
    }
    let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    (found, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_phrase_has_a_label() {
        for (phrase, _) in SECTIONS {
            assert!(canonical_section(phrase).is_ok());
        }
        assert!(matches!(canonical_section("sport"), Err(EngineError::UnknownSection(_))));
    }

    #[test]
    fn variants_collapse_to_one_label() {
        assert_eq!(canonical_section("évènement").unwrap(), "evénement");
        assert_eq!(canonical_section("evenement").unwrap(), "evénement");
    }

    #[test]
    fn disjunction_keeps_both_sections() {
        let (found, rest) = extract_sections("direct laboratoires ou focus médecine");
        assert_eq!(found, vec!["focus", "direct laboratoires"]);
        assert_eq!(rest, "médecine");
    }

    #[test]
    fn whole_phrases_only() {
        let (found, rest) = extract_sections("horizons enseignement systèmes embarqués");
        assert_eq!(found, vec!["horizons enseignement"]);
        assert_eq!(rest, "systèmes embarqués");

        let (found, _) = extract_sections("focusing");
        assert!(found.is_empty());
    }
}
