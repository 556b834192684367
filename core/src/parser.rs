//! Natural-language query parsing.
//!
//! [`parse_query`] runs a fixed sequence of passes. Each pass takes the
//! working text, pulls out what it recognizes and hands the remainder to the
//! next one:
//!
//! 1. `soit ... soit` becomes a disjunction (`ou`)
//! 2. stop words and punctuation are removed
//! 3. doc-type (`articles`, `bulletins`, `rubriques`)
//! 4. sections
//! 5. dates
//! 6. title (`titre X`, `titre « X »`, `X titre`)
//! 7. content (`contenu X`)
//! 8. image filter (`images`, `sans image`)
//! 9. keywords, with `pas X` negations and `ou` markers

use crate::dates::extract_dates;
use crate::query::{DocType, ImageFilter, Keyword, StructuredQuery};
use crate::sections::extract_sections;
use crate::tokenizer::tokenize;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "je","j","aimerais","non","mentionnent","propos","fois","d","terme","cité","parus","avec","date",
            "est-il","le","évoque","voudrais","impliquant","portant","traite","évoquent","publiés","évoquant",
            "datent","qui","qu","contenant","datés","provenant","possédant","en","mot","contennant","concernent",
            "traitant","contiennent","mentionnant","contient","que","est","ne","n","mais","parlent","parlant",
            "portent","porte","liés","de","trouve-t-on","ont","été","pour","du","dont","quels","quel","donc",
            "avoir","sont","la","un","une","liste","projet","les","afficher","obtenir","voir","veux","donner",
            "chercher","nous","souhaitons","des","souhaite","cherche","rechercher","recherches","écrits","dans",
            "quelles","quelle","tout","tous","toutes","l","souhaites","mots","lister","trouver","listez-moi",
            "retournez","retourner","parle","sur","à","s","c","t",
        ];
        words.iter().copied().collect()
    };
    static ref SOIT: Regex = Regex::new(r"(?i)\bsoit\b").expect("valid regex");
    static ref QUOTED_TITLE: Regex = Regex::new(r#"\btitre\s+["«'](.+?)["»']"#).expect("valid regex");
    static ref TITLE_THEN_WORD: Regex = Regex::new(r#"\btitre\s+["«']?\s*(\w[\w-]*)"#).expect("valid regex");
    static ref WORD_THEN_TITLE: Regex = Regex::new(r"\b(\w+)\s+titre\b").expect("valid regex");
    static ref CONTENT: Regex = Regex::new(r"\bcontenu\s+(\S+)").expect("valid regex");
    static ref NO_IMAGE: Regex = Regex::new(r"\bsans\s+images?\b").expect("valid regex");
    static ref IMAGE: Regex = Regex::new(r"\bimages?\b").expect("valid regex");
    static ref CONTRACTION: Regex = Regex::new(r"(?i)\b(d|l|qu|n|s|c|j|t)'").expect("valid regex");
}

/// Filler words allowed between `pas` and the negated keyword.
const FILLER_AFTER_PAS: &[&str] = &["de", "du", "des", "d", "la", "le", "les", "l"];

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn `soit A, soit B` into `A, ou B`.
///
/// Only applies when `soit` occurs at least twice: the first occurrence is
/// dropped and the following ones become `ou`.
pub fn normalize_soit(query: &str) -> String {
    if SOIT.find_iter(query).count() < 2 {
        return query.to_string();
    }
    let without_first = SOIT.replace(query, "");
    SOIT.replace_all(&without_first, "ou").into_owned()
}

/// Lowercase, split elisions, strip ASCII punctuation except `-`, and drop
/// stop words. Running it twice gives the same text.
pub fn clean_query(query: &str) -> String {
    let normalized = query.replace('’', "'").replace('\'', " ' ").to_lowercase();
    let words: Vec<String> = normalized
        .split_whitespace()
        .map(|w| w.chars().filter(|c| !c.is_ascii_punctuation() || *c == '-').collect::<String>())
        .filter(|w| !w.is_empty())
        .collect();
    let mut kept: Vec<&str> = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        // "à" is filler except in the date connector "à partir"
        let starts_connector = word == "à" && words.get(i + 1).map(String::as_str) == Some("partir");
        if starts_connector || !STOP_WORDS.contains(word.as_str()) {
            kept.push(word);
        }
    }
    kept.join(" ")
}

/// The first word picks the doc-type when it names one; otherwise the default
/// applies and nothing is consumed. Later doc-type words are dropped.
pub fn extract_doc_type(text: &str) -> (DocType, String) {
    let mut words = text.split_whitespace().peekable();
    let doc_type = match words.peek().and_then(|w| DocType::from_word(w)) {
        Some(t) => {
            words.next();
            t
        }
        None => DocType::Article,
    };
    let rest: Vec<&str> = words.filter(|w| DocType::from_word(w).is_none()).collect();
    (doc_type, rest.join(" "))
}

pub fn extract_title(text: &str) -> (Option<String>, String) {
    for re in [&*QUOTED_TITLE, &*TITLE_THEN_WORD, &*WORD_THEN_TITLE] {
        if let Some(c) = re.captures(text) {
            let title = c[1].trim().to_string();
            let span = c.get(0).map(|m| m.range()).unwrap_or_default();
            let rest = format!("{} {}", &text[..span.start], &text[span.end..]);
            return (Some(title).filter(|t| !t.is_empty()), squash(&rest));
        }
    }
    (None, squash(text))
}

pub fn extract_content(text: &str) -> (Option<String>, String) {
    match CONTENT.captures(text) {
        Some(c) => {
            let content = c[1].to_string();
            (Some(content), squash(&CONTENT.replace(text, "")))
        }
        None => (None, squash(text)),
    }
}

pub fn extract_image(text: &str) -> (Option<ImageFilter>, String) {
    if NO_IMAGE.is_match(text) {
        (Some(ImageFilter::Absent), squash(&NO_IMAGE.replace_all(text, "")))
    } else if IMAGE.is_match(text) {
        (Some(ImageFilter::Present), squash(&IMAGE.replace_all(text, "")))
    } else {
        (None, squash(text))
    }
}

/// Split the remaining text into keywords.
///
/// `pas`, optionally followed by articles (`de`, `la`, ...), negates the next
/// word; a trailing `pas` is dropped. A bare `ou` is kept as a marker.
pub fn extract_keywords(text: &str) -> Vec<Keyword> {
    let text = text.replace('’', "'");
    let text = CONTRACTION.replace_all(&text, "$1 ");
    let words = tokenize(&text);
    let mut keywords = Vec::new();
    let mut i = 0;
    while i < words.len() {
        match words[i].as_str() {
            "pas" => {
                let mut j = i + 1;
                while j < words.len() && FILLER_AFTER_PAS.contains(&words[j].as_str()) {
                    j += 1;
                }
                if let Some(word) = words.get(j) {
                    keywords.push(Keyword::Not(word.clone()));
                }
                i = j + 1;
            }
            "ou" => {
                keywords.push(Keyword::Or);
                i += 1;
            }
            word => {
                keywords.push(Keyword::Term(word.to_string()));
                i += 1;
            }
        }
    }
    keywords
}

/// Parse a raw natural-language query.
///
/// Input is NFC-normalized first so decomposed accents match the word lists.
pub fn parse_query(raw: &str) -> StructuredQuery {
    let composed: String = raw.nfc().collect();
    let text = clean_query(&normalize_soit(&composed));
    let (doc_type, text) = extract_doc_type(&text);
    let (sections, text) = extract_sections(&text);
    let (date, text) = extract_dates(&text);
    let (title, text) = extract_title(&text);
    let (content, text) = extract_content(&text);
    let (image, text) = extract_image(&text);
    let keywords = extract_keywords(&text);

    let query = StructuredQuery {
        query: raw.to_string(),
        doc_type,
        date,
        sections,
        title,
        content,
        keywords,
        image,
    };
    tracing::debug!(?query, "parsed query");
    query
}
