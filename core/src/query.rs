use crate::dates::DateConstraint;
use serde::Serialize;
use std::fmt;

/// Granularity of the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    #[default]
    Article,
    Bulletin,
    Rubrique,
}

impl DocType {
    /// Singular or plural keyword naming a doc-type.
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "article" | "articles" => Some(DocType::Article),
            "bulletin" | "bulletins" => Some(DocType::Bulletin),
            "rubrique" | "rubriques" => Some(DocType::Rubrique),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Article => "article",
            DocType::Bulletin => "bulletin",
            DocType::Rubrique => "rubrique",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFilter {
    Present,
    Absent,
}

/// One entry of the keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Keyword {
    Term(String),
    /// `pas X`: documents mentioning X are removed from the results.
    Not(String),
    /// The `ou` marker splitting the positive keywords into alternatives.
    Or,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Term(t) => f.write_str(t),
            Keyword::Not(t) => write!(f, "pas {t}"),
            Keyword::Or => f.write_str("ou"),
        }
    }
}

impl From<Keyword> for String {
    fn from(k: Keyword) -> Self { k.to_string() }
}

/// Search criteria extracted from a natural-language query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredQuery {
    pub query: String,
    pub doc_type: DocType,
    pub date: Option<DateConstraint>,
    pub sections: Vec<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub keywords: Vec<Keyword>,
    pub image: Option<ImageFilter>,
}

impl StructuredQuery {
    pub fn negated_terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.keywords.iter().filter_map(|k| match k {
            Keyword::Not(t) => Some(t.as_str()),
            _ => None,
        })
    }

    /// True when no criterion at all was recognized.
    pub fn is_unconstrained(&self) -> bool {
        self.date.is_none()
            && self.sections.is_empty()
            && self.title.is_none()
            && self.content.is_none()
            && self.keywords.is_empty()
            && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_type_words() {
        assert_eq!(DocType::from_word("bulletins"), Some(DocType::Bulletin));
        assert_eq!(DocType::from_word("rubrique"), Some(DocType::Rubrique));
        assert_eq!(DocType::from_word("quels"), None);
        assert_eq!(DocType::default(), DocType::Article);
    }

    #[test]
    fn keywords_display_like_the_query() {
        let q = StructuredQuery {
            keywords: vec![Keyword::Term("cnrs".into()), Keyword::Or, Keyword::Not("centrale".into())],
            ..Default::default()
        };
        let shown: Vec<String> = q.keywords.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["cnrs", "ou", "pas centrale"]);
        assert_eq!(q.negated_terms().collect::<Vec<_>>(), vec!["centrale"]);
    }
}
