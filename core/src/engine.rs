//! Boolean retrieval over the field-tagged index.
//!
//! A query is parsed, its title, content and keywords are spell-corrected,
//! and every criterion the query mentions yields a candidate set of article
//! ids. The final set is the intersection of those candidate sets minus the
//! articles matching the negated keywords, projected onto the requested
//! doc-type (articles, section names or bulletin numbers).

use crate::config::{CorrectionParams, EngineConfig};
use crate::corrector::SpellingCorrector;
use crate::dates::{display_date, parse_display_date, DateConstraint};
use crate::error::Result;
use crate::index::{DocAttributes, DocId, FieldTag, InvertedIndex, PAS_IMAGE, PRESENCE_IMAGE};
use crate::lexicon::Lexicon;
use crate::parser::parse_query;
use crate::persist::{self, DataPaths};
use crate::query::{DocType, ImageFilter, Keyword, StructuredQuery};
use crate::sections::canonical_section;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use time::Date;

const WORD_FIELDS: &[FieldTag] = &[FieldTag::Titre, FieldTag::Texte];

/// Ids (or labels) matched by a query.
///
/// `ids` is `None` when the query constrained nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub doc_type: DocType,
    pub ids: Option<BTreeSet<String>>,
}

impl SearchResult {
    pub fn len(&self) -> usize { self.ids.as_ref().map_or(0, BTreeSet::len) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

/// Read-only engine state: index, lexicon and correction thresholds.
pub struct SearchEngine {
    index: InvertedIndex,
    lexicon: Lexicon,
    params: CorrectionParams,
    attributes: HashMap<DocId, DocAttributes>,
    all_docs: BTreeSet<DocId>,
}

impl SearchEngine {
    pub fn new(index: InvertedIndex, lexicon: Lexicon, params: CorrectionParams) -> Self {
        let attributes = index.attributes();
        let all_docs = index.doc_ids();
        Self { index, lexicon, params, attributes, all_docs }
    }

    /// Load the index and lexicon found under `config.data_dir`.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let paths: DataPaths = config.paths();
        let lexicon = Lexicon::load(paths.lexicon())?;
        let index = persist::load_index(&paths, config.use_snapshot)?;
        let engine = Self::new(index, lexicon, config.correction);
        tracing::info!(docs = engine.num_docs(), root = %paths.root.display(), "search engine ready");
        Ok(engine)
    }

    pub fn num_docs(&self) -> usize { self.all_docs.len() }

    pub fn attributes(&self, doc_id: &str) -> Option<&DocAttributes> { self.attributes.get(doc_id) }

    /// Parse `raw` and spell-correct the fields that are looked up as words.
    pub fn analyze(&self, raw: &str) -> StructuredQuery {
        self.correct_query(parse_query(raw))
    }

    /// Title, content and keywords are replaced by their corrected forms;
    /// `pas X` keeps its negation and only X is corrected.
    pub fn correct_query(&self, mut query: StructuredQuery) -> StructuredQuery {
        let corrector = SpellingCorrector::new(&self.lexicon, self.params);
        query.title = query.title.map(|t| corrector.correct(&t));
        query.content = query.content.map(|c| corrector.correct(&c));
        query.keywords = query
            .keywords
            .into_iter()
            .map(|k| match k {
                Keyword::Term(t) => Keyword::Term(corrector.correct(&t)),
                Keyword::Not(t) => Keyword::Not(corrector.correct(&t)),
                Keyword::Or => Keyword::Or,
            })
            .collect();
        query
    }

    pub fn search(&self, raw: &str) -> Result<SearchResult> {
        let query = self.analyze(raw);
        self.execute(&query)
    }

    /// Evaluate an already corrected query.
    pub fn execute(&self, query: &StructuredQuery) -> Result<SearchResult> {
        if query.is_unconstrained() {
            return Ok(SearchResult { doc_type: query.doc_type, ids: None });
        }
        let mut title_docs = query.title.as_deref().map(|t| self.index.docs(t, &[FieldTag::Titre]));
        let mut content_docs = query.content.as_deref().map(|c| self.index.docs(c, &[FieldTag::Texte]));

        let mut required: Vec<(&'static str, BTreeSet<DocId>)> = Vec::new();
        if let Some(constraint) = &query.date {
            required.push(("date", self.resolve_date(constraint)?));
        }
        if !query.sections.is_empty() {
            required.push(("rubrique", self.resolve_sections(&query.sections)?));
        }

        let negated = self.resolve_negated(query);
        if !query.keywords.is_empty() {
            let groups = keyword_groups(&query.keywords);
            let fields_named = title_docs.is_some() || content_docs.is_some();
            if groups.len() == 2 && groups.iter().all(Vec::is_empty) {
                // a lone "ou" joins title and content
                let joined: BTreeSet<DocId> =
                    title_docs.into_iter().chain(content_docs).flatten().collect();
                tracing::debug!(docs = joined.len(), "title or content");
                return Ok(self.project(joined, query.doc_type));
            }
            let docs = if groups.len() > 1 && fields_named && groups.iter().any(Vec::is_empty) {
                // the title or content criterion is the missing operand of "ou"
                let fields: BTreeSet<DocId> =
                    title_docs.take().into_iter().chain(content_docs.take()).flatten().collect();
                groups
                    .iter()
                    .filter(|g| !g.is_empty())
                    .fold(fields, |acc, g| &acc | &self.conjunction(g))
            } else {
                self.resolve_keywords(&groups)
            };
            required.push(("keywords", docs));
        }
        if let Some(docs) = title_docs {
            required.push(("titre", docs));
        }
        if let Some(docs) = content_docs {
            required.push(("contenu", docs));
        }
        if let Some(filter) = query.image {
            let term = match filter {
                ImageFilter::Present => PRESENCE_IMAGE,
                ImageFilter::Absent => PAS_IMAGE,
            };
            let docs = self.index.lookup(term).iter().map(|p| p.doc_id.clone()).collect();
            required.push(("images", docs));
        }

        for (field, docs) in &required {
            tracing::debug!(field, docs = docs.len(), "candidate set");
        }
        let matched: BTreeSet<DocId> = required
            .into_iter()
            .map(|(_, docs)| docs)
            .reduce(|acc, docs| &acc & &docs)
            .unwrap_or_default();
        let matched = &matched - &negated;
        Ok(self.project(matched, query.doc_type))
    }

    fn resolve_date(&self, constraint: &DateConstraint) -> Result<BTreeSet<DocId>> {
        let (lo, hi) = constraint.window()?;
        tracing::debug!(
            min = lo.map(display_date).as_deref(),
            max = hi.map(display_date).as_deref(),
            exclude = constraint.exclude.map(|e| e.to_string()).as_deref(),
            "date window"
        );
        let excluded = constraint.exclude.map(|e| e.display_regex());
        let mut docs = BTreeSet::new();
        for (stored, doc_id) in self.index.postings_with_field(FieldTag::Date) {
            let Some(date) = parse_display_date(stored) else {
                tracing::warn!(date = stored, doc = %doc_id, "unparseable stored date");
                continue;
            };
            if !within(date, lo, hi) {
                continue;
            }
            if excluded.as_ref().is_some_and(|re| re.is_match(stored)) {
                continue;
            }
            docs.insert(doc_id.clone());
        }
        Ok(docs)
    }

    fn resolve_sections(&self, sections: &[String]) -> Result<BTreeSet<DocId>> {
        let mut docs = BTreeSet::new();
        for section in sections {
            let label = canonical_section(section)?;
            docs.extend(self.index.docs(label, &[FieldTag::Rubrique]));
        }
        Ok(docs)
    }

    /// Articles containing every word of `terms`; all articles when empty.
    fn conjunction(&self, terms: &[&str]) -> BTreeSet<DocId> {
        let mut iter = terms.iter();
        let Some(first) = iter.next() else {
            return self.all_docs.clone();
        };
        iter.fold(self.index.docs(first, WORD_FIELDS), |acc, t| &acc & &self.index.docs(t, WORD_FIELDS))
    }

    /// Groups are conjunctions joined by union. An empty group, as in a
    /// trailing `ou`, stands for every article.
    fn resolve_keywords(&self, groups: &[Vec<&str>]) -> BTreeSet<DocId> {
        match groups {
            [single] => self.conjunction(single),
            _ => groups.iter().flat_map(|g| self.conjunction(g)).collect(),
        }
    }

    /// Articles containing every negated word. Empty without negation.
    fn resolve_negated(&self, query: &StructuredQuery) -> BTreeSet<DocId> {
        let negated: Vec<&str> = query.negated_terms().collect();
        if negated.is_empty() {
            return BTreeSet::new();
        }
        self.conjunction(&negated)
    }

    fn project(&self, ids: BTreeSet<DocId>, doc_type: DocType) -> SearchResult {
        let ids = match doc_type {
            DocType::Article => ids,
            DocType::Rubrique => ids
                .iter()
                .filter_map(|id| self.attributes.get(id).and_then(|a| a.rubrique.clone()))
                .collect(),
            DocType::Bulletin => ids
                .iter()
                .filter_map(|id| self.attributes.get(id).and_then(|a| a.numero.clone()))
                .collect(),
        };
        SearchResult { doc_type, ids: Some(ids) }
    }

    /// Order article ids by stored date; undated ids come last.
    pub fn sort_by_date<'a, I>(&self, ids: I, order: SortOrder) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut dated: Vec<(Option<Date>, &String)> = ids
            .into_iter()
            .map(|id| {
                let date = self.attributes.get(id).and_then(|a| a.date.as_deref()).and_then(parse_display_date);
                (date, id)
            })
            .collect();
        dated.sort_by(|(da, ia), (db, ib)| match (da, db) {
            (Some(a), Some(b)) => match order {
                SortOrder::Asc => a.cmp(b),
                SortOrder::Desc => b.cmp(a),
            }
            .then_with(|| ia.cmp(ib)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => ia.cmp(ib),
        });
        dated.into_iter().map(|(_, id)| id.clone()).collect()
    }
}

/// Positive keywords split on `ou`; without `ou` there is a single group.
fn keyword_groups(keywords: &[Keyword]) -> Vec<Vec<&str>> {
    let mut groups: Vec<Vec<&str>> = vec![Vec::new()];
    for keyword in keywords {
        match keyword {
            Keyword::Term(t) => {
                if let Some(group) = groups.last_mut() {
                    group.push(t.as_str());
                }
            }
            Keyword::Or => groups.push(Vec::new()),
            Keyword::Not(_) => {}
        }
    }
    groups
}

fn within(date: Date, lo: Option<Date>, hi: Option<Date>) -> bool {
    lo.map_or(true, |lo| lo <= date) && hi.map_or(true, |hi| date <= hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORDS: &str = "chat,1:titre,2:texte\nnoir,1:texte,3:titre\n";

    fn engine(index: &str) -> SearchEngine {
        SearchEngine::new(InvertedIndex::parse(index.as_bytes()).unwrap(), Lexicon::new(), CorrectionParams::default())
    }

    fn keywords(words: &[&str]) -> StructuredQuery {
        let keywords = words
            .iter()
            .map(|w| match *w {
                "ou" => Keyword::Or,
                w if w.starts_with("pas ") => Keyword::Not(w[4..].to_string()),
                w => Keyword::Term(w.to_string()),
            })
            .collect();
        StructuredQuery { keywords, ..Default::default() }
    }

    fn ids(result: SearchResult) -> Vec<String> {
        result.ids.unwrap().into_iter().collect()
    }

    #[test]
    fn conjunction_and_disjunction() {
        let e = engine(KEYWORDS);
        assert_eq!(ids(e.execute(&keywords(&["chat", "noir"])).unwrap()), vec!["1"]);
        assert_eq!(ids(e.execute(&keywords(&["chat", "ou", "noir"])).unwrap()), vec!["1", "2", "3"]);
    }

    #[test]
    fn negation_subtracts_from_everything() {
        let e = engine(KEYWORDS);
        assert_eq!(ids(e.execute(&keywords(&["pas noir"])).unwrap()), vec!["2"]);
        assert_eq!(ids(e.execute(&keywords(&["chat", "pas noir"])).unwrap()), vec!["2"]);
    }

    #[test]
    fn several_ou_markers_union_every_group() {
        let e = engine("chat,1:titre\nnoir,2:texte\nblanc,3:texte\n");
        assert_eq!(ids(e.execute(&keywords(&["chat", "ou", "noir", "ou", "blanc"])).unwrap()), vec!["1", "2", "3"]);
        assert_eq!(ids(e.execute(&keywords(&["ou", "blanc"])).unwrap()), vec!["1", "2", "3"]);
    }

    #[test]
    fn keyword_postings_ignore_other_fields() {
        let e = engine("focus,1:rubrique,2:texte\n");
        assert_eq!(ids(e.execute(&keywords(&["focus"])).unwrap()), vec!["2"]);
    }

    #[test]
    fn nothing_recognized_yields_none() {
        let e = engine(KEYWORDS);
        let result = e.execute(&StructuredQuery::default()).unwrap();
        assert_eq!(result, SearchResult { doc_type: DocType::Article, ids: None });
    }

    #[test]
    fn lone_ou_joins_title_and_content() {
        let e = engine("chimie,1:titre,2:texte\nphysique,3:texte\n");
        let q = StructuredQuery {
            title: Some("chimie".into()),
            content: Some("physique".into()),
            keywords: vec![Keyword::Or],
            ..Default::default()
        };
        assert_eq!(ids(e.execute(&q).unwrap()), vec!["1", "3"]);
    }

    #[test]
    fn title_is_the_other_side_of_ou() {
        let e = engine("chimie,1:titre,2:titre\nphysique,3:texte,1:texte\n");
        let q = StructuredQuery {
            title: Some("chimie".into()),
            keywords: vec![Keyword::Or, Keyword::Term("physique".into())],
            ..Default::default()
        };
        assert_eq!(ids(e.execute(&q).unwrap()), vec!["1", "2", "3"]);
        let result = e.search("Articles dont le titre contient chimie ou qui parlent de physique").unwrap();
        assert_eq!(ids(result), vec!["1", "2", "3"]);
    }

    #[test]
    fn unknown_section_is_an_error() {
        let e = engine(KEYWORDS);
        let q = StructuredQuery { sections: vec!["sport".into()], ..Default::default() };
        assert!(matches!(e.execute(&q), Err(crate::EngineError::UnknownSection(_))));
    }

    #[test]
    fn dates_sort_both_ways() {
        let e = engine("03/03/2013,a:date\n12/06/2012,b:date\n31/02/2013,c:date\n");
        let all: Vec<String> = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        assert_eq!(e.sort_by_date(&all, SortOrder::Asc), vec!["b", "a", "c", "d"]);
        assert_eq!(e.sort_by_date(&all, SortOrder::Desc), vec!["a", "b", "c", "d"]);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("newest".parse::<SortOrder>().is_err());
    }
}
