//! Inverted index of field-tagged postings.
//!
//! The text form has one line per term:
//!
//! ```text
//! cuisin,74752:texte,74753:texte
//! focus,74752:rubrique
//! 74752,74752:fichier
//! ```

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

pub type DocId = String;

/// Synthetic term posted for every article with at least one image.
pub const PRESENCE_IMAGE: &str = "presence_image";
/// Synthetic term posted for every article without images.
pub const PAS_IMAGE: &str = "pas_image";

/// Field a posting was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTag {
    Date,
    Rubrique,
    Titre,
    Texte,
    Numero,
    Fichier,
    Images,
}

impl FieldTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldTag::Date => "date",
            FieldTag::Rubrique => "rubrique",
            FieldTag::Titre => "titre",
            FieldTag::Texte => "texte",
            FieldTag::Numero => "numero",
            FieldTag::Fichier => "fichier",
            FieldTag::Images => "images",
        }
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for FieldTag {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(FieldTag::Date),
            "rubrique" => Ok(FieldTag::Rubrique),
            "titre" => Ok(FieldTag::Titre),
            "texte" => Ok(FieldTag::Texte),
            "numero" => Ok(FieldTag::Numero),
            "fichier" => Ok(FieldTag::Fichier),
            "images" => Ok(FieldTag::Images),
            other => Err(EngineError::UnknownFieldTag(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: FieldTag,
}

/// Stored attributes of an article, read back from its synthetic postings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocAttributes {
    pub date: Option<String>,
    pub rubrique: Option<String>,
    pub numero: Option<String>,
}

/// term → postings, terms kept sorted so the text form is stable.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<Posting>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Append one posting. Repeated (term, doc, field) triples are kept until
    /// [`dedup`](Self::dedup) runs.
    pub fn insert(&mut self, term: &str, doc_id: &str, field: FieldTag) {
        self.postings
            .entry(term.to_string())
            .or_default()
            .push(Posting { doc_id: doc_id.to_string(), field });
    }

    /// Keep the first occurrence of every (doc, field) pair of each term.
    pub fn dedup(&mut self) {
        for list in self.postings.values_mut() {
            let mut seen: HashSet<(DocId, FieldTag)> = HashSet::with_capacity(list.len());
            list.retain(|p| seen.insert((p.doc_id.clone(), p.field)));
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        let index = Self::parse(BufReader::new(f))?;
        tracing::info!(terms = index.num_terms(), "inverted index loaded");
        Ok(index)
    }

    /// Parse the `term,doc:field,...` format. Blank lines are skipped and
    /// `, ` is accepted as a separator.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut index = Self::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let malformed = |reason: &str| EngineError::MalformedIndexRow { line: n + 1, reason: reason.to_string() };
            let mut parts = line.split(',').map(str::trim);
            let term = parts.next().filter(|t| !t.is_empty()).ok_or_else(|| malformed("empty term"))?;
            let list = index.postings.entry(term.to_string()).or_default();
            for raw in parts.filter(|p| !p.is_empty()) {
                let (doc_id, tag) = raw.rsplit_once(':').ok_or_else(|| malformed("posting without field tag"))?;
                if doc_id.is_empty() {
                    return Err(malformed("empty document id"));
                }
                list.push(Posting { doc_id: doc_id.to_string(), field: tag.parse()? });
            }
        }
        index.dedup();
        Ok(index)
    }

    pub fn write_text<W: Write>(&self, mut out: W) -> Result<()> {
        for (term, list) in &self.postings {
            write!(out, "{term}")?;
            for p in list {
                write!(out, ",{}:{}", p.doc_id, p.field)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Every posting of `term`, exact match only.
    pub fn lookup(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Documents posted under `term` in one of `fields`.
    pub fn docs(&self, term: &str, fields: &[FieldTag]) -> BTreeSet<DocId> {
        self.lookup(term)
            .iter()
            .filter(|p| fields.contains(&p.field))
            .map(|p| p.doc_id.clone())
            .collect()
    }

    /// All (term, doc) pairs tagged `field`.
    pub fn postings_with_field(&self, field: FieldTag) -> impl Iterator<Item = (&str, &DocId)> + '_ {
        self.postings.iter().flat_map(move |(term, list)| {
            list.iter().filter(move |p| p.field == field).map(move |p| (term.as_str(), &p.doc_id))
        })
    }

    /// Every document id that has at least one posting.
    pub fn doc_ids(&self) -> BTreeSet<DocId> {
        self.postings.values().flatten().map(|p| p.doc_id.clone()).collect()
    }

    /// Reverse lookup of the `date`, `rubrique` and `numero` postings.
    pub fn attributes(&self) -> HashMap<DocId, DocAttributes> {
        let mut attrs: HashMap<DocId, DocAttributes> = HashMap::new();
        for (term, list) in &self.postings {
            for p in list {
                let slot = match p.field {
                    FieldTag::Date => &mut attrs.entry(p.doc_id.clone()).or_default().date,
                    FieldTag::Rubrique => &mut attrs.entry(p.doc_id.clone()).or_default().rubrique,
                    FieldTag::Numero => &mut attrs.entry(p.doc_id.clone()).or_default().numero,
                    _ => continue,
                };
                slot.get_or_insert_with(|| term.clone());
            }
        }
        attrs
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}
