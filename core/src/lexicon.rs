//! Word → lemma lexicon.

use crate::config::LEXICON_SEPARATOR;
use crate::error::{EngineError, Result};
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub surface: String,
    pub lemma: String,
}

/// Immutable surface-form → lemma table.
///
/// Entries keep their load order; fuzzy candidates are scanned in that order,
/// which makes tie-breaking deterministic. When a surface form appears twice
/// the first entry wins.
#[derive(Debug, Default, Clone)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
    by_surface: HashMap<String, usize>,
}

impl Lexicon {
    pub fn new() -> Self { Self::default() }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut lexicon = Self::new();
        for (surface, lemma) in entries {
            lexicon.push(surface, lemma);
        }
        lexicon
    }

    /// Build a lexicon mapping every word to its French Snowball stem.
    pub fn from_stemmer<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stemmer = Stemmer::create(Algorithm::French);
        let mut lexicon = Self::new();
        for word in words {
            let word = word.as_ref();
            if lexicon.by_surface.contains_key(word) { continue; }
            let stem = stemmer.stem(word).to_string();
            lexicon.push(word.to_string(), stem);
        }
        lexicon
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path)?;
        let lexicon = Self::parse(BufReader::new(f))?;
        tracing::info!(entries = lexicon.len(), "lexicon loaded");
        Ok(lexicon)
    }

    /// Parse `surface→lemma` lines. An empty lemma is kept as an empty string.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut lexicon = Self::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() { continue; }
            let (surface, lemma) = line
                .split_once(LEXICON_SEPARATOR)
                .ok_or(EngineError::MalformedLexiconRow { line: n + 1 })?;
            lexicon.push(surface.trim().to_string(), lemma.trim().to_string());
        }
        Ok(lexicon)
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        for entry in &self.entries {
            writeln!(w, "{}{}{}", entry.surface, LEXICON_SEPARATOR, entry.lemma)?;
        }
        Ok(())
    }

    fn push(&mut self, surface: String, lemma: String) {
        let idx = self.entries.len();
        self.by_surface.entry(surface.clone()).or_insert(idx);
        self.entries.push(LexiconEntry { surface, lemma });
    }

    /// Lemma of an exact surface form.
    pub fn lemma(&self, surface: &str) -> Option<&str> {
        self.by_surface.get(surface).map(|&i| self.entries[i].lemma.as_str())
    }

    /// Entries in load order.
    pub fn entries(&self) -> impl Iterator<Item = &LexiconEntry> + '_ { self.entries.iter() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
