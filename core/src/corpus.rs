//! Article corpus and index construction.

use crate::index::{FieldTag, InvertedIndex, PAS_IMAGE, PRESENCE_IMAGE};
use crate::lexicon::Lexicon;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub legende: String,
}

/// One scraped bulletin article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article id, also the document id of every posting.
    pub fichier: String,
    pub numero: String,
    /// Publication date as `DD/MM/YYYY`.
    pub date: String,
    pub rubrique: String,
    pub titre: String,
    pub texte: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Accumulates postings article by article.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: InvertedIndex,
    stop_words: HashSet<String>,
    articles: usize,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    /// Words never indexed from titles and texts.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn add_article(&mut self, article: &Article, lexicon: &Lexicon) {
        let id = article.fichier.trim();
        if id.is_empty() {
            tracing::warn!(titre = %article.titre, "article without id skipped");
            return;
        }
        self.index.insert(&id.to_lowercase(), id, FieldTag::Fichier);
        for (value, field) in [(&article.numero, FieldTag::Numero), (&article.date, FieldTag::Date), (&article.rubrique, FieldTag::Rubrique)] {
            let value = value.trim().to_lowercase();
            if !value.is_empty() {
                self.index.insert(&value, id, field);
            }
        }
        for (text, field) in [(&article.titre, FieldTag::Titre), (&article.texte, FieldTag::Texte)] {
            for token in tokenize(text) {
                if self.stop_words.contains(&token) {
                    continue;
                }
                let term = match lexicon.lemma(&token) {
                    Some(lemma) if !lemma.is_empty() => lemma,
                    Some(_) => continue,
                    None => token.as_str(),
                };
                self.index.insert(term, id, field);
            }
        }
        let image_term = if article.images.is_empty() { PAS_IMAGE } else { PRESENCE_IMAGE };
        self.index.insert(image_term, id, FieldTag::Images);
        self.articles += 1;
    }

    pub fn num_articles(&self) -> usize { self.articles }

    pub fn finish(mut self) -> InvertedIndex {
        self.index.dedup();
        tracing::info!(articles = self.articles, terms = self.index.num_terms(), "index built");
        self.index
    }
}

/// Every distinct title and text token of the corpus, in first-seen order.
pub fn vocabulary<'a, I>(articles: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for article in articles {
        for token in tokenize(&article.titre).into_iter().chain(tokenize(&article.texte)) {
            if seen.insert(token.clone()) {
                words.push(token);
            }
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn article(id: &str, titre: &str, texte: &str, images: usize) -> Article {
        Article {
            fichier: id.into(),
            numero: "280".into(),
            date: "03/03/2013".into(),
            rubrique: "Focus".into(),
            titre: titre.into(),
            texte: texte.into(),
            images: vec![Image { url: "img.jpg".into(), legende: String::new() }; images],
        }
    }

    #[test]
    fn fields_are_tagged() {
        let lex = Lexicon::from_entries([("cuisine".to_string(), "cuisin".to_string())]);
        let mut b = IndexBuilder::new();
        b.add_article(&article("74752", "La cuisine", "Cuisine moléculaire", 1), &lex);
        b.add_article(&article("74753", "Chimie", "", 0), &lex);
        let index = b.finish();

        assert_eq!(index.docs("cuisin", &[FieldTag::Titre]), BTreeSet::from(["74752".to_string()]));
        assert_eq!(index.docs("moléculaire", &[FieldTag::Texte]).len(), 1);
        assert_eq!(index.docs("focus", &[FieldTag::Rubrique]).len(), 2);
        assert_eq!(index.docs("03/03/2013", &[FieldTag::Date]).len(), 2);
        assert_eq!(index.docs(PRESENCE_IMAGE, &[FieldTag::Images]), BTreeSet::from(["74752".to_string()]));
        assert_eq!(index.docs(PAS_IMAGE, &[FieldTag::Images]), BTreeSet::from(["74753".to_string()]));
        assert_eq!(index.attributes()["74753"].numero.as_deref(), Some("280"));
    }

    #[test]
    fn stop_words_are_not_indexed() {
        let mut b = IndexBuilder::new().with_stop_words(["la"]);
        b.add_article(&article("1", "La cuisine", "", 0), &Lexicon::new());
        let index = b.finish();
        assert!(index.lookup("la").is_empty());
        assert_eq!(index.lookup("cuisine").len(), 1);
    }

    #[test]
    fn articles_deserialize_without_images() {
        let a: Article = serde_json::from_str(
            r#"{"fichier":"1","numero":"280","date":"03/03/2013","rubrique":"Focus","titre":"t","texte":"x"}"#,
        )
        .unwrap();
        assert!(a.images.is_empty());
    }

    #[test]
    fn vocabulary_is_deduplicated() {
        let articles = [article("1", "Chat noir", "chat", 0), article("2", "Noir", "chien", 0)];
        assert_eq!(vocabulary(&articles), vec!["chat", "noir", "chien"]);
    }
}
