//! French natural-language search over bulletin articles.
//!
//! A query such as "Je voudrais les articles qui parlent de cuisine
//! moléculaire." is parsed into a [`StructuredQuery`], spell-corrected against
//! a [`Lexicon`] and evaluated as a boolean query over a field-tagged
//! [`InvertedIndex`] by the [`SearchEngine`].

pub mod config;
pub mod corpus;
pub mod corrector;
pub mod dates;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod lexicon;
pub mod parser;
pub mod persist;
pub mod query;
pub mod sections;
pub mod tokenizer;

pub use config::{CorrectionParams, EngineConfig};
pub use engine::{SearchEngine, SearchResult, SortOrder};
pub use error::{EngineError, Result};
pub use index::{DocAttributes, DocId, FieldTag, InvertedIndex, Posting};
pub use lexicon::Lexicon;
pub use parser::parse_query;
pub use query::{DocType, ImageFilter, Keyword, StructuredQuery};
