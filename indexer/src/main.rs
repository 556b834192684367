use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::corpus::{vocabulary, Article, IndexBuilder};
use search_core::lexicon::Lexicon;
use search_core::persist::{save_index_text, save_lexicon, save_meta, save_snapshot, DataPaths, MetaFile, SNAPSHOT_VERSION};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index and lexicon of a bulletin corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output data directory
        #[arg(long)]
        output: PathBuf,
        /// Existing `surface→lemma` lexicon; built with the French stemmer when absent
        #[arg(long)]
        lexicon: Option<PathBuf>,
        /// File with one word per line that is never indexed
        #[arg(long)]
        stop_words: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, lexicon, stop_words } => {
            build_index(&input, &output, lexicon.as_deref(), stop_words.as_deref()).map(|_| ())
        }
    }
}

fn build_index(input: &Path, output: &Path, lexicon: Option<&Path>, stop_words: Option<&Path>) -> Result<MetaFile> {
    let articles = read_corpus(input)?;
    tracing::info!(articles = articles.len(), "corpus read");

    let lexicon = match lexicon {
        Some(path) => Lexicon::load(path).with_context(|| format!("loading lexicon {}", path.display()))?,
        None => Lexicon::from_stemmer(vocabulary(&articles)),
    };
    let stop_words = match stop_words {
        Some(path) => read_stop_words(path)?,
        None => Vec::new(),
    };

    let mut builder = IndexBuilder::new().with_stop_words(stop_words);
    for article in &articles {
        builder.add_article(article, &lexicon);
    }
    let num_docs = builder.num_articles() as u32;
    let index = builder.finish();

    let paths = DataPaths::new(output);
    save_index_text(&paths, &index)?;
    save_lexicon(&paths, &lexicon)?;
    save_snapshot(&paths, &index)?;
    let meta = MetaFile {
        num_docs,
        num_terms: index.num_terms() as u32,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_default(),
        version: SNAPSHOT_VERSION,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output = %output.display(), num_docs, num_terms = meta.num_terms, "index build complete");
    Ok(meta)
}

fn read_corpus(input: &Path) -> Result<Vec<Article>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input not found: {}", input.display());
    }

    let mut articles = Vec::new();
    for file in files {
        let read = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)
        } else {
            read_json(&file)
        };
        articles.extend(read.with_context(|| format!("reading {}", file.display()))?);
    }
    Ok(articles)
}

fn read_jsonl(file: &Path) -> Result<Vec<Article>> {
    let reader = BufReader::new(File::open(file)?);
    let mut articles = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        articles.push(serde_json::from_str(&line)?);
    }
    Ok(articles)
}

fn read_json(file: &Path) -> Result<Vec<Article>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let articles: Vec<Article> = match json {
        serde_json::Value::Array(arr) => arr.into_iter().map(serde_json::from_value).collect::<Result<_, _>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(articles)
}

fn read_stop_words(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(|l| l.trim().to_lowercase()).filter(|l| !l.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_core::{EngineConfig, SearchEngine};

    const ARTICLES: &str = r#"[
        {"fichier": "74752", "numero": "280", "date": "03/03/2013", "rubrique": "Focus",
         "titre": "La cuisine moléculaire", "texte": "Des chercheurs en cuisine.",
         "images": [{"url": "a.jpg", "legende": "labo"}]},
        {"fichier": "74753", "numero": "280", "date": "15/03/2013", "rubrique": "Evénement",
         "titre": "Salon de l'aéronautique", "texte": "Les avions du futur."}
    ]"#;

    #[test]
    fn builds_a_searchable_data_dir() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("bulletin.json"), ARTICLES).unwrap();
        fs::write(input.path().join("notes.txt"), "ignored").unwrap();

        let meta = build_index(input.path(), output.path(), None, None).unwrap();
        assert_eq!(meta.num_docs, 2);

        let engine = SearchEngine::open(&EngineConfig::with_data_dir(output.path())).unwrap();
        let result = engine.search("Articles qui parlent de cuisine").unwrap();
        assert_eq!(result.ids.unwrap().into_iter().collect::<Vec<_>>(), vec!["74752"]);
        let result = engine.search("Articles de mars 2013 avec des images").unwrap();
        assert_eq!(result.ids.unwrap().into_iter().collect::<Vec<_>>(), vec!["74752"]);
    }

    #[test]
    fn jsonl_lines_and_stop_words() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let lines: Vec<String> = serde_json::from_str::<Vec<serde_json::Value>>(ARTICLES)
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        let corpus = input.path().join("corpus.jsonl");
        fs::write(&corpus, lines.join("\n")).unwrap();
        let stop = input.path().join("stop.txt");
        fs::write(&stop, "les\ndes\n").unwrap();

        build_index(&corpus, output.path(), None, Some(stop.as_path())).unwrap();
        let index = search_core::InvertedIndex::load(output.path().join("index_inverse.txt")).unwrap();
        assert!(index.lookup("les").is_empty());
        assert!(!index.lookup("280").is_empty());
    }

    #[test]
    fn missing_input_fails() {
        let output = tempfile::tempdir().unwrap();
        assert!(build_index(Path::new("/nonexistent/corpus"), output.path(), None, None).is_err());
    }
}
