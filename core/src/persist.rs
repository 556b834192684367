use crate::config::{INDEX_FILE, LEXICON_FILE, META_FILE, SNAPSHOT_FILE};
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::lexicon::Lexicon;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

/// Locations of the engine's data files under one directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn index(&self) -> PathBuf { self.root.join(INDEX_FILE) }
    pub fn lexicon(&self) -> PathBuf { self.root.join(LEXICON_FILE) }
    pub fn snapshot(&self) -> PathBuf { self.root.join(SNAPSHOT_FILE) }
    pub fn meta(&self) -> PathBuf { self.root.join(META_FILE) }
}

pub fn save_index_text(paths: &DataPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut out = BufWriter::new(File::create(paths.index())?);
    index.write_text(&mut out)?;
    out.flush()?;
    Ok(())
}

pub fn save_lexicon(paths: &DataPaths, lexicon: &Lexicon) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut out = BufWriter::new(File::create(paths.lexicon())?);
    lexicon.write_to(&mut out)?;
    out.flush()?;
    Ok(())
}

pub fn save_snapshot(paths: &DataPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.snapshot())?;
    let bytes = bincode::serialize(&(SNAPSHOT_VERSION, index))?;
    f.write_all(&bytes)?;
    Ok(())
}

/// Returns `None` when the snapshot was written by another format version.
pub fn load_snapshot(paths: &DataPaths) -> Result<Option<InvertedIndex>> {
    let mut f = File::open(paths.snapshot())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let (version, index): (u32, InvertedIndex) = bincode::deserialize(&buf)?;
    if version != SNAPSHOT_VERSION {
        tracing::warn!(version, expected = SNAPSHOT_VERSION, "ignoring snapshot");
        return Ok(None);
    }
    Ok(Some(index))
}

pub fn save_meta(paths: &DataPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &DataPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Load the postings table, from the snapshot when allowed and not older than
/// the text file, otherwise from the text file.
pub fn load_index(paths: &DataPaths, use_snapshot: bool) -> Result<InvertedIndex> {
    if use_snapshot {
        let fresh = match (modified(&paths.snapshot()), modified(&paths.index())) {
            (Some(snap), Some(text)) => snap >= text,
            (Some(_), None) => true,
            _ => false,
        };
        if fresh {
            if let Some(index) = load_snapshot(paths)? {
                tracing::info!(terms = index.num_terms(), "index loaded from snapshot");
                return Ok(index);
            }
        }
    }
    InvertedIndex::load(paths.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FieldTag;

    #[test]
    fn snapshot_preferred_when_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let mut index = InvertedIndex::new();
        index.insert("chat", "1", FieldTag::Titre);
        save_index_text(&paths, &index).unwrap();

        let mut richer = index.clone();
        richer.insert("noir", "2", FieldTag::Texte);
        save_snapshot(&paths, &richer).unwrap();

        assert_eq!(load_index(&paths, true).unwrap().num_terms(), 2);
        assert_eq!(load_index(&paths, false).unwrap().num_terms(), 1);
    }

    #[test]
    fn missing_index_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("absent"));
        assert!(matches!(load_index(&paths, true), Err(crate::EngineError::Io(_))));
    }

    #[test]
    fn meta_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        let meta = MetaFile { num_docs: 3, num_terms: 7, created_at: "2024-01-01T00:00:00Z".into(), version: SNAPSHOT_VERSION };
        save_meta(&paths, &meta).unwrap();
        assert_eq!(load_meta(&paths).unwrap(), meta);
    }
}
