use crate::corpus::RestaurantPayload;
use crate::error::{Error, Result};
use crate::index::{InvertedIndex, MembershipIndex};
use crate::pipeline::{BuiltIndex, IndexConfig};
use crate::vocabulary::{TermRow, Vocabulary};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;

pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub num_docs: u32,
    pub num_terms: u32,
    pub num_boolean_terms: u32,
    pub config: IndexConfig,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.jsonl") }
    pub fn index(&self) -> PathBuf { self.root.join("index.bin") }
    pub fn boolean_vocabulary(&self) -> PathBuf { self.root.join("boolean_vocabulary.jsonl") }
    pub fn membership(&self) -> PathBuf { self.root.join("membership.bin") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Everything a query service needs, fully validated.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub vocabulary: Vocabulary,
    pub index: InvertedIndex,
    pub boolean_vocabulary: Vocabulary,
    pub membership: MembershipIndex,
    pub docs: Vec<RestaurantPayload>,
    pub meta: MetaFile,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::Missing { path: path.to_path_buf() },
        _ => Error::Io(e),
    })
}

/// Write through a temp file and rename, so readers never see half a file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e)))?;
    write_atomic(path, &bytes)
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut buf = Vec::new();
    open(path)?.read_to_end(&mut buf)?;
    bincode::deserialize(&buf).map_err(|e| Error::corrupt(path, e))
}

fn write_term_table(path: &Path, vocabulary: &Vocabulary) -> Result<()> {
    let mut bytes = Vec::new();
    for row in vocabulary.rows() {
        serde_json::to_writer(&mut bytes, &row).map_err(|e| Error::Io(e.into()))?;
        bytes.push(b'\n');
    }
    write_atomic(path, &bytes)
}

fn read_term_table(path: &Path) -> Result<Vocabulary> {
    let reader = BufReader::new(open(path)?);
    let mut rows = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => Error::corrupt(path, format!("line {}: {e}", n + 1)),
            _ => Error::Io(e),
        })?;
        if line.is_empty() { continue; }
        let row: TermRow = serde_json::from_str(&line).map_err(|e| Error::corrupt(path, format!("line {}: {e}", n + 1)))?;
        rows.push(row);
    }
    Vocabulary::from_rows(rows).map_err(|reason| Error::corrupt(path, reason))
}

pub fn save_vocabulary(paths: &IndexPaths, vocabulary: &Vocabulary) -> Result<()> {
    write_term_table(&paths.vocabulary(), vocabulary)
}

/// The term table can be loaded on its own, without the index.
pub fn load_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> {
    read_term_table(&paths.vocabulary())
}

pub fn save_boolean_vocabulary(paths: &IndexPaths, vocabulary: &Vocabulary) -> Result<()> {
    write_term_table(&paths.boolean_vocabulary(), vocabulary)
}

pub fn load_boolean_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> {
    read_term_table(&paths.boolean_vocabulary())
}

pub fn save_membership(paths: &IndexPaths, membership: &MembershipIndex) -> Result<()> {
    save_bin(&paths.membership(), membership)
}

pub fn load_membership(paths: &IndexPaths) -> Result<MembershipIndex> {
    load_bin(&paths.membership())
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    save_bin(&paths.index(), index)
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    load_bin(&paths.index())
}

pub fn save_docs(paths: &IndexPaths, docs: &[RestaurantPayload]) -> Result<()> {
    save_bin(&paths.docs(), &docs)
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<RestaurantPayload>> {
    load_bin(&paths.docs())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta).map_err(|e| Error::Io(e.into()))?;
    write_atomic(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let mut buf = String::new();
    open(&path)?.read_to_string(&mut buf)?;
    serde_json::from_str(&buf).map_err(|e| Error::corrupt(&path, e))
}

/// Persist a freshly built snapshot. `meta.json` is written last, so a
/// directory without it never passes for a complete index.
pub fn save_snapshot(paths: &IndexPaths, built: &BuiltIndex, docs: &[RestaurantPayload]) -> Result<MetaFile> {
    save_vocabulary(paths, &built.vocabulary)?;
    save_index(paths, &built.index)?;
    save_boolean_vocabulary(paths, &built.boolean_vocabulary)?;
    save_membership(paths, &built.membership)?;
    save_docs(paths, docs)?;
    let meta = MetaFile {
        version: FORMAT_VERSION,
        num_docs: built.index.num_docs,
        num_terms: built.vocabulary.len() as u32,
        num_boolean_terms: built.boolean_vocabulary.len() as u32,
        config: built.config,
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, num_terms = meta.num_terms, "index persisted");
    Ok(meta)
}

/// Load and cross-check every artifact; nothing is returned unless all agree.
pub fn load_snapshot(paths: &IndexPaths) -> Result<Snapshot> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::corrupt(paths.meta(), format!("format version {} (expected {FORMAT_VERSION})", meta.version)));
    }
    let vocabulary = load_vocabulary(paths)?;
    if vocabulary.len() != meta.num_terms as usize {
        return Err(Error::corrupt(paths.vocabulary(), format!("{} terms, meta says {}", vocabulary.len(), meta.num_terms)));
    }
    let index = load_index(paths)?;
    if index.num_docs != meta.num_docs {
        return Err(Error::corrupt(paths.index(), format!("{} documents, meta says {}", index.num_docs, meta.num_docs)));
    }
    index.check(vocabulary.len()).map_err(|reason| Error::corrupt(paths.index(), reason))?;
    let boolean_vocabulary = load_boolean_vocabulary(paths)?;
    if boolean_vocabulary.len() != meta.num_boolean_terms as usize {
        return Err(Error::corrupt(
            paths.boolean_vocabulary(),
            format!("{} terms, meta says {}", boolean_vocabulary.len(), meta.num_boolean_terms),
        ));
    }
    let membership = load_membership(paths)?;
    if membership.num_docs != meta.num_docs {
        return Err(Error::corrupt(paths.membership(), format!("{} documents, meta says {}", membership.num_docs, meta.num_docs)));
    }
    membership.check(boolean_vocabulary.len()).map_err(|reason| Error::corrupt(paths.membership(), reason))?;
    let docs = load_docs(paths)?;
    if docs.len() != meta.num_docs as usize {
        return Err(Error::corrupt(paths.docs(), format!("{} payloads, meta says {}", docs.len(), meta.num_docs)));
    }
    Ok(Snapshot { vocabulary, index, boolean_vocabulary, membership, docs, meta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{build_vocabulary, VocabularyStrategy};

    #[test]
    fn vocabulary_file_is_one_row_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let vocab = build_vocabulary(&[vec!["pizza", "oven"]], VocabularyStrategy::DocFrequencyUnfiltered).unwrap();
        save_vocabulary(&paths, &vocab).unwrap();
        let text = fs::read_to_string(paths.vocabulary()).unwrap();
        assert_eq!(text, "{\"term_id\":0,\"term\":\"oven\"}\n{\"term_id\":1,\"term\":\"pizza\"}\n");
        assert_eq!(load_vocabulary(&paths).unwrap(), vocab);
    }

    #[test]
    fn invalid_utf8_in_term_table_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        fs::write(paths.vocabulary(), b"{\"term_id\":0,\"term\":\"oven\"}\n\xff\xfe\n").unwrap();
        let err = load_vocabulary(&paths).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }), "{err}");
    }

    #[test]
    fn missing_and_corrupt_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        assert!(matches!(load_index(&paths), Err(Error::Missing { .. })));

        fs::write(paths.index(), b"\x01\x02").unwrap();
        let err = load_index(&paths).unwrap_err();
        assert!(matches!(err, Error::Corrupt { .. }));
        assert!(err.is_persistence());
    }
}
