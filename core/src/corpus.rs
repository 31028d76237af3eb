//! Corpus ingestion: the table of `(document_id, raw_text)` handed over by
//! the extraction stage, with the descriptive fields carried as payload.

use crate::error::{Error, Result};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Opaque descriptive fields returned with query results, never indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantPayload {
    #[serde(alias = "restaurantName")]
    pub name: String,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "postalCode")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, alias = "priceRange")]
    pub price_range: Option<String>,
    #[serde(default, alias = "cuisineType")]
    pub cuisine_type: Option<String>,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    pub payload: RestaurantPayload,
}

#[derive(Debug, Deserialize)]
struct InputRecord {
    #[serde(default, alias = "id")]
    external_id: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(flatten)]
    payload: RestaurantPayload,
}

/// Accumulates documents, assigning ids in ingestion order.
#[derive(Debug, Default)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, text: impl Into<String>, payload: RestaurantPayload) -> DocId {
        let id = self.docs.len() as DocId;
        self.docs.push(Document { id, text: text.into(), payload });
        id
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn into_documents(self) -> Vec<Document> { self.docs }

    fn push_record(&mut self, record: InputRecord) {
        let mut payload = record.payload;
        if payload.external_id.is_none() {
            payload.external_id = record.external_id;
        }
        self.push(record.description, payload);
    }
}

/// Read a corpus from a `.json`/`.jsonl` file or a directory of them.
/// Directory entries are visited in sorted path order so ids are stable.
pub fn load_corpus(input: &Path) -> Result<Corpus> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        return Err(Error::Missing { path: input.to_path_buf() });
    }

    let mut corpus = Corpus::new();
    for file in files {
        if extension(&file) == Some("jsonl") {
            read_jsonl(&file, &mut corpus)?;
        } else {
            read_json(&file, &mut corpus)?;
        }
    }
    tracing::info!(num_docs = corpus.len(), input = %input.display(), "loaded corpus");
    Ok(corpus)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path, corpus: &mut Corpus) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let record: InputRecord = serde_json::from_str(&line).map_err(|e| Error::Ingest {
            path: file.to_path_buf(),
            line: n + 1,
            reason: e.to_string(),
        })?;
        corpus.push_record(record);
    }
    Ok(())
}

fn read_json(file: &Path, corpus: &mut Corpus) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let bad = |e: serde_json::Error| Error::Ingest { path: file.to_path_buf(), line: e.line(), reason: e.to_string() };
    let json: serde_json::Value = serde_json::from_reader(reader).map_err(bad)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                corpus.push_record(serde_json::from_value(v).map_err(bad)?);
            }
        }
        serde_json::Value::Object(_) => corpus.push_record(serde_json::from_value(json).map_err(bad)?),
        other => {
            return Err(Error::Ingest {
                path: file.to_path_buf(),
                line: 1,
                reason: format!("expected an object or an array of objects, found {other}"),
            });
        }
    }
    Ok(())
}
