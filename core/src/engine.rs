//! A loaded, read-only corpus snapshot answering both query modes.
//!
//! Built or loaded once, then shared by reference (`Arc<SearchEngine>`)
//! across concurrent queries. Nothing here mutates after construction.

use crate::corpus::RestaurantPayload;
use crate::error::Result;
use crate::index::{InvertedIndex, MembershipIndex};
use crate::persist::{load_snapshot, IndexPaths, MetaFile, Snapshot};
use crate::search::{search_conjunctive, search_ranked};
use crate::vocabulary::Vocabulary;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchMode {
    Boolean,
    Ranked { k: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(flatten)]
    pub payload: RestaurantPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchResults {
    /// Every matching document, ascending doc id
    Boolean(Vec<Hit>),
    /// At most `k` documents, best first
    Ranked(Vec<Hit>),
}

impl SearchResults {
    pub fn hits(&self) -> &[Hit] {
        match self {
            SearchResults::Boolean(h) | SearchResults::Ranked(h) => h,
        }
    }

    pub fn into_hits(self) -> Vec<Hit> {
        match self {
            SearchResults::Boolean(h) | SearchResults::Ranked(h) => h,
        }
    }

    pub fn is_empty(&self) -> bool { self.hits().is_empty() }
}

#[derive(Debug)]
pub struct SearchEngine {
    vocabulary: Vocabulary,
    index: InvertedIndex,
    boolean_vocabulary: Vocabulary,
    membership: MembershipIndex,
    docs: Vec<RestaurantPayload>,
    meta: MetaFile,
}

impl SearchEngine {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let snapshot = load_snapshot(&IndexPaths::new(dir.as_ref()))?;
        tracing::info!(
            index = %dir.as_ref().display(),
            num_docs = snapshot.meta.num_docs,
            num_terms = snapshot.meta.num_terms,
            "loaded index snapshot"
        );
        Ok(Self::from(snapshot))
    }

    pub fn search(&self, query: &str, mode: SearchMode) -> Result<SearchResults> {
        match mode {
            SearchMode::Boolean => {
                let hits = search_conjunctive(query, &self.membership, &self.boolean_vocabulary)
                    .into_iter()
                    .filter_map(|doc_id| self.hit(doc_id, None))
                    .collect();
                Ok(SearchResults::Boolean(hits))
            }
            SearchMode::Ranked { k } => {
                let hits = search_ranked(query, &self.index, &self.vocabulary, k)?
                    .into_iter()
                    .filter_map(|s| self.hit(s.doc_id, Some(s.score)))
                    .collect();
                Ok(SearchResults::Ranked(hits))
            }
        }
    }

    fn hit(&self, doc_id: DocId, score: Option<f32>) -> Option<Hit> {
        self.document(doc_id).map(|payload| Hit { doc_id, score, payload: payload.clone() })
    }

    pub fn document(&self, doc_id: DocId) -> Option<&RestaurantPayload> { self.docs.get(doc_id as usize) }

    pub fn meta(&self) -> &MetaFile { &self.meta }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn boolean_vocabulary(&self) -> &Vocabulary { &self.boolean_vocabulary }

    pub fn membership(&self) -> &MembershipIndex { &self.membership }
}

impl From<Snapshot> for SearchEngine {
    fn from(s: Snapshot) -> Self {
        Self {
            vocabulary: s.vocabulary,
            index: s.index,
            boolean_vocabulary: s.boolean_vocabulary,
            membership: s.membership,
            docs: s.docs,
            meta: s.meta,
        }
    }
}
