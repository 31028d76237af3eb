use crate::vocabulary::Vocabulary;
use crate::weights::{term_frequencies, WeightMatrix};
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // raw tf-idf weight
}

/// Term id → postings, plus what ranked queries need without the matrix:
/// the corpus idf per term and the Euclidean norm of every document row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub postings: BTreeMap<TermId, Vec<Posting>>, // postings sorted by doc_id
    pub idf: Vec<f32>,
    pub doc_norms: Vec<f32>,
    pub num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn postings(&self, term: TermId) -> Option<&[Posting]> {
        self.postings.get(&term).map(Vec::as_slice)
    }

    pub fn idf(&self, term: TermId) -> f32 {
        self.idf.get(term as usize).copied().unwrap_or(0.0)
    }

    pub fn doc_norm(&self, doc: DocId) -> f32 {
        self.doc_norms.get(doc as usize).copied().unwrap_or(0.0)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_postings(&self) -> usize { self.postings.values().map(Vec::len).sum() }

    /// Structural checks run on every load. Returns the first violation.
    pub fn check(&self, vocabulary_len: usize) -> Result<(), String> {
        if self.idf.len() != vocabulary_len {
            return Err(format!("idf table has {} entries, vocabulary has {vocabulary_len}", self.idf.len()));
        }
        if self.doc_norms.len() != self.num_docs as usize {
            return Err(format!("{} document norms for {} documents", self.doc_norms.len(), self.num_docs));
        }
        for (&term, plist) in &self.postings {
            if term as usize >= vocabulary_len {
                return Err(format!("term id {term} outside vocabulary"));
            }
            if plist.is_empty() {
                return Err(format!("empty postings for term {term}"));
            }
            let mut prev: Option<DocId> = None;
            for p in plist {
                if p.doc_id >= self.num_docs {
                    return Err(format!("doc id {} outside corpus", p.doc_id));
                }
                if prev.is_some_and(|d| d >= p.doc_id) {
                    return Err(format!("postings for term {term} not strictly ascending"));
                }
                if !p.weight.is_finite() || p.weight <= 0.0 {
                    return Err(format!("bad weight {} for term {term}", p.weight));
                }
                prev = Some(p.doc_id);
            }
        }
        Ok(())
    }
}

/// Transpose the weight matrix into postings lists.
///
/// Rows are walked in document order, so every list comes out ascending by
/// doc id with at most one posting per document. Terms with no nonzero
/// weight get no entry.
pub fn build_index(matrix: &WeightMatrix) -> InvertedIndex {
    let mut postings: BTreeMap<TermId, Vec<Posting>> = BTreeMap::new();
    for (doc_id, row) in matrix.rows() {
        for &(term, weight) in row {
            postings.entry(term).or_default().push(Posting { doc_id, weight });
        }
    }
    InvertedIndex {
        postings,
        idf: matrix.idf().to_vec(),
        doc_norms: matrix.norms(),
        num_docs: matrix.num_docs(),
    }
}

/// Term id → ids of the documents containing it, for conjunctive queries.
///
/// Built from raw term presence, so a term found in every document still
/// has a full list even though its ranked weight is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipIndex {
    pub postings: BTreeMap<TermId, Vec<DocId>>, // ascending doc ids
    pub num_docs: u32,
}

impl MembershipIndex {
    pub fn docs(&self, term: TermId) -> Option<&[DocId]> {
        self.postings.get(&term).map(Vec::as_slice)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn check(&self, vocabulary_len: usize) -> Result<(), String> {
        for (&term, docs) in &self.postings {
            if term as usize >= vocabulary_len {
                return Err(format!("term id {term} outside vocabulary"));
            }
            if docs.is_empty() {
                return Err(format!("empty document list for term {term}"));
            }
            if docs.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("document list for term {term} not strictly ascending"));
            }
            if docs.iter().any(|&d| d >= self.num_docs) {
                return Err(format!("doc id outside corpus for term {term}"));
            }
        }
        Ok(())
    }
}

/// Record which documents contain each vocabulary term (tf > 0).
pub fn build_membership<S: AsRef<str>>(docs: &[Vec<S>], vocabulary: &Vocabulary) -> MembershipIndex {
    let mut postings: BTreeMap<TermId, Vec<DocId>> = BTreeMap::new();
    for (doc_id, terms) in docs.iter().enumerate() {
        for tid in term_frequencies(terms, vocabulary).into_keys() {
            postings.entry(tid).or_default().push(doc_id as DocId);
        }
    }
    MembershipIndex { postings, num_docs: docs.len() as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::{build_vocabulary, VocabularyStrategy};
    use crate::weights::{build_weights, IdfScheme};

    fn built() -> (crate::vocabulary::Vocabulary, WeightMatrix, InvertedIndex) {
        let docs = vec![
            vec!["pizza", "oven"],
            vec!["pasta"],
            vec!["pizza", "pasta", "pizza"],
            vec!["wine"],
        ];
        let vocab = build_vocabulary(&docs, VocabularyStrategy::DocFrequencyUnfiltered).unwrap();
        let m = build_weights(&docs, &vocab, IdfScheme::Standard);
        let idx = build_index(&m);
        (vocab, m, idx)
    }

    #[test]
    fn postings_mirror_the_matrix() {
        let (vocab, m, idx) = built();
        let pizza = vocab.id("pizza").unwrap();
        let plist = idx.postings(pizza).unwrap();
        assert_eq!(plist.iter().map(|p| p.doc_id).collect::<Vec<_>>(), vec![0, 2]);
        for p in plist {
            assert_eq!(p.weight, m.weight(p.doc_id, pizza));
        }
        assert_eq!(idx.num_postings(), m.nnz());
        assert!(idx.check(vocab.len()).is_ok());
    }

    #[test]
    fn check_rejects_unordered_postings() {
        let (vocab, _, mut idx) = built();
        let pizza = vocab.id("pizza").unwrap();
        idx.postings.get_mut(&pizza).unwrap().reverse();
        assert!(idx.check(vocab.len()).is_err());
    }

    #[test]
    fn membership_keeps_terms_with_zero_weight() {
        let docs = vec![vec!["pizza", "wine"], vec!["pizza", "oven"], vec!["pizza"]];
        let vocab = build_vocabulary(&docs, VocabularyStrategy::DocFrequencyUnfiltered).unwrap();
        let pizza = vocab.id("pizza").unwrap();

        let ranked = build_index(&build_weights(&docs, &vocab, IdfScheme::Standard));
        assert!(ranked.postings(pizza).is_none());

        let members = build_membership(&docs, &vocab);
        assert_eq!(members.docs(pizza), Some(&[0, 1, 2][..]));
        assert!(members.check(vocab.len()).is_ok());
    }

    #[test]
    fn empty_matrix_gives_empty_index() {
        let docs: Vec<Vec<String>> = Vec::new();
        let vocab = build_vocabulary(&docs, VocabularyStrategy::DocFrequencyUnfiltered).unwrap();
        let idx = build_index(&build_weights(&docs, &vocab, IdfScheme::Standard));
        assert_eq!(idx.num_terms(), 0);
        assert_eq!(idx.num_docs, 0);
    }
}
