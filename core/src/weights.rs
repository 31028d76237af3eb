//! Sparse document × term TF-IDF matrix.

use crate::vocabulary::Vocabulary;
use crate::{DocId, TermId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfScheme {
    /// `ln(N / df)`
    #[default]
    Standard,
    /// `ln(1 + N / df)`, never zero for indexed terms
    Smoothed,
}

impl IdfScheme {
    pub fn idf(self, num_docs: u32, df: u32) -> f32 {
        if df == 0 {
            return 0.0;
        }
        let ratio = num_docs as f32 / df as f32;
        match self {
            IdfScheme::Standard => ratio.ln(),
            IdfScheme::Smoothed => (1.0 + ratio).ln(),
        }
    }
}

/// Raw in-vocabulary term counts for one normalized term sequence.
/// Out-of-vocabulary terms are dropped.
pub fn term_frequencies<S: AsRef<str>>(terms: &[S], vocabulary: &Vocabulary) -> BTreeMap<TermId, u32> {
    let mut tf = BTreeMap::new();
    for term in terms {
        if let Some(tid) = vocabulary.id(term.as_ref()) {
            *tf.entry(tid).or_insert(0) += 1;
        }
    }
    tf
}

/// Only nonzero weights are stored; each row is sorted by term id.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    rows: Vec<Vec<(TermId, f32)>>,
    df: Vec<u32>,
    idf: Vec<f32>,
}

impl WeightMatrix {
    pub fn num_docs(&self) -> u32 { self.rows.len() as u32 }

    pub fn num_terms(&self) -> usize { self.idf.len() }

    pub fn row(&self, doc: DocId) -> &[(TermId, f32)] {
        self.rows.get(doc as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = (DocId, &[(TermId, f32)])> {
        self.rows.iter().enumerate().map(|(d, r)| (d as DocId, r.as_slice()))
    }

    pub fn weight(&self, doc: DocId, term: TermId) -> f32 {
        let row = self.row(doc);
        row.binary_search_by_key(&term, |&(t, _)| t).map(|i| row[i].1).unwrap_or(0.0)
    }

    pub fn df(&self) -> &[u32] { &self.df }

    pub fn idf(&self) -> &[f32] { &self.idf }

    /// Euclidean norm of every document row.
    pub fn norms(&self) -> Vec<f32> {
        self.rows
            .par_iter()
            .map(|row| row.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt())
            .collect()
    }

    pub fn nnz(&self) -> usize { self.rows.iter().map(Vec::len).sum() }
}

/// Compute `w(d,t) = tf(d,t) × idf(t)` for every document.
///
/// Document frequencies are fully counted before any weight is computed.
pub fn build_weights<S: AsRef<str> + Sync>(docs: &[Vec<S>], vocabulary: &Vocabulary, scheme: IdfScheme) -> WeightMatrix {
    let tfs: Vec<BTreeMap<TermId, u32>> = docs.par_iter().map(|terms| term_frequencies(terms, vocabulary)).collect();

    let mut df = vec![0u32; vocabulary.len()];
    for tf in &tfs {
        for &tid in tf.keys() {
            df[tid as usize] += 1;
        }
    }
    let num_docs = docs.len() as u32;
    let idf: Vec<f32> = df.iter().map(|&d| scheme.idf(num_docs, d)).collect();

    let rows = tfs
        .into_par_iter()
        .map(|tf| {
            tf.into_iter()
                .map(|(tid, count)| (tid, count as f32 * idf[tid as usize]))
                .filter(|&(_, w)| w > 0.0)
                .collect()
        })
        .collect();

    WeightMatrix { rows, df, idf }
}
