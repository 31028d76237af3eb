//! Vocabulary construction.
//!
//! Two admission policies exist and are kept apart on purpose: the boolean
//! engine admits every distinct term, the ranked engine admits terms whose
//! corpus-wide occurrence count lies in `[min, max]`.

use crate::error::{Error, Result};
use crate::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VocabularyStrategy {
    /// Every distinct normalized term is admitted.
    DocFrequencyUnfiltered,
    /// Admit `t` iff `min <= occurrences(t) <= max`, counted over all tokens.
    OccurrenceCountFiltered { min: u32, max: u32 },
}

impl VocabularyStrategy {
    pub const DEFAULT_MIN_FREQUENCY: u32 = 2;
    pub const DEFAULT_MAX_FREQUENCY: u32 = 1800;

    pub fn occurrence_filtered(min: u32, max: u32) -> Result<Self> {
        let strategy = VocabularyStrategy::OccurrenceCountFiltered { min, max };
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            VocabularyStrategy::OccurrenceCountFiltered { min, max } if min > max => {
                Err(Error::InvalidFrequencyBounds { min, max })
            }
            _ => Ok(()),
        }
    }
}

impl Default for VocabularyStrategy {
    fn default() -> Self {
        VocabularyStrategy::OccurrenceCountFiltered {
            min: Self::DEFAULT_MIN_FREQUENCY,
            max: Self::DEFAULT_MAX_FREQUENCY,
        }
    }
}

/// One row of the persisted term table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRow {
    pub term_id: TermId,
    pub term: String,
}

/// Bijection between admitted terms and dense ids `0..len`, assigned in
/// ascending lexicographic order of the term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

impl Vocabulary {
    /// Build from terms already in ascending order without duplicates.
    fn from_sorted(terms: Vec<String>) -> Self {
        let ids = terms.iter().enumerate().map(|(i, t)| (t.clone(), i as TermId)).collect();
        Self { terms, ids }
    }

    /// Rebuild from persisted rows; ids must be `0..n` in order and terms strictly ascending.
    pub fn from_rows(rows: Vec<TermRow>) -> std::result::Result<Self, String> {
        let mut terms = Vec::with_capacity(rows.len());
        for (expected, row) in rows.into_iter().enumerate() {
            if row.term_id as usize != expected {
                return Err(format!("term id {} at row {expected}", row.term_id));
            }
            if let Some(prev) = terms.last() {
                if *prev >= row.term {
                    return Err(format!("term {:?} out of order", row.term));
                }
            }
            terms.push(row.term);
        }
        Ok(Self::from_sorted(terms))
    }

    pub fn rows(&self) -> impl Iterator<Item = TermRow> + '_ {
        self.terms.iter().enumerate().map(|(i, t)| TermRow { term_id: i as TermId, term: t.clone() })
    }

    pub fn id(&self, term: &str) -> Option<TermId> { self.ids.get(term).copied() }

    pub fn term(&self, id: TermId) -> Option<&str> { self.terms.get(id as usize).map(String::as_str) }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn terms(&self) -> &[String] { &self.terms }
}

/// Build a vocabulary from per-document normalized term sequences.
pub fn build_vocabulary<S: AsRef<str>>(docs: &[Vec<S>], strategy: VocabularyStrategy) -> Result<Vocabulary> {
    strategy.validate()?;
    let terms: Vec<String> = match strategy {
        VocabularyStrategy::DocFrequencyUnfiltered => {
            let distinct: BTreeSet<&str> = docs.iter().flatten().map(|t| t.as_ref()).collect();
            distinct.into_iter().map(str::to_owned).collect()
        }
        VocabularyStrategy::OccurrenceCountFiltered { min, max } => {
            let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
            for term in docs.iter().flatten() {
                *counts.entry(term.as_ref()).or_insert(0) += 1;
            }
            counts
                .into_iter()
                .filter(|&(_, c)| min <= c && c <= max)
                .map(|(t, _)| t.to_owned())
                .collect()
        }
    };
    tracing::debug!(?strategy, num_terms = terms.len(), "built vocabulary");
    Ok(Vocabulary::from_sorted(terms))
}
