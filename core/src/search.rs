//! Query evaluation against the inverted index: boolean conjunction and
//! ranked cosine similarity.

use crate::error::{Error, Result};
use crate::index::{InvertedIndex, MembershipIndex};
use crate::tokenizer::normalize;
use crate::vocabulary::Vocabulary;
use crate::weights::term_frequencies;
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

/// Documents containing every query term that resolves to an indexed term.
///
/// Runs over the unfiltered vocabulary and its membership index; weights
/// play no part. Terms missing from the vocabulary add no constraint. If
/// none resolve, or the intersection runs dry, the result is empty.
pub fn search_conjunctive(query: &str, index: &MembershipIndex, vocabulary: &Vocabulary) -> BTreeSet<DocId> {
    let terms: BTreeSet<String> = normalize(query).into_iter().collect();
    let mut matching: Option<BTreeSet<DocId>> = None;
    for term in &terms {
        let Some(members) = vocabulary.id(term).and_then(|tid| index.docs(tid)) else {
            continue;
        };
        let docs = members.iter().copied();
        let next: BTreeSet<DocId> = match matching {
            None => docs.collect(),
            Some(current) => docs.filter(|d| current.contains(d)).collect(),
        };
        if next.is_empty() {
            return next;
        }
        matching = Some(next);
    }
    matching.unwrap_or_default()
}

/// Query vector `tf(q,t) × idf(t)` over indexed terms with nonzero weight.
pub fn query_weights(query: &str, index: &InvertedIndex, vocabulary: &Vocabulary) -> BTreeMap<TermId, f32> {
    term_frequencies(&normalize(query), vocabulary)
        .into_iter()
        .filter(|(tid, _)| index.postings(*tid).is_some())
        .map(|(tid, tf)| (tid, tf as f32 * index.idf(tid)))
        .filter(|&(_, w)| w > 0.0)
        .collect()
}

/// Top `k` documents by cosine similarity, score descending, ties broken by
/// ascending doc id. Only documents sharing a term with the query are scored.
pub fn search_ranked(query: &str, index: &InvertedIndex, vocabulary: &Vocabulary, k: usize) -> Result<Vec<ScoredDoc>> {
    if k == 0 {
        return Err(Error::InvalidTopK);
    }
    let q_weights = query_weights(query, index, vocabulary);
    if q_weights.is_empty() {
        return Ok(Vec::new());
    }
    let q_norm = q_weights.values().map(|w| w * w).sum::<f32>().sqrt();

    let mut dots: HashMap<DocId, f32> = HashMap::new();
    for (&tid, &q_w) in &q_weights {
        for p in index.postings(tid).unwrap_or_default() {
            *dots.entry(p.doc_id).or_insert(0.0) += q_w * p.weight;
        }
    }

    let mut scored: Vec<ScoredDoc> = dots
        .into_iter()
        .filter_map(|(doc_id, dot)| {
            let d_norm = index.doc_norm(doc_id);
            (d_norm > 0.0).then(|| ScoredDoc { doc_id, score: dot / (q_norm * d_norm) })
        })
        .collect();
    scored.sort_by(rank_order);
    scored.truncate(k);
    Ok(scored)
}

fn rank_order(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{build_index, build_membership};
    use crate::vocabulary::{build_vocabulary, VocabularyStrategy};
    use crate::weights::{build_weights, IdfScheme, WeightMatrix};

    const TEXTS: &[&str] = &[
        "Seafood by the harbour, grilled fish and oysters.",
        "Family trattoria with handmade pasta.",
        "Sushi counter and sake bar.",
        "Italian pizza from a wood oven, Italian wines.",
        "Vegan bistro, seasonal vegetables.",
        "Steakhouse with dry aged beef.",
        "Cocktail bar with small plates.",
        "Italian cooking in a quiet courtyard.",
        "Pizza al taglio to take away.",
    ];

    fn fixture(strategy: VocabularyStrategy) -> (Vocabulary, WeightMatrix, InvertedIndex) {
        let docs: Vec<Vec<String>> = TEXTS.iter().map(|t| normalize(t)).collect();
        let vocab = build_vocabulary(&docs, strategy).unwrap();
        let m = build_weights(&docs, &vocab, IdfScheme::Standard);
        let idx = build_index(&m);
        (vocab, m, idx)
    }

    fn membership(texts: &[&str]) -> (Vocabulary, MembershipIndex) {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| normalize(t)).collect();
        let vocab = build_vocabulary(&docs, VocabularyStrategy::DocFrequencyUnfiltered).unwrap();
        let members = build_membership(&docs, &vocab);
        (vocab, members)
    }

    #[test]
    fn conjunction_keeps_documents_with_all_terms() {
        let (vocab, idx) = membership(TEXTS);
        let hits = search_conjunctive("italian pizza", &idx, &vocab);
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn conjunction_matches_terms_present_everywhere() {
        let (vocab, idx) = membership(&["Pizza and wine", "Pizza from a wood oven", "Pizza al taglio"]);
        let hits = search_conjunctive("pizza", &idx, &vocab);
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);

        let (vocab, idx) = membership(&["Pizza from a wood oven"]);
        let hits = search_conjunctive("pizza oven", &idx, &vocab);
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn conjunction_ignores_unknown_terms() {
        let (vocab, idx) = membership(TEXTS);
        let hits = search_conjunctive("italian zanzibar", &idx, &vocab);
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![3, 7]);
        assert!(search_conjunctive("zanzibar quokka", &idx, &vocab).is_empty());
        assert!(search_conjunctive("sushi steakhouse", &idx, &vocab).is_empty());
    }

    #[test]
    fn stopword_only_queries_are_empty() {
        let (bool_vocab, members) = membership(TEXTS);
        assert!(search_conjunctive("the and of", &members, &bool_vocab).is_empty());
        let (vocab, _, idx) = fixture(VocabularyStrategy::DocFrequencyUnfiltered);
        assert!(search_ranked("the and of", &idx, &vocab, 5).unwrap().is_empty());
    }

    #[test]
    fn zero_k_is_rejected() {
        let (vocab, _, idx) = fixture(VocabularyStrategy::DocFrequencyUnfiltered);
        assert!(matches!(search_ranked("pizza", &idx, &vocab, 0), Err(Error::InvalidTopK)));
    }

    #[test]
    fn ranked_matches_dense_cosine() {
        let (vocab, m, idx) = fixture(VocabularyStrategy::DocFrequencyUnfiltered);
        let query = "italian pizza wine";
        let hits = search_ranked(query, &idx, &vocab, 10).unwrap();
        assert!(!hits.is_empty());

        let q = query_weights(query, &idx, &vocab);
        let q_norm = q.values().map(|w| w * w).sum::<f32>().sqrt();
        for hit in &hits {
            let row = m.row(hit.doc_id);
            let dot: f32 = row.iter().map(|&(t, w)| w * q.get(&t).copied().unwrap_or(0.0)).sum();
            let d_norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            assert!((hit.score - dot / (q_norm * d_norm)).abs() < 1e-5);
        }
        assert_eq!(hits[0].doc_id, 3);
    }

    #[test]
    fn ranked_respects_k_and_order() {
        let (vocab, _, idx) = fixture(VocabularyStrategy::DocFrequencyUnfiltered);
        let hits = search_ranked("italian pizza bar oven fish", &idx, &vocab, 5).unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));

        let few = search_ranked("sushi", &idx, &vocab, 5).unwrap();
        assert_eq!(few.len(), 1);
        assert_eq!(few[0].doc_id, 2);
        assert!(few[0].score > 0.0 && few[0].score <= 1.0 + 1e-6);
    }

    #[test]
    fn equal_scores_break_ties_by_doc_id() {
        let texts = ["pizza oven", "pasta", "pizza oven", "wine"];
        let docs: Vec<Vec<String>> = texts.iter().map(|t| normalize(t)).collect();
        let vocab = build_vocabulary(&docs, VocabularyStrategy::DocFrequencyUnfiltered).unwrap();
        let idx = build_index(&build_weights(&docs, &vocab, IdfScheme::Standard));
        let hits = search_ranked("pizza", &idx, &vocab, 5).unwrap();
        assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn filtered_out_terms_never_touch_postings() {
        let (vocab, _, idx) = fixture(VocabularyStrategy::occurrence_filtered(2, 1800).unwrap());
        assert!(vocab.id("sushi").is_none());
        assert!(query_weights("sushi", &idx, &vocab).is_empty());
        assert!(search_ranked("sushi", &idx, &vocab, 3).unwrap().is_empty());
    }
}
