use crate::corpus::Document;
use crate::error::Result;
use crate::index::{build_index, build_membership, InvertedIndex, MembershipIndex};
use crate::tokenizer::normalize;
use crate::vocabulary::{build_vocabulary, Vocabulary, VocabularyStrategy};
use crate::weights::{build_weights, IdfScheme, WeightMatrix};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub strategy: VocabularyStrategy,
    pub idf: IdfScheme,
}

impl IndexConfig {
    /// Ranked side admits every term too, same as the boolean side.
    pub fn unfiltered() -> Self {
        Self { strategy: VocabularyStrategy::DocFrequencyUnfiltered, idf: IdfScheme::Standard }
    }
}

/// Every artifact of one corpus snapshot.
///
/// `vocabulary`/`index` follow `config` and serve ranked queries.
/// `boolean_vocabulary`/`membership` are always unfiltered and serve
/// conjunctive queries.
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub config: IndexConfig,
    pub vocabulary: Vocabulary,
    pub matrix: WeightMatrix,
    pub index: InvertedIndex,
    pub boolean_vocabulary: Vocabulary,
    pub membership: MembershipIndex,
}

/// Normalize every document, in parallel, preserving corpus order.
pub fn normalize_corpus(documents: &[Document]) -> Vec<Vec<String>> {
    documents.par_iter().map(|d| normalize(&d.text)).collect()
}

/// Both engines from scratch: unfiltered vocabulary → membership index, and
/// configured vocabulary → weight matrix → inverted index.
pub fn build_pipeline(documents: &[Document], config: IndexConfig) -> Result<BuiltIndex> {
    config.strategy.validate()?;
    let terms = normalize_corpus(documents);

    let boolean_vocabulary = build_vocabulary(&terms, VocabularyStrategy::DocFrequencyUnfiltered)?;
    let membership = build_membership(&terms, &boolean_vocabulary);

    let vocabulary = match config.strategy {
        VocabularyStrategy::DocFrequencyUnfiltered => boolean_vocabulary.clone(),
        strategy => build_vocabulary(&terms, strategy)?,
    };
    let matrix = build_weights(&terms, &vocabulary, config.idf);
    let index = build_index(&matrix);
    tracing::info!(
        num_docs = documents.len(),
        num_terms = vocabulary.len(),
        boolean_terms = boolean_vocabulary.len(),
        indexed_terms = index.num_terms(),
        num_postings = index.num_postings(),
        "index build complete"
    );
    Ok(BuiltIndex { config, vocabulary, matrix, index, boolean_vocabulary, membership })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, RestaurantPayload};
    use crate::error::Error;

    fn corpus() -> Corpus {
        let mut c = Corpus::new();
        for (name, text) in [
            ("A", "Wood fired pizza and craft beer"),
            ("B", "Pizza, pasta and Italian desserts"),
            ("C", "Ramen noodles, gyoza and craft beer"),
        ] {
            c.push(text, RestaurantPayload { name: name.into(), ..Default::default() });
        }
        c
    }

    #[test]
    fn builds_every_stage() {
        let c = corpus();
        let built = build_pipeline(c.documents(), IndexConfig::unfiltered()).unwrap();
        assert!(built.vocabulary.id("pizza").is_some());
        assert_eq!(built.boolean_vocabulary, built.vocabulary);
        assert_eq!(built.matrix.num_docs(), 3);
        assert_eq!(built.index.num_docs, 3);
        assert_eq!(built.index.num_postings(), built.matrix.nnz());
    }

    #[test]
    fn boolean_side_ignores_the_ranked_filter() {
        let c = corpus();
        let built = build_pipeline(c.documents(), IndexConfig::default()).unwrap();
        // "ramen" occurs once, below the default minimum of 2
        assert!(built.vocabulary.id("ramen").is_none());
        let ramen = built.boolean_vocabulary.id("ramen").unwrap();
        assert_eq!(built.membership.docs(ramen), Some(&[2][..]));
    }

    #[test]
    fn bad_bounds_fail_before_work() {
        let c = corpus();
        let config = IndexConfig {
            strategy: VocabularyStrategy::OccurrenceCountFiltered { min: 3, max: 1 },
            idf: IdfScheme::Standard,
        };
        assert!(matches!(build_pipeline(c.documents(), config), Err(Error::InvalidFrequencyBounds { .. })));
    }

    #[test]
    fn empty_corpus_is_not_an_error() {
        let built = build_pipeline(&[], IndexConfig::default()).unwrap();
        assert!(built.vocabulary.is_empty());
        assert_eq!(built.index.num_terms(), 0);
    }
}
