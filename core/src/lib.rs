pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod pipeline;
pub mod search;
pub mod tokenizer;
pub mod vocabulary;
pub mod weights;

pub type TermId = u32;
pub type DocId = u32;

pub use corpus::{load_corpus, Corpus, Document, RestaurantPayload};
pub use engine::{Hit, SearchEngine, SearchMode, SearchResults};
pub use error::{Error, Result};
pub use index::{build_index, build_membership, InvertedIndex, MembershipIndex, Posting};
pub use pipeline::{build_pipeline, BuiltIndex, IndexConfig};
pub use search::{search_conjunctive, search_ranked, ScoredDoc};
pub use tokenizer::normalize;
pub use vocabulary::{build_vocabulary, Vocabulary, VocabularyStrategy};
pub use weights::{build_weights, IdfScheme, WeightMatrix};
