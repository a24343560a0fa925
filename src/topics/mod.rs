// Topic mining, normalization and semantic grouping.

pub mod clean;
pub mod miner;
pub mod normalize;
pub mod semantic;
pub mod similarity;
pub mod tfidf;
pub mod traits;
pub mod vocabulary;

pub use miner::PhraseMiner;
pub use traits::TopicExtractor;
pub use vocabulary::AcademicVocabulary;
