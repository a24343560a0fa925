// Aggregation and scoring: frequency, likelihood predictions, heat index.

pub mod frequency;
pub mod heat;
pub mod prediction;

pub use frequency::{FrequencyAnalyzer, FrequencyReport};
pub use prediction::PredictionScorer;
