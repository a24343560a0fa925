// Topic extractor trait: the seam between mining and everything downstream.
//
// The default implementation is the pattern-based PhraseMiner. A model-based
// extractor could replace it without touching frequency analysis, scoring or
// semantic grouping, which only see canonical topics.

use crate::models::Topic;

/// Trait for mining canonical topics from the text of one document.
pub trait TopicExtractor: Send + Sync {
    /// Return the distinct topics found in `text`, in discovery order.
    /// Must be deterministic: the same text always yields the same list.
    fn extract(&self, text: &str) -> Vec<Topic>;
}
