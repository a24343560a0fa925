// Topic heat index: the most-mentioned topics regardless of repetition
// rules. Used by the report when there is nothing to predict.

use crate::models::HeatEntry;

use super::frequency::FrequencyReport;

const HEAT_INDEX_SIZE: usize = 15;

/// Heat level 1 to 3 for a mention count.
pub fn heat_level(mentions: usize) -> u8 {
    match mentions {
        0 | 1 => 1,
        2 => 2,
        _ => 3,
    }
}

/// Top topics by mention count. Ties keep first-seen order.
pub fn heat_index(report: &FrequencyReport) -> Vec<HeatEntry> {
    let mut entries: Vec<HeatEntry> = report
        .unique_topics
        .iter()
        .map(|s| HeatEntry {
            topic: s.topic.clone(),
            mentions: s.frequency,
            heat: heat_level(s.frequency),
        })
        .collect();
    entries.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    entries.truncate(HEAT_INDEX_SIZE);
    entries
}
