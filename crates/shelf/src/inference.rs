//! Topic inference by nearest-neighbor majority vote.
//!
//! A new item gets the most frequent topics among its nearest neighbors in the
//! store. Every topic entry of every neighbor counts once, so a neighbor listing
//! a topic twice votes twice. Ties go to the topic seen first.

use crate::types::{Neighbor, UNKNOWN_TOPIC};
use crate::vector_store::VectorStore;
use topicshelf_core::AppResult;

/// Topic counts in first-encounter order, scoped to one inference call.
#[derive(Debug, Default)]
pub struct TopicTally {
    counts: Vec<(String, usize)>,
}

impl TopicTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally every topic of every neighbor, in neighbor order.
    pub fn from_neighbors(neighbors: &[Neighbor]) -> Self {
        let mut tally = Self::new();
        for neighbor in neighbors {
            for topic in neighbor.record.metadata.topics() {
                tally.record(topic);
            }
        }
        tally
    }

    pub fn record(&mut self, topic: &str) {
        match self.counts.iter_mut().find(|(t, _)| t == topic) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((topic.to_string(), 1)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most frequent topics, ties broken by first encounter.
    pub fn top(mut self, n: usize) -> Vec<String> {
        // sort_by is stable
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
            .into_iter()
            .take(n)
            .map(|(topic, _)| topic)
            .collect()
    }
}

/// Infer topics for `embedding` from its `search_top_k` nearest neighbors.
///
/// Returns at most `num_return` topics, or `["unknown"]` when the store is
/// empty or no neighbor carries a topic.
pub async fn infer_topics(
    store: &dyn VectorStore,
    embedding: &[f32],
    search_top_k: usize,
    num_return: usize,
) -> AppResult<Vec<String>> {
    let neighbors = store.search(embedding, search_top_k).await?;
    let tally = TopicTally::from_neighbors(&neighbors);

    let topics = if tally.is_empty() {
        Vec::new()
    } else {
        tally.top(num_return)
    };

    if topics.is_empty() {
        tracing::debug!(
            "No topics among {} neighbors, using '{}'",
            neighbors.len(),
            UNKNOWN_TOPIC
        );
        return Ok(vec![UNKNOWN_TOPIC.to_string()]);
    }

    tracing::debug!("Inferred topics {:?} from {} neighbors", topics, neighbors.len());
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Metadata, KEY_TOPICS};
    use crate::types::StoreRecord;
    use crate::vector_store::MemoryStore;

    fn record(embedding: Vec<f32>, topics: &[&str]) -> StoreRecord {
        StoreRecord::new(
            "doc",
            embedding,
            Metadata::new().with_list(KEY_TOPICS, topics.iter().map(|t| t.to_string()).collect()),
        )
    }

    #[tokio::test]
    async fn test_empty_store_is_unknown() {
        let store = MemoryStore::new();
        let topics = infer_topics(&store, &[1.0, 0.0], 3, 1).await.unwrap();
        assert_eq!(topics, vec!["unknown"]);
    }

    #[tokio::test]
    async fn test_neighbors_without_topics_are_unknown() {
        let store = MemoryStore::new();
        store
            .add(vec![StoreRecord::new("doc", vec![1.0, 0.0], Metadata::new())])
            .await
            .unwrap();

        let topics = infer_topics(&store, &[1.0, 0.0], 3, 2).await.unwrap();
        assert_eq!(topics, vec!["unknown"]);
    }

    #[tokio::test]
    async fn test_repeated_topic_in_one_neighbor_counts_twice() {
        let store = MemoryStore::new();
        store
            .add(vec![
                record(vec![1.0, 0.0], &["nlp"]),
                record(vec![0.9, 0.1], &["ml", "ml"]),
            ])
            .await
            .unwrap();

        let topics = infer_topics(&store, &[1.0, 0.0], 3, 1).await.unwrap();
        assert_eq!(topics, vec!["ml"]);
    }

    #[tokio::test]
    async fn test_only_top_k_neighbors_vote() {
        let store = MemoryStore::new();
        store
            .add(vec![
                record(vec![1.0, 0.0], &["near"]),
                record(vec![0.0, 1.0], &["far"]),
                record(vec![0.0, 1.0], &["far"]),
            ])
            .await
            .unwrap();

        let topics = infer_topics(&store, &[1.0, 0.0], 1, 1).await.unwrap();
        assert_eq!(topics, vec!["near"]);
    }

    #[test]
    fn test_ties_go_to_first_seen() {
        let mut tally = TopicTally::new();
        for topic in ["vision", "ml", "ml", "vision", "nlp"] {
            tally.record(topic);
        }
        assert_eq!(tally.top(3), vec!["vision", "ml", "nlp"]);
    }

    #[test]
    fn test_top_n_larger_than_tally() {
        let mut tally = TopicTally::new();
        tally.record("a");
        assert_eq!(tally.top(5), vec!["a"]);
    }
}
