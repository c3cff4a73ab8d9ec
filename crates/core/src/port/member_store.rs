// Ordered Member Store Port (Interface)

use crate::domain::Token;
use crate::error::Result;
use async_trait::async_trait;

/// Shared, externally durable ordered set keyed by opaque member tokens.
///
/// Two independent instances back each admission queue: a *wait* set scored by
/// enqueue time and an *active* set scored by last-seen heartbeat time.
///
/// Every operation must be a single round trip to the backing store; the
/// multi-step sequences composed on top of this trait (rank then touch,
/// count then range) are the documented non-atomic windows of the design.
#[async_trait]
pub trait OrderedMemberStore: Send + Sync {
    /// Insert or update a member's score. No error on duplicate.
    async fn upsert(&self, token: &str, score: i64) -> Result<()>;

    /// Remove zero or more members. No error if absent.
    async fn remove(&self, tokens: &[Token]) -> Result<()>;

    /// 0-based position by ascending score, or `None` if not a member.
    async fn rank(&self, token: &str) -> Result<Option<i64>>;

    /// Current member count.
    async fn count(&self) -> Result<i64>;

    /// Members at inclusive index range `[start, stop]` by ascending score,
    /// fewer if the set is smaller.
    async fn range_ascending(&self, start: i64, stop: i64) -> Result<Vec<Token>>;

    /// Remove members whose score falls in the inclusive `[min, max]` range,
    /// returning the removed count. Used for bulk eviction of stale leases.
    async fn remove_range_by_score(&self, min: i64, max: i64) -> Result<i64>;
}

/// In-memory store for tests and single-process deployments.
pub mod memory {
    use super::*;
    use std::collections::{BTreeSet, HashMap};
    use tokio::sync::Mutex;

    /// Ordered set held in memory.
    ///
    /// Members sort by `(score, token)`, so ties on equal scores break
    /// lexicographically by token, the same secondary order the SQLite
    /// adapter uses.
    #[derive(Default)]
    pub struct MemoryMemberStore {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        ordered: BTreeSet<(i64, Token)>,
        scores: HashMap<Token, i64>,
    }

    impl MemoryMemberStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl OrderedMemberStore for MemoryMemberStore {
        async fn upsert(&self, token: &str, score: i64) -> Result<()> {
            let mut inner = self.inner.lock().await;
            if let Some(old) = inner.scores.insert(token.to_string(), score) {
                inner.ordered.remove(&(old, token.to_string()));
            }
            inner.ordered.insert((score, token.to_string()));
            Ok(())
        }

        async fn remove(&self, tokens: &[Token]) -> Result<()> {
            let mut inner = self.inner.lock().await;
            for token in tokens {
                if let Some(score) = inner.scores.remove(token) {
                    inner.ordered.remove(&(score, token.clone()));
                }
            }
            Ok(())
        }

        async fn rank(&self, token: &str) -> Result<Option<i64>> {
            let inner = self.inner.lock().await;
            let Some(&score) = inner.scores.get(token) else {
                return Ok(None);
            };
            let rank = inner
                .ordered
                .range(..(score, token.to_string()))
                .count() as i64;
            Ok(Some(rank))
        }

        async fn count(&self) -> Result<i64> {
            let inner = self.inner.lock().await;
            Ok(inner.ordered.len() as i64)
        }

        async fn range_ascending(&self, start: i64, stop: i64) -> Result<Vec<Token>> {
            if start < 0 || stop < start {
                return Ok(Vec::new());
            }
            let inner = self.inner.lock().await;
            let take = (stop - start + 1) as usize;
            Ok(inner
                .ordered
                .iter()
                .skip(start as usize)
                .take(take)
                .map(|(_, token)| token.clone())
                .collect())
        }

        async fn remove_range_by_score(&self, min: i64, max: i64) -> Result<i64> {
            let mut inner = self.inner.lock().await;
            let stale: Vec<(i64, Token)> = inner
                .ordered
                .iter()
                .take_while(|(score, _)| *score <= max)
                .filter(|(score, _)| *score >= min)
                .cloned()
                .collect();
            for (score, token) in &stale {
                inner.ordered.remove(&(*score, token.clone()));
                inner.scores.remove(token);
            }
            Ok(stale.len() as i64)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_upsert_and_rank() {
            let store = MemoryMemberStore::new();
            store.upsert("a", 100).await.unwrap();
            store.upsert("b", 200).await.unwrap();
            store.upsert("c", 150).await.unwrap();

            assert_eq!(store.rank("a").await.unwrap(), Some(0));
            assert_eq!(store.rank("c").await.unwrap(), Some(1));
            assert_eq!(store.rank("b").await.unwrap(), Some(2));
            assert_eq!(store.rank("missing").await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_upsert_updates_score() {
            let store = MemoryMemberStore::new();
            store.upsert("a", 100).await.unwrap();
            store.upsert("b", 200).await.unwrap();

            // Touch "a" to the back
            store.upsert("a", 300).await.unwrap();
            assert_eq!(store.rank("a").await.unwrap(), Some(1));
            assert_eq!(store.count().await.unwrap(), 2);
        }

        #[tokio::test]
        async fn test_range_ascending() {
            let store = MemoryMemberStore::new();
            store.upsert("a", 1).await.unwrap();
            store.upsert("b", 2).await.unwrap();
            store.upsert("c", 3).await.unwrap();

            let front = store.range_ascending(0, 1).await.unwrap();
            assert_eq!(front, vec!["a".to_string(), "b".to_string()]);

            // Larger than the set: return what exists
            let all = store.range_ascending(0, 99).await.unwrap();
            assert_eq!(all.len(), 3);

            let empty = store.range_ascending(0, -1).await.unwrap();
            assert!(empty.is_empty());
        }

        #[tokio::test]
        async fn test_remove_range_by_score() {
            let store = MemoryMemberStore::new();
            store.upsert("old1", 100).await.unwrap();
            store.upsert("old2", 200).await.unwrap();
            store.upsert("fresh", 900).await.unwrap();

            let removed = store.remove_range_by_score(0, 500).await.unwrap();
            assert_eq!(removed, 2);
            assert_eq!(store.count().await.unwrap(), 1);
            assert_eq!(store.rank("fresh").await.unwrap(), Some(0));
        }

        #[tokio::test]
        async fn test_remove_absent_is_noop() {
            let store = MemoryMemberStore::new();
            store.upsert("a", 1).await.unwrap();
            store
                .remove(&["missing".to_string(), "a".to_string()])
                .await
                .unwrap();
            assert_eq!(store.count().await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_equal_scores_break_ties_by_token() {
            let store = MemoryMemberStore::new();
            store.upsert("b", 100).await.unwrap();
            store.upsert("a", 100).await.unwrap();

            let order = store.range_ascending(0, 1).await.unwrap();
            assert_eq!(order, vec!["a".to_string(), "b".to_string()]);
        }
    }
}
