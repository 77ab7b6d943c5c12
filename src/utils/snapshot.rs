use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::retry::{retry_cas, CasError, RetriesExhausted, RetryConfig};

// ============================================================================
// Copy-on-Write Snapshot List
// ============================================================================
//
// An ordered collection published through a single atomically swappable
// pointer. Readers load an immutable `Arc<Vec<T>>` and never see a half
// built list. Writers copy the observed snapshot, mutate the copy and
// publish it with compare-and-swap; a stale observation loses the race and
// is retried under the caller's `RetryConfig`.
//
// ============================================================================

pub struct SnapshotList<T> {
    current: ArcSwap<Vec<T>>,
}

impl<T: fmt::Debug> fmt::Debug for SnapshotList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.current.load().iter()).finish()
    }
}

impl<T> Default for SnapshotList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotList<T> {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Current snapshot. It is never mutated after publication.
    pub fn load(&self) -> Arc<Vec<T>> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl<T: Clone> SnapshotList<T> {
    pub fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.current.load().iter().find(|item| predicate(*item)).cloned()
    }

    /// Apply `mutate` to the latest snapshot and publish the result.
    ///
    /// `mutate` returning `None` means there is nothing to change; the list is
    /// left as is and `Ok(None)` is returned. The closure may run once per
    /// attempt, so it must not have side effects.
    pub async fn update<F>(
        &self,
        config: &RetryConfig,
        operation: &'static str,
        mut mutate: F,
    ) -> Result<Option<Arc<Vec<T>>>, RetriesExhausted>
    where
        F: FnMut(&[T]) -> Option<Vec<T>>,
    {
        retry_cas(config, operation, |_attempt| {
            let observed = self.current.load_full();
            let Some(next) = mutate(&observed[..]) else {
                return Ok(None);
            };

            let next = Arc::new(next);
            let previous = self.current.compare_and_swap(&observed, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &observed) {
                Ok(Some(next))
            } else {
                Err(CasError::<RetriesExhausted>::LostRace)
            }
        })
        .await
    }

    /// Append `item`, returning the length of the published snapshot
    pub async fn push(
        &self,
        item: T,
        config: &RetryConfig,
        operation: &'static str,
    ) -> Result<usize, RetriesExhausted> {
        let published = self
            .update(config, operation, |items| {
                let mut next = Vec::with_capacity(items.len() + 1);
                next.extend_from_slice(items);
                next.push(item.clone());
                Some(next)
            })
            .await?;

        Ok(published.map(|items| items.len()).unwrap_or_default())
    }

    /// Remove every element matching `predicate`.
    ///
    /// Returns `false` without touching the list when nothing matches.
    pub async fn remove_where<P>(
        &self,
        predicate: P,
        config: &RetryConfig,
        operation: &'static str,
    ) -> Result<bool, RetriesExhausted>
    where
        P: Fn(&T) -> bool,
    {
        let published = self
            .update(config, operation, |items| {
                if !items.iter().any(&predicate) {
                    return None;
                }
                Some(items.iter().filter(|item| !predicate(*item)).cloned().collect())
            })
            .await?;

        Ok(published.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn no_backoff() -> RetryConfig {
        RetryConfig::new(3, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_push_preserves_insertion_order() {
        let list = SnapshotList::new();
        for value in ["a", "b", "c"] {
            list.push(value, &no_backoff(), "push").await.unwrap();
        }

        assert_eq!(*list.load(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_published_snapshot_is_not_mutated_by_later_writes() {
        let list = SnapshotList::new();
        list.push(1, &no_backoff(), "push").await.unwrap();

        let before = list.load();
        list.push(2, &no_backoff(), "push").await.unwrap();

        assert_eq!(*before, vec![1]);
        assert_eq!(*list.load(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let list = SnapshotList::new();
        list.push(1, &no_backoff(), "push").await.unwrap();
        let before = list.load();

        let removed = list.remove_where(|v| *v == 42, &no_backoff(), "remove").await.unwrap();

        assert!(!removed);
        assert!(Arc::ptr_eq(&before, &list.load()));
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_prior_content() {
        let list = SnapshotList::new();
        for value in [1, 2, 3] {
            list.push(value, &no_backoff(), "push").await.unwrap();
        }

        list.push(99, &no_backoff(), "push").await.unwrap();
        let removed = list.remove_where(|v| *v == 99, &no_backoff(), "remove").await.unwrap();

        assert!(removed);
        assert_eq!(*list.load(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_constant_interference_exhausts_retries() {
        let list = SnapshotList::new();
        let mut attempts = 0;

        let result = list
            .update(&no_backoff(), "contended_push", |items| {
                attempts += 1;
                // Another writer publishes between our read and our swap
                list.current.store(Arc::new(vec![attempts]));
                let mut next = items.to_vec();
                next.push(0);
                Some(next)
            })
            .await;

        assert_eq!(
            result,
            Err(RetriesExhausted {
                operation: "contended_push",
                attempts: 3
            })
        );
        assert_eq!(attempts, 3);
        // The interfering writer's snapshot survives; ours was abandoned whole
        assert_eq!(*list.load(), vec![3]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_pushes_are_never_lost() {
        let list = Arc::new(SnapshotList::new());
        let mut tasks = tokio::task::JoinSet::new();

        for i in 0..32 {
            let list = Arc::clone(&list);
            tasks.spawn(async move { list.push(i, &RetryConfig::default(), "push").await });
        }

        let mut succeeded = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let Ok(len) = joined.unwrap() {
                succeeded.push(len);
            }
        }

        let snapshot = list.load();
        assert_eq!(snapshot.len(), succeeded.len());
        let mut values = snapshot.to_vec();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), snapshot.len());
    }
}
