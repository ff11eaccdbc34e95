//! Bounded worker pool for per-item fan-out.
//!
//! All three phases submit every item up front and bound actual
//! concurrency with a semaphore; the pool always drains all submitted
//! work regardless of individual outcomes. Results are collected per
//! task and merged after the drain, then restored to submission order,
//! so no shared mutable collection exists between workers.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// Per-phase outcome counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseSummary {
    pub ok: usize,
    pub failed: usize,
}

impl PhaseSummary {
    pub fn total(&self) -> usize {
        self.ok + self.failed
    }

    /// True when no item failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Run `task` over `items` with at most `workers` running at once.
///
/// Returns one result per completed item, in submission order. Items
/// whose task panicked are dropped after logging; tasks are expected
/// to catch their own failures and return a record for them.
pub async fn fan_out<I, R, F, Fut>(workers: usize, items: Vec<I>, task: F) -> Vec<R>
where
    I: Send + 'static,
    R: Send + 'static,
    F: Fn(usize, I) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut set = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let task = task.clone();
        set.spawn(async move {
            // The semaphore is never closed; holding the Option keeps
            // the permit alive for the task's duration either way.
            let _permit = semaphore.acquire_owned().await.ok();
            (index, task(index, item).await)
        });
    }

    let mut indexed: Vec<(usize, R)> = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(pair) => indexed.push(pair),
            Err(e) => error!("Worker task failed to complete: {}", e),
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, result)| result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn results_come_back_in_submission_order() {
        let items: Vec<u64> = vec![30, 10, 20, 5];
        let results = fan_out(4, items, |index, delay_ms| async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            index
        })
        .await;
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<usize> = (0..16).collect();
        let (running_c, peak_c) = (Arc::clone(&running), Arc::clone(&peak));
        fan_out(3, items, move |_, _| {
            let running = Arc::clone(&running_c);
            let peak = Arc::clone(&peak_c);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn every_item_yields_a_result() {
        let results = fan_out(2, (0..100).collect::<Vec<_>>(), |_, n: i32| async move {
            n * 2
        })
        .await;
        assert_eq!(results.len(), 100);
        assert_eq!(results[99], 198);
    }

    #[test]
    fn summary_counts() {
        let summary = PhaseSummary { ok: 3, failed: 1 };
        assert_eq!(summary.total(), 4);
        assert!(!summary.is_clean());
        assert!(PhaseSummary { ok: 2, failed: 0 }.is_clean());
    }
}
