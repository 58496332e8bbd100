use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};

/// Runs independent tasks on the tokio runtime with a cap on how many are in flight.
///
/// Results come back in submission order, whatever order the tasks finish in.
/// A task that panics is reported as its own `Err` and does not affect the others.
#[derive(Debug, Clone, Copy)]
pub struct TaskRunner {
    limit: usize,
}

impl TaskRunner {
    /// `limit` is clamped to at least one task in flight.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn unbounded() -> Self {
        Self { limit: usize::MAX }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn run<T, R, F, Fut>(&self, tasks: Vec<T>, task_fn: F) -> Vec<Result<R, JoinError>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = tasks.len();
        let task_fn = Arc::new(task_fn);
        let mut pending = tasks.into_iter().enumerate();
        let mut set = JoinSet::new();
        let mut positions = HashMap::with_capacity(total.min(self.limit));
        let mut results: Vec<Option<Result<R, JoinError>>> = (0..total).map(|_| None).collect();

        loop {
            while set.len() < self.limit {
                let Some((index, task)) = pending.next() else {
                    break;
                };
                let task_fn = task_fn.clone();
                let handle = set.spawn(async move { task_fn(task).await });
                positions.insert(handle.id(), index);
            }

            let Some(joined) = set.join_next_with_id().await else {
                break;
            };
            let (id, outcome) = match joined {
                Ok((id, value)) => (id, Ok(value)),
                Err(e) => (e.id(), Err(e)),
            };
            if let Some(index) = positions.remove(&id) {
                results[index] = Some(outcome);
            }
        }

        results.into_iter().flatten().collect()
    }
}
