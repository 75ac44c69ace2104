use futures::stream::{self, StreamExt};
use std::future::Future;

/// Runs per-symbol jobs with a cap on how many are in flight at once.
///
/// Results are returned in input order regardless of completion order.
#[derive(Debug, Clone, Copy)]
pub struct FetchQueue {
    max_in_flight: usize,
}

impl FetchQueue {
    /// A cap of zero is raised to one.
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
        }
    }

    /// A queue that runs one job at a time.
    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub async fn run<I, F, Fut, T>(&self, items: I, job: F) -> Vec<T>
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        stream::iter(items)
            .map(job)
            .buffered(self.max_in_flight)
            .collect()
            .await
    }
}

impl Default for FetchQueue {
    fn default() -> Self {
        Self::sequential()
    }
}
