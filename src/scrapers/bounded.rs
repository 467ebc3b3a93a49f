//! Bounded-concurrency fetch primitive.
//!
//! Runs a fetch function over a set of descriptors with at most `K` calls in
//! flight and hands results back as they complete, in completion order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, Semaphore};
use tracing::debug;

/// Default number of simultaneous in-flight fetches.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Executes fetches with a fixed cap on in-flight operations.
#[derive(Debug, Clone, Copy)]
pub struct BoundedFetcher {
    concurrency: usize,
}

impl Default for BoundedFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BoundedFetcher {
    /// Create a fetcher allowing `concurrency` fetches at once (minimum 1).
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every descriptor exactly once.
    ///
    /// `fetch` must not fail outward: a descriptor that produces `None` simply
    /// yields nothing. The returned stream ends once every descriptor has been
    /// attempted. Dropping the stream stops new fetches from starting; fetches
    /// already in flight run to completion and their results are discarded.
    pub fn fetch<D, T, F, Fut>(
        &self,
        descriptors: impl IntoIterator<Item = D>,
        fetch: F,
    ) -> FetchStream<T>
    where
        D: Send + 'static,
        T: Send + 'static,
        F: Fn(D) -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let descriptors: Vec<D> = descriptors.into_iter().collect();
        let total = descriptors.len();
        let (tx, receiver) = mpsc::channel(self.concurrency);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        tokio::spawn(async move {
            for descriptor in descriptors {
                if tx.is_closed() {
                    debug!("Fetch consumer went away, not starting remaining work");
                    break;
                }

                // The permit is held until the result is handed off, so at
                // most `concurrency` results are ever buffered or in flight.
                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };

                let tx = tx.clone();
                let task = fetch(descriptor);
                tokio::spawn(async move {
                    if let Some(result) = task.await {
                        let _ = tx.send(result).await;
                    }
                    drop(permit);
                });
            }
        });

        FetchStream { receiver, total }
    }
}

/// Results of a [`BoundedFetcher::fetch`] call, in completion order.
pub struct FetchStream<T> {
    receiver: mpsc::Receiver<T>,
    total: usize,
}

impl<T> FetchStream<T> {
    /// Number of descriptors submitted (not the number of results).
    pub fn total(&self) -> usize {
        self.total
    }

    /// Wait for the next completed result.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }
}

impl<T> Stream for FetchStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
