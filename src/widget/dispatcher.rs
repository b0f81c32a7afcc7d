use std::future::poll_fn;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::Poll;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::services::SearchIndex;

use super::state::ResultState;

/// Turns query strings into state transitions.
///
/// Empty queries are handled synchronously. Any other query spawns exactly
/// one lookup whose outcome is applied only if no newer input arrived in
/// the meantime. Superseded lookups are left to finish or time out; only
/// unmounting aborts them.
pub struct QueryDispatcher {
    index: Arc<dyn SearchIndex>,
    state: Arc<ResultState>,
    limit: usize,
    timeout: Duration,
    in_flight: Mutex<JoinSet<()>>,
}

impl QueryDispatcher {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        state: Arc<ResultState>,
        limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            index,
            state,
            limit,
            timeout,
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, query: String) {
        let generation = self.state.begin(&query);

        if query.is_empty() {
            debug!(generation, "empty query, results cleared");
            return;
        }

        let index = Arc::clone(&self.index);
        let state = Arc::clone(&self.state);
        let limit = self.limit;
        let timeout = self.timeout;

        let mut in_flight = self.lock_in_flight();
        while in_flight.try_join_next().is_some() {}

        in_flight.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, index.search(&query, limit)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SearchError::Timeout(timeout)),
            };

            match outcome {
                Ok(hits) => {
                    let count = hits.len();
                    if state.resolve(generation, hits, limit) {
                        debug!(generation, query = %query, count, "results updated");
                    } else {
                        debug!(generation, query = %query, "discarding stale results");
                    }
                }
                Err(err) => {
                    if state.fail(generation, err.to_string()) {
                        warn!(generation, query = %query, error = %err, "search unavailable");
                    } else {
                        debug!(generation, query = %query, error = %err, "discarding stale failure");
                    }
                }
            }
        });
    }

    /// Waits until no lookup is running, including ones dispatched meanwhile.
    ///
    /// The set stays behind the lock while draining, so `cancel_all` can
    /// still abort what is being waited on.
    pub async fn flush(&self) {
        poll_fn(|cx| {
            let mut in_flight = self.lock_in_flight();
            loop {
                match in_flight.poll_join_next(cx) {
                    Poll::Ready(Some(_)) => continue,
                    Poll::Ready(None) => return Poll::Ready(()),
                    Poll::Pending => return Poll::Pending,
                }
            }
        })
        .await
    }

    /// Aborts every lookup still running.
    pub fn cancel_all(&self) {
        self.lock_in_flight().abort_all();
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, JoinSet<()>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
