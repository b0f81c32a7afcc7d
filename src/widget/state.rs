use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::models::ResultItem;

/// Lifecycle of a widget's query.
///
/// `Pending`, `Ready` and `Unavailable` all mean a non-empty query is
/// active; only `Idle` corresponds to an empty field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchStatus {
    Idle,
    Pending,
    Ready,
    Unavailable { reason: String },
}

impl SearchStatus {
    pub fn is_querying(&self) -> bool {
        !matches!(self, SearchStatus::Idle)
    }
}

/// Everything the rendering layer binds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<ResultItem>,
    pub status: SearchStatus,
    /// Bumped on every published change.
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    generation: u64,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            status: SearchStatus::Idle,
            revision: 0,
            updated_at: Utc::now(),
            generation: 0,
        }
    }
}

impl SearchState {
    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.updated_at = Utc::now();
    }
}

/// Reactive store holding a widget's [`SearchState`].
///
/// Each input starts a new generation. Lookup outcomes carry the generation
/// they were issued under and are dropped unless it is still current; the
/// check and the write happen under the channel's lock, so an outcome can
/// never land on top of a newer input.
pub struct ResultState {
    tx: watch::Sender<SearchState>,
}

impl Default for ResultState {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> SearchState {
        self.tx.borrow().clone()
    }

    pub fn query(&self) -> String {
        self.tx.borrow().query.clone()
    }

    pub fn results(&self) -> Vec<ResultItem> {
        self.tx.borrow().results.clone()
    }

    pub fn status(&self) -> SearchStatus {
        self.tx.borrow().status.clone()
    }

    /// Receiver that wakes up on every change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.tx.subscribe()
    }

    /// Records new input and returns the generation it opened.
    ///
    /// An empty query clears the results before returning.
    pub(crate) fn begin(&self, query: &str) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            state.generation = state.generation.wrapping_add(1);
            generation = state.generation;
            state.query = query.to_string();
            if query.is_empty() {
                state.results.clear();
                state.status = SearchStatus::Idle;
            } else {
                state.status = SearchStatus::Pending;
            }
            state.touch();
        });
        generation
    }

    /// Replaces the results with `hits`. Returns `false` if `generation` is stale.
    pub(crate) fn resolve(&self, generation: u64, mut hits: Vec<ResultItem>, limit: usize) -> bool {
        hits.truncate(limit);
        self.tx.send_if_modified(|state| {
            if state.generation != generation || state.query.is_empty() {
                return false;
            }
            state.results = hits;
            state.status = SearchStatus::Ready;
            state.touch();
            true
        })
    }

    /// Flags the search as unavailable, keeping the previous results.
    /// Returns `false` if `generation` is stale.
    pub(crate) fn fail(&self, generation: u64, reason: String) -> bool {
        self.tx.send_if_modified(|state| {
            if state.generation != generation || state.query.is_empty() {
                return false;
            }
            state.status = SearchStatus::Unavailable { reason };
            state.touch();
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hits(n: usize) -> Vec<ResultItem> {
        (0..n).map(|i| ResultItem::new(json!({ "id": i }))).collect()
    }

    #[test]
    fn starts_idle_and_empty() {
        let state = ResultState::new().snapshot();
        assert_eq!(state.query, "");
        assert!(state.results.is_empty());
        assert_eq!(state.status, SearchStatus::Idle);
    }

    #[test]
    fn empty_input_clears_results_immediately() {
        let store = ResultState::new();
        let generation = store.begin("rust");
        assert!(store.resolve(generation, hits(3), 5));

        store.begin("");

        let state = store.snapshot();
        assert!(state.results.is_empty());
        assert_eq!(state.status, SearchStatus::Idle);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let store = ResultState::new();
        let first = store.begin("a");
        let second = store.begin("ab");

        assert!(store.resolve(second, hits(1), 5));
        assert!(!store.resolve(first, hits(4), 5));
        assert!(!store.fail(first, "boom".into()));

        let state = store.snapshot();
        assert_eq!(state.query, "ab");
        assert_eq!(state.results, hits(1));
        assert_eq!(state.status, SearchStatus::Ready);
    }

    #[test]
    fn results_are_capped_at_the_limit() {
        let store = ResultState::new();
        let generation = store.begin("many");
        store.resolve(generation, hits(9), 5);
        assert_eq!(store.results(), hits(5));
    }

    #[test]
    fn failure_keeps_previous_results() {
        let store = ResultState::new();
        let generation = store.begin("rust");
        store.resolve(generation, hits(2), 5);

        let generation = store.begin("rusty");
        assert!(store.fail(generation, "connection refused".into()));

        let state = store.snapshot();
        assert_eq!(state.results, hits(2));
        assert_eq!(
            state.status,
            SearchStatus::Unavailable {
                reason: "connection refused".into()
            }
        );
        assert!(state.status.is_querying());
    }

    #[test]
    fn every_change_bumps_the_revision() {
        let store = ResultState::new();
        let rx = store.subscribe();
        let before = rx.borrow().revision;

        let generation = store.begin("x");
        store.resolve(generation, hits(1), 5);

        assert_eq!(store.snapshot().revision, before + 2);
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn serializes_status_as_tagged_object() {
        let store = ResultState::new();
        let generation = store.begin("x");
        store.fail(generation, "down".into());

        let value = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(value["status"], json!({ "state": "unavailable", "reason": "down" }));
        assert!(value.get("generation").is_none());
    }
}
