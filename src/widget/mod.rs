pub mod dispatcher;
pub mod listener;
pub mod registry;
pub mod state;

pub use dispatcher::QueryDispatcher;
pub use listener::InputListener;
pub use registry::WidgetRegistry;
pub use state::{ResultState, SearchState, SearchStatus};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::SearchConfig;
use crate::models::{InputEvent, ResultItem};
use crate::services::SearchIndex;

#[derive(Debug, Clone, Copy)]
pub struct WidgetOptions {
    pub limit: usize,
    pub timeout: Duration,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            timeout: Duration::from_secs(5),
        }
    }
}

impl From<&SearchConfig> for WidgetOptions {
    fn from(settings: &SearchConfig) -> Self {
        Self {
            limit: settings.limit,
            timeout: settings.timeout(),
        }
    }
}

/// One mounted instant-search widget.
///
/// The search index is injected by the host and may be shared between
/// widgets. Dropping the widget aborts its pending lookups.
pub struct SearchWidget {
    state: Arc<ResultState>,
    dispatcher: Arc<QueryDispatcher>,
    listener: InputListener,
}

impl SearchWidget {
    pub fn new(index: Arc<dyn SearchIndex>, options: WidgetOptions) -> Self {
        let state = Arc::new(ResultState::new());
        let dispatcher = Arc::new(QueryDispatcher::new(
            index,
            Arc::clone(&state),
            options.limit,
            options.timeout,
        ));
        let listener = InputListener::new(Arc::clone(&dispatcher));
        Self {
            state,
            dispatcher,
            listener,
        }
    }

    /// Input handler the page wires to the search field.
    pub fn fetch_results(&self, event: &InputEvent) {
        self.listener.fetch_results(event);
    }

    pub fn dispatch(&self, query: impl Into<String>) {
        self.dispatcher.dispatch(query.into());
    }

    pub fn query(&self) -> String {
        self.state.query()
    }

    pub fn results(&self) -> Vec<ResultItem> {
        self.state.results()
    }

    pub fn status(&self) -> SearchStatus {
        self.state.status()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Waits until every lookup issued so far has settled.
    pub async fn flush(&self) {
        self.dispatcher.flush().await;
    }

    pub fn unmount(&self) {
        self.dispatcher.cancel_all();
    }
}
