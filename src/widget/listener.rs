use std::sync::Arc;

use tracing::trace;

use crate::models::InputEvent;

use super::dispatcher::QueryDispatcher;

/// Forwards every change of the search field to the dispatcher.
///
/// No debouncing and no validation: each keystroke is one dispatch.
pub struct InputListener {
    dispatcher: Arc<QueryDispatcher>,
}

impl InputListener {
    pub fn new(dispatcher: Arc<QueryDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn fetch_results(&self, event: &InputEvent) {
        trace!(len = event.value.len(), "input event");
        self.dispatcher.dispatch(event.value.clone());
    }
}
