use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::services::SearchIndex;

use super::{SearchWidget, WidgetOptions};

struct Mounted {
    widget: Arc<SearchWidget>,
    last_seen: Instant,
}

/// Widgets mounted by the host, all sharing one search client.
///
/// A widget nobody has touched for a while counts as unmounted: clients
/// that close the page never send the `DELETE`.
#[derive(Clone)]
pub struct WidgetRegistry {
    index: Arc<dyn SearchIndex>,
    options: WidgetOptions,
    widgets: Arc<RwLock<HashMap<Uuid, Mounted>>>,
}

impl WidgetRegistry {
    pub fn new(index: Arc<dyn SearchIndex>, options: WidgetOptions) -> Self {
        Self {
            index,
            options,
            widgets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn mount(&self) -> (Uuid, Arc<SearchWidget>) {
        let id = Uuid::new_v4();
        let widget = Arc::new(SearchWidget::new(Arc::clone(&self.index), self.options));
        self.widgets.write().await.insert(
            id,
            Mounted {
                widget: Arc::clone(&widget),
                last_seen: Instant::now(),
            },
        );
        info!(widget = %id, "widget mounted");
        (id, widget)
    }

    /// Looks up a widget and marks it as seen.
    pub async fn get(&self, id: &Uuid) -> Option<Arc<SearchWidget>> {
        let mut widgets = self.widgets.write().await;
        let mounted = widgets.get_mut(id)?;
        mounted.last_seen = Instant::now();
        Some(Arc::clone(&mounted.widget))
    }

    /// Removes the widget and aborts its lookups. Returns `false` if it was not mounted.
    pub async fn unmount(&self, id: &Uuid) -> bool {
        let removed = self.widgets.write().await.remove(id);
        match removed {
            Some(mounted) => {
                mounted.widget.unmount();
                info!(widget = %id, "widget unmounted");
                true
            }
            None => false,
        }
    }

    /// Unmounts every widget not seen within `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut widgets = self.widgets.write().await;
        let before = widgets.len();
        widgets.retain(|id, mounted| {
            let keep = now.duration_since(mounted.last_seen) <= max_idle;
            if !keep {
                mounted.widget.unmount();
                info!(widget = %id, "idle widget evicted");
            }
            keep
        });
        before - widgets.len()
    }

    /// Runs [`evict_idle`](Self::evict_idle) every `every` on the current runtime.
    pub fn spawn_sweeper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(max_idle).await;
                if evicted > 0 {
                    debug!(evicted, "idle sweep finished");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.widgets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.widgets.read().await.is_empty()
    }
}
