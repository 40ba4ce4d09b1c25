use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grid_model::{ViewConfig, ViewId};

use crate::client::GridClient;
use crate::debounce::Debouncer;

/// Debounced, idempotent persistence of per-view filter/sort/hidden-field
/// configuration.
///
/// Local edits apply to UI state immediately; persistence is decoupled from
/// the render loop behind a short debounce window that merges rapid
/// successive edits into one write. Writes are deduplicated by comparing the
/// serialized form of the configuration against the last successfully sent
/// snapshot, so reopening an editor and saving an unchanged configuration
/// issues no network write.
pub struct ViewConfigSync {
    last_sent: Arc<Mutex<HashMap<ViewId, String>>>,
    debouncer: Debouncer<(ViewId, ViewConfig)>,
}

impl ViewConfigSync {
    pub fn new<C: GridClient + Clone>(client: C, delay: Duration) -> Self {
        let last_sent: Arc<Mutex<HashMap<ViewId, String>>> = Arc::new(Mutex::new(HashMap::new()));
        let sink_last = last_sent.clone();
        let debouncer = Debouncer::spawn(delay, move |(view, config): (ViewId, ViewConfig)| {
            let client = client.clone();
            let last_sent = sink_last.clone();
            async move {
                // On failure the last-sent snapshot is left untouched, so the
                // next submission for this view schedules a retry write.
                if client.update_view_config(view, &config).await.is_ok() {
                    if let Ok(snapshot) = serde_json::to_string(&config) {
                        last_sent
                            .lock()
                            .expect("view sync mutex poisoned")
                            .insert(view, snapshot);
                    }
                }
            }
        });
        Self {
            last_sent,
            debouncer,
        }
    }

    /// Record a configuration as already persisted (initial load), so the
    /// first submission of an identical config schedules nothing.
    pub fn mark_sent(&self, view: ViewId, config: &ViewConfig) {
        if let Ok(snapshot) = serde_json::to_string(config) {
            self.last_sent
                .lock()
                .expect("view sync mutex poisoned")
                .insert(view, snapshot);
        }
    }

    /// Stop tracking a deleted view.
    pub fn forget(&self, view: ViewId) {
        self.last_sent
            .lock()
            .expect("view sync mutex poisoned")
            .remove(&view);
    }

    /// Queue a configuration for persistence. Returns `false` when the config
    /// matches the last-sent snapshot and no write was scheduled.
    pub fn submit(&self, view: ViewId, config: ViewConfig) -> bool {
        let Ok(snapshot) = serde_json::to_string(&config) else {
            return false;
        };
        {
            let last_sent = self.last_sent.lock().expect("view sync mutex poisoned");
            if last_sent.get(&view) == Some(&snapshot) {
                return false;
            }
        }
        self.debouncer.submit((view, config));
        true
    }

    /// Persist any pending configuration immediately.
    pub async fn flush(&self) {
        self.debouncer.flush().await;
    }

    pub async fn shutdown(self) {
        self.debouncer.shutdown().await;
    }
}
