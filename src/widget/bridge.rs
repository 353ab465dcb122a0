use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::warn;

// Fixed storage namespace and key; the whole value is overwritten on every
// update.
const STORE_DIR: &str = "DATA";
const STORE_KEY: &str = "appData";

/// One-way bridge from application code to the widget host. `set` has no
/// return value and no error channel: a failed write is logged and the
/// widget simply keeps showing its previous state.
#[derive(Debug)]
pub struct WidgetBridge {
    path: PathBuf,
    redraw_tx: watch::Sender<u64>,
    generation: AtomicU64,
}

impl WidgetBridge {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let (redraw_tx, _) = watch::channel(0);
        WidgetBridge {
            path: data_dir.as_ref().join(STORE_DIR).join(STORE_KEY),
            redraw_tx,
            generation: AtomicU64::new(0),
        }
    }

    /// Persist the payload under the fixed key and ask the widget host to
    /// redraw.
    pub fn set(&self, message: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(?err, "widget storage unavailable");
                return;
            }
        }
        if let Err(err) = std::fs::write(&self.path, message) {
            warn!(?err, path = %self.path.display(), "failed to persist widget state");
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self.redraw_tx.send(generation);
    }

    /// Raw stored value; the empty JSON object when nothing was stored yet
    /// or the read fails.
    pub fn get(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_else(|_| "{}".to_string())
    }

    /// Redraw notifications for a widget host. Fires after every `set`.
    pub fn redraw_signal(&self) -> watch::Receiver<u64> {
        self.redraw_tx.subscribe()
    }
}
