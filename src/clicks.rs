use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::db::LinksDB;

/// Best-effort click accounting.
///
/// Every recorded click runs as its own detached task so a redirect never
/// waits on, or fails because of, the counter update. Dropping the request
/// that triggered it does not cancel the task.
#[derive(Clone)]
pub struct ClickRecorder {
    db: Arc<dyn LinksDB>,
}

impl ClickRecorder {
    pub fn new(db: Arc<dyn LinksDB>) -> Self {
        Self { db }
    }

    /// Schedules a click increment for `short_code`. The returned handle is
    /// only useful to tests; callers normally drop it.
    pub fn record(&self, short_code: &str) -> JoinHandle<()> {
        let db = Arc::clone(&self.db);
        let short_code = short_code.to_string();

        tokio::spawn(async move {
            if let Err(e) = db.increment_clicks(&short_code).await {
                tracing::warn!(short_code, "failed to count click: {e}");
            }
        })
    }
}
