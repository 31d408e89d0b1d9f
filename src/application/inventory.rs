use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::InventorySource;
use crate::domain::snapshot::{FetchFailure, InventorySnapshot};

// ─────────────────────────────────────────────────────────────────────────────
// InventoryService
// ─────────────────────────────────────────────────────────────────────────────

/// Collects client entries from every configured backend, concurrently.
///
/// # Partial failure
/// One task is spawned per backend. A backend that errors (or whose task
/// panics) contributes zero entries and a [`FetchFailure`]; the others are
/// unaffected. `collect` itself never fails.
///
/// # Ordering
/// Entries are appended in source order regardless of which backend answers
/// first, so ranking tie-breaks are reproducible for the same data.
pub struct InventoryService {
    sources: Vec<Arc<dyn InventorySource>>,
}

impl InventoryService {
    pub fn new(sources: Vec<Arc<dyn InventorySource>>) -> Self {
        Self { sources }
    }

    pub async fn collect(&self) -> InventorySnapshot {
        let mut handles = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let source = Arc::clone(source);
            let backend = source.backend().clone();
            let handle = tokio::spawn(async move { source.fetch_clients().await });
            handles.push((backend, handle));
        }

        let mut snapshot = InventorySnapshot::default();
        for (backend, handle) in handles {
            let message = match handle.await {
                Ok(Ok(entries)) => {
                    // Stamp origin so a source can never misattribute a copy.
                    snapshot.entries.extend(entries.into_iter().map(|mut e| {
                        e.server_id = backend.id.clone();
                        e.server_name = backend.name.clone();
                        e
                    }));
                    continue;
                }
                Ok(Err(err)) => format!("{err:#}"),
                Err(join_err) => format!("fetch task aborted: {join_err}"),
            };

            warn!(backend.id = %backend.id, error = %message, "backend skipped for this run");
            snapshot.failures.push(FetchFailure {
                server_id: backend.id,
                server_name: backend.name,
                message,
            });
        }

        info!(
            entries = snapshot.entries.len(),
            backends = self.sources.len(),
            failed = snapshot.failures.len(),
            "inventory collected"
        );

        snapshot
    }
}
