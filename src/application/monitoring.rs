use crate::domain::client_entry::ClientEntry;
use crate::domain::ports::InventorySource;
use crate::domain::snapshot::BackendRef;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{field, info, instrument, Span};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Operation name: "fetch_clients" or "analyze".
    pub operation: &'static str,
    /// Backend id, or "*" for whole-snapshot operations.
    pub target: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Number of client entries involved (fetched or analysed).
    pub entries: usize,
    pub ok: bool,
}

/// Accumulated performance timings for a single scan.
///
/// Shared across all decorator instances for one run via `Arc<Mutex<_>>`.
/// After the run, pass to [`crate::presentation::cli_summary::print_perf_summary`]
/// to render a human-readable table.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_entries_fetched: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    pub(crate) fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            if timing.operation == "fetch_clients" {
                r.total_entries_fetched += timing.entries;
            }
            r.timings.push(timing);
        }
    }

    /// Copy out the accumulated timings.
    pub fn snapshot(report: &Arc<Mutex<Self>>) -> Self {
        report.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

// ─── MonitoringInventorySource ───────────────────────────────────────────────

/// Decorator: wraps any `InventorySource`, measures wall time per
/// `fetch_clients` call, and appends the result to the shared `PerfReport`.
///
/// Failed fetches are recorded too (with zero entries) before the error is
/// passed through unchanged.
pub struct MonitoringInventorySource {
    inner: Arc<dyn InventorySource>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringInventorySource {
    pub fn new(inner: Arc<dyn InventorySource>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

#[async_trait]
impl InventorySource for MonitoringInventorySource {
    fn backend(&self) -> &BackendRef {
        self.inner.backend()
    }

    #[instrument(
        name = "fetch_clients",
        skip_all,
        fields(backend.id = field::Empty, backend.kind = field::Empty),
        level = "info"
    )]
    async fn fetch_clients(&self) -> Result<Vec<ClientEntry>> {
        let span = Span::current();
        span.record("backend.id", self.inner.backend().id.as_str());
        span.record("backend.kind", self.inner.backend().kind.as_str());

        let start = Instant::now();
        let result = self.inner.fetch_clients().await;
        let duration_ms = start.elapsed().as_millis();

        let entries = result.as_ref().map(Vec::len).unwrap_or(0);
        let backend_id = self.inner.backend().id.clone();
        if result.is_ok() {
            info!(backend = %backend_id, entries, duration_ms, "fetch_clients completed");
        }

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "fetch_clients",
                target: backend_id,
                duration_ms,
                entries,
                ok: result.is_ok(),
            },
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::StaticInventorySource;

    #[tokio::test]
    async fn records_fetch_timing_and_entry_count() {
        let backend = BackendRef {
            id: "fra-1".into(),
            name: "Frankfurt".into(),
            kind: "static".into(),
        };
        let inner = Arc::new(StaticInventorySource::new(
            backend,
            vec![ClientEntry::default(), ClientEntry::default()],
        ));
        let report = PerfReport::new();
        let source = MonitoringInventorySource::new(inner, Arc::clone(&report));

        let entries = source.fetch_clients().await.unwrap();
        assert_eq!(entries.len(), 2);

        let perf = PerfReport::snapshot(&report);
        assert_eq!(perf.timings.len(), 1);
        assert_eq!(perf.timings[0].operation, "fetch_clients");
        assert_eq!(perf.timings[0].target, "fra-1");
        assert!(perf.timings[0].ok);
        assert_eq!(perf.total_entries_fetched, 2);
    }

    #[test]
    fn analyze_timings_do_not_count_as_fetched() {
        let report = PerfReport::new();
        PerfReport::record(
            &report,
            OpTiming {
                operation: "analyze",
                target: "*".into(),
                duration_ms: 3,
                entries: 10,
                ok: true,
            },
        );
        let perf = PerfReport::snapshot(&report);
        assert_eq!(perf.total_entries_fetched, 0);
        assert_eq!(perf.total_ms, 3);
    }
}
