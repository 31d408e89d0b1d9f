use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Verbosity of the `clientdiff` tracing target.
///
/// | Variant | Shows                                                  |
/// |---------|--------------------------------------------------------|
/// | `Error` | failures only (`--quiet`)                              |
/// | `Info`  | fetch timings, skipped backends and skipped inbounds   |
/// | `Debug` | plus unidentifiable entries and queries (`-v`)         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Install a stderr `tracing` subscriber. `RUST_LOG` overrides `level`.
///
/// Call once, before the first scan. Embedders with their own subscriber
/// should not call it. Requires the `cli` feature.
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "clientdiff=error",
        LogLevel::Info => "clientdiff=info",
        LogLevel::Debug => "clientdiff=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::monitoring::PerfReport;
pub use application::plan::{build_plan, build_recommended_plan, plan_for};
pub use application::report::build_report;
pub use application::scoring::{rank, score, SourceScore};
pub use domain::client_entry::ClientEntry;
pub use domain::conflict::{
    ConflictGroup, ConflictReport, ConflictType, FieldDiff, GroupMember, ProtocolConflictGroup,
    ReportSummary, Severity, SourceCandidate,
};
pub use domain::fingerprint::snapshot_fingerprint;
pub use domain::identity::{identifier, locate};
pub use domain::plan::{
    PlanAction, PlanClient, PlanError, PlanOutcome, PlanTarget, ReconciliationPlan, SourceChoice,
};
pub use domain::ports::{InventorySource, ReportWriter};
pub use domain::snapshot::{BackendRef, FetchFailure, InventorySnapshot, StaticInventorySource};
pub use domain::value_objects::{
    CredentialFamily, Field, FieldValue, Fingerprint, IdentityType, Locator,
};
pub use infrastructure::config::{AppConfig, BackendConfig, BackendKind, OutputConfig};

use crate::application::inventory::InventoryService;
use crate::application::monitoring::{MonitoringInventorySource, OpTiming};
use crate::infrastructure::inventory::source_for;

/// Result of one scan: the snapshot it was computed from, and the report.
///
/// Keep them together: a plan must only ever be built from the report of the
/// snapshot it describes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub snapshot: InventorySnapshot,
    pub report: ConflictReport,
}

// ─── Public entry points ───

/// Analyse entries already in memory. Pure; see [`build_report`].
pub fn analyze(entries: &[ClientEntry]) -> ConflictReport {
    build_report(entries)
}

/// Fetch every configured backend concurrently, tolerating per-backend
/// failures (see [`InventorySnapshot::failures`]).
pub async fn collect_inventory(cfg: &AppConfig) -> Result<InventorySnapshot> {
    collect_with_timing(cfg, PerfReport::new()).await
}

/// Fetch all backends and build the conflict report.
///
/// Use [`run_with_timing`] if you also want a performance report.
pub async fn run(cfg: &AppConfig) -> Result<Scan> {
    let (scan, _) = run_with_timing(cfg).await?;
    Ok(scan)
}

/// Fetch all backends and build the conflict report, with per-backend fetch
/// timings and the analysis time.
pub async fn run_with_timing(cfg: &AppConfig) -> Result<(Scan, PerfReport)> {
    let report = PerfReport::new();
    let snapshot = collect_with_timing(cfg, Arc::clone(&report)).await?;

    let start = Instant::now();
    let conflict_report = build_report(&snapshot.entries);
    PerfReport::record(
        &report,
        OpTiming {
            operation: "analyze",
            target: "*".to_string(),
            duration_ms: start.elapsed().as_millis(),
            entries: snapshot.entries.len(),
            ok: true,
        },
    );

    let perf = PerfReport::snapshot(&report);
    Ok((
        Scan {
            snapshot,
            report: conflict_report,
        },
        perf,
    ))
}

// ─── Private helpers ───────────────────────────────────────────────────────────

/// Build one monitored source per backend and collect them.
///
/// The shared `report` accumulates timings from every source of the run.
async fn collect_with_timing(
    cfg: &AppConfig,
    report: Arc<std::sync::Mutex<PerfReport>>,
) -> Result<InventorySnapshot> {
    if cfg.backends.is_empty() {
        bail!("no backends configured");
    }

    let sources: Vec<Arc<dyn InventorySource>> = cfg
        .backends
        .iter()
        .map(|b| {
            Arc::new(MonitoringInventorySource::new(
                source_for(b),
                Arc::clone(&report),
            )) as Arc<dyn InventorySource>
        })
        .collect();

    Ok(InventoryService::new(sources).collect().await)
}
