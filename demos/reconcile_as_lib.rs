//! # clientdiff — library usage example
//!
//! Three common patterns for consuming clientdiff as a Rust library:
//!
//! 1. **From a config file** — mirrors the CLI
//! 2. **In-memory entries** — no backends at all, just analyse and plan
//! 3. **Custom source** — plug your own `InventorySource` into the collector
//!
//! Run with a config file:
//!   cargo run --example reconcile_as_lib -- clientdiff.toml
//!
//! Run with built-in sample data:
//!   cargo run --example reconcile_as_lib

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clientdiff::{
    application::inventory::InventoryService,
    presentation::writers::{all_writers, write_to_file},
    AppConfig, BackendRef, ClientEntry, ConflictReport, InventorySource, PlanOutcome,
    StaticInventorySource,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some(path) => from_config_file(path).await,
        None => {
            in_memory()?;
            custom_source().await
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 1 — load config from a TOML file (same as the CLI does internally)
// ─────────────────────────────────────────────────────────────────────────────
async fn from_config_file(path: &str) -> Result<()> {
    println!("=== Pattern 1: from config file ({path}) ===\n");

    let cfg = AppConfig::load(path)?;
    let scan = clientdiff::run(&cfg).await?;

    for failure in &scan.snapshot.failures {
        println!("skipped {}: {}", failure.server_id, failure.message);
    }

    let run_id = scan.report.snapshot_fingerprint.as_str();
    for writer in all_writers() {
        let written = write_to_file(&*writer, &scan.report, Path::new(&cfg.output.dir), run_id)?;
        println!("Written: {}", written.display());
    }

    print_summary(&scan.report);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 2 — entries you already hold; analysis and planning are pure.
// ─────────────────────────────────────────────────────────────────────────────
fn in_memory() -> Result<()> {
    println!("=== Pattern 2: in-memory entries ===\n");

    let report = clientdiff::analyze(&sample_entries());
    print_summary(&report);

    // Plan with the recommended source...
    let outcome = clientdiff::plan_for(&report, "alice@example.com", "vless", None)?;
    describe(&outcome);

    // ...or pick one explicitly; an unknown locator is an error, never a fallback.
    let group = report
        .find_group("alice@example.com")
        .and_then(|g| g.protocol_group("vless"));
    if let Some(sub) = group {
        if let Some(last) = sub.ranked_sources.last() {
            let outcome = clientdiff::plan_for(
                &report,
                "alice@example.com",
                "vless",
                Some(&last.locator),
            )?;
            describe(&outcome);
        }
    }

    let err = clientdiff::plan_for(&report, "alice@example.com", "vless", Some(&"nope".into()))
        .unwrap_err();
    println!("  rejected: {err}\n");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 3 — any type implementing InventorySource can feed the collector.
// ─────────────────────────────────────────────────────────────────────────────
async fn custom_source() -> Result<()> {
    println!("=== Pattern 3: custom inventory source ===\n");

    let (fra, ams): (Vec<_>, Vec<_>) = sample_entries()
        .into_iter()
        .partition(|e| e.server_id == "fra-1");

    let sources: Vec<Arc<dyn InventorySource>> = vec![
        Arc::new(StaticInventorySource::new(backend("fra-1"), fra)),
        Arc::new(StaticInventorySource::new(backend("ams-1"), ams)),
    ];
    let snapshot = InventoryService::new(sources).collect().await;
    let report = clientdiff::analyze(&snapshot.entries);

    println!("  fingerprint: {}", report.snapshot_fingerprint);
    print_summary(&report);
    Ok(())
}

// ─── helpers ─────────────────────────────────────────────────────────────────

fn backend(id: &str) -> BackendRef {
    BackendRef {
        id: id.into(),
        name: id.to_uppercase(),
        kind: "static".into(),
    }
}

fn sample_entries() -> Vec<ClientEntry> {
    let copy = |server: &str, inbound: i64, expiry: f64, enable: bool| ClientEntry {
        server_id: server.into(),
        server_name: server.to_uppercase(),
        inbound_id: inbound,
        inbound_remark: "main".into(),
        protocol: "vless".into(),
        email: Some("alice@example.com".into()),
        id: "6f1c2a3e-0000-4000-8000-000000000001".into(),
        expiry_time: expiry,
        enable: Some(enable),
        ..Default::default()
    };
    vec![
        copy("fra-1", 1, 1_700_000_000_000.0, true),
        copy("fra-1", 2, 1_800_000_000_000.0, true),
        copy("ams-1", 1, 1_900_000_000_000.0, false),
    ]
}

fn describe(outcome: &PlanOutcome) {
    match outcome {
        PlanOutcome::Ready(plan) => println!(
            "  plan ({:?}): {} -> {} target(s)",
            plan.source_choice,
            plan.source_locator,
            plan.targets.len()
        ),
        PlanOutcome::AlreadyConverged => println!("  already converged"),
        PlanOutcome::MissingCredential { source } => {
            println!("  source {source} has no credential")
        }
    }
}

fn print_summary(report: &ConflictReport) {
    let s = &report.summary;
    println!(
        "  {} entries, {} groups, {} conflicting ({} high / {} medium)",
        s.total_entries, s.total_groups, s.conflict_groups, s.high, s.medium
    );
    for group in &report.groups {
        for sub in &group.protocols {
            let types: Vec<&str> = sub.conflict_types.iter().map(|t| t.as_str()).collect();
            println!(
                "  [{}] {} / {}: {} -> recommended {}",
                group.severity.as_str(),
                group.identity_value,
                sub.protocol,
                types.join(", "),
                sub.recommended_source
            );
        }
    }
    println!();
}
